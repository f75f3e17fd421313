#![deny(warnings)]

//! Persistence layer: versioned save envelopes, codecs and byte stores.
//!
//! A save is one [`SaveEnvelope`] in the [`CURRENT_SLOT`]; the player's
//! presets live together in one [`PresetEnvelope`] in the [`PRESETS_SLOT`].
//! Where the bytes end up is decided by a [`SaveStorage`] implementation.

mod storage;

pub use storage::{atomic_write, FileStorage, MemoryStorage, SaveStorage};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sim_core::{PresetStore, State};
use std::str::FromStr;
use thiserror::Error;

/// Version of the envelope layout written by this build.
pub const SAVE_FORMAT_VERSION: u32 = 1;
/// Slot holding the autosave.
pub const CURRENT_SLOT: &str = "current";
/// Slot holding every named preset.
pub const PRESETS_SLOT: &str = "presets";

/// Errors raised while encoding, decoding or storing saves.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(String),
    /// Corrupt or foreign bytes.
    #[error("decode error: {0}")]
    Decode(String),
    #[error("save format v{found} is not supported (expected v{expected})")]
    VersionMismatch { expected: u32, found: u32 },
    /// The save was written against a different content catalog.
    #[error("save targets content {found:?}, running {expected:?}")]
    WorldMismatch { expected: String, found: String },
    /// Slot names are restricted to `[A-Za-z0-9_-]`.
    #[error("invalid slot name: {0:?}")]
    InvalidSlot(String),
}

/// Byte encoding of envelopes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// Human-readable, the default.
    #[default]
    Json,
    /// Compact binary via bincode.
    Bincode,
}

impl Codec {
    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>, StorageError> {
        match self {
            Codec::Json => serde_json::to_vec(value).map_err(|e| StorageError::Encode(e.to_string())),
            Codec::Bincode => {
                bincode::serialize(value).map_err(|e| StorageError::Encode(e.to_string()))
            }
        }
    }

    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T, StorageError> {
        match self {
            Codec::Json => {
                serde_json::from_slice(bytes).map_err(|e| StorageError::Decode(e.to_string()))
            }
            Codec::Bincode => {
                bincode::deserialize(bytes).map_err(|e| StorageError::Decode(e.to_string()))
            }
        }
    }

    /// File extension used by [`FileStorage`].
    pub fn extension(self) -> &'static str {
        match self {
            Codec::Json => "json",
            Codec::Bincode => "bin",
        }
    }
}

impl FromStr for Codec {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Codec::Json),
            "bincode" | "bin" => Ok(Codec::Bincode),
            other => Err(StorageError::Decode(format!("unknown codec {other:?}"))),
        }
    }
}

/// The current-save blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub format_version: u32,
    pub world_version: String,
    pub state: State,
}

/// The presets blob.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresetEnvelope {
    pub format_version: u32,
    pub world_version: String,
    pub presets: PresetStore,
}

fn check_header(expected_world: &str, format_version: u32, world_version: &str) -> Result<(), StorageError> {
    if format_version != SAVE_FORMAT_VERSION {
        return Err(StorageError::VersionMismatch {
            expected: SAVE_FORMAT_VERSION,
            found: format_version,
        });
    }
    if world_version != expected_world {
        return Err(StorageError::WorldMismatch {
            expected: expected_world.to_string(),
            found: world_version.to_string(),
        });
    }
    Ok(())
}

pub fn encode_save(codec: Codec, world_version: &str, state: &State) -> Result<Vec<u8>, StorageError> {
    codec.encode(&SaveEnvelope {
        format_version: SAVE_FORMAT_VERSION,
        world_version: world_version.to_string(),
        state: state.clone(),
    })
}

/// Decode a current-save blob written for `world_version`.
pub fn decode_save(codec: Codec, world_version: &str, bytes: &[u8]) -> Result<State, StorageError> {
    let envelope: SaveEnvelope = codec.decode(bytes)?;
    check_header(world_version, envelope.format_version, &envelope.world_version)?;
    Ok(envelope.state)
}

pub fn encode_presets(
    codec: Codec,
    world_version: &str,
    presets: &PresetStore,
) -> Result<Vec<u8>, StorageError> {
    codec.encode(&PresetEnvelope {
        format_version: SAVE_FORMAT_VERSION,
        world_version: world_version.to_string(),
        presets: presets.clone(),
    })
}

/// Decode a presets blob written for `world_version`.
pub fn decode_presets(
    codec: Codec,
    world_version: &str,
    bytes: &[u8],
) -> Result<PresetStore, StorageError> {
    let envelope: PresetEnvelope = codec.decode(bytes)?;
    check_header(world_version, envelope.format_version, &envelope.world_version)?;
    Ok(envelope.presets)
}
