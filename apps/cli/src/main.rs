#![deny(warnings)]

//! Headless host: loads the current save, applies the configured commands,
//! runs a number of days and saves again.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sim_core::{Options, ResourceKind, World};
use sim_runtime::{Codec, FileStorage, Simulation};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Settings from `--config <file.yaml>`; flags override them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
struct CliConfig {
    save_dir: PathBuf,
    codec: Codec,
    /// Days to simulate; rounded up to whole ticks.
    days: u64,
    work: Option<String>,
    housing: Option<String>,
    /// YAML content file replacing the built-in catalog.
    content: Option<PathBuf>,
    /// Preset to start from instead of the current save.
    preset: Option<String>,
    dev_presets: bool,
    auto: bool,
    /// Rebirth after the run when eligible.
    rebirth: bool,
    /// Delete the current save and start from factory defaults.
    fresh: bool,
    json: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("./saves"),
            codec: Codec::Json,
            days: 0,
            work: None,
            housing: None,
            content: None,
            preset: None,
            dev_presets: false,
            auto: false,
            rebirth: false,
            fresh: false,
            json: false,
        }
    }
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliConfig> {
    let args: Vec<String> = args.into_iter().collect();
    let mut cfg = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args.get(i + 1).context("--config needs a path")?;
            load_config(Path::new(path))?
        }
        None => CliConfig::default(),
    };
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                it.next();
            }
            "--days" => {
                cfg.days = it
                    .next()
                    .context("--days needs a value")?
                    .parse()
                    .context("--days must be a number")?
            }
            "--work" => cfg.work = Some(it.next().context("--work needs a name")?),
            "--housing" => cfg.housing = Some(it.next().context("--housing needs a name")?),
            "--save-dir" => cfg.save_dir = it.next().context("--save-dir needs a path")?.into(),
            "--codec" => cfg.codec = it.next().context("--codec needs a value")?.parse()?,
            "--content" => {
                cfg.content = Some(it.next().context("--content needs a path")?.into())
            }
            "--preset" => cfg.preset = Some(it.next().context("--preset needs a name")?),
            "--dev-presets" => cfg.dev_presets = true,
            "--auto" => cfg.auto = true,
            "--rebirth" => cfg.rebirth = true,
            "--fresh" => cfg.fresh = true,
            "--json" => cfg.json = true,
            other => bail!("unknown argument {other:?}"),
        }
    }
    Ok(cfg)
}

fn load_config(path: &Path) -> Result<CliConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn load_content(path: &Path) -> Result<World> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading content {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing content {}", path.display()))
}

/// Ticks needed so that at least `days` days pass.
fn ticks_for_days(days: u64, days_per_tick: u32) -> u64 {
    days.div_ceil(u64::from(days_per_tick.max(1)))
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let cfg = parse_args(std::env::args().skip(1))?;
    info!(?cfg, "starting CLI");

    let world = match &cfg.content {
        Some(path) => load_content(path)?,
        None => World::factory(),
    };
    let storage = FileStorage::new(cfg.save_dir.clone(), cfg.codec);
    let mut sim = Simulation::open(world, storage, cfg.codec)?;

    if cfg.fresh {
        sim.delete_save()?;
    } else {
        let outcome = sim.load();
        info!(?outcome, "current save");
    }
    if cfg.dev_presets {
        let added = sim.install_builtin_presets()?;
        info!(added, "development presets installed");
    }
    if let Some(name) = &cfg.preset {
        sim.load_preset(name)?;
    }
    if cfg.auto {
        sim.set_options(Options {
            auto_work: true,
            auto_housing: true,
            auto_buy_tiers: true,
            auto_buy_items: true,
            auto_rebirth: cfg.rebirth,
        });
    }
    if let Some(name) = &cfg.work {
        sim.set_work(name)?;
    }
    if let Some(name) = &cfg.housing {
        sim.set_housing(name)?;
    }

    let ticks = ticks_for_days(cfg.days, sim.world().constants.days_per_tick);
    sim.run_ticks(ticks);
    if cfg.rebirth && sim.input().can_rebirth {
        sim.do_rebirth()?;
    }
    sim.save()?;

    let state = sim.state();
    if cfg.json {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        println!(
            "Day {} | money: {:.1} | influence: {:.1} | tiers: {:?} | work: {} | housing: {} | rebirths: {} | presets: {}",
            state.elapsed_days,
            state.resource(ResourceKind::Money),
            state.resource(ResourceKind::Influence),
            state.owned_tier_levels,
            state.current_work.as_deref().unwrap_or("-"),
            state.current_housing.as_deref().unwrap_or("-"),
            state.rebirth_count,
            sim.preset_saves().len()
        );
    }
    Ok(())
}
