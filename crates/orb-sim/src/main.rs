//! # Orb Sim
//!
//! Headless harness for the Orb combat engine.
//!
//! Loads a TOML config and a content catalog, runs a scripted skirmish at a
//! fixed frame step and prints a JSON summary to stdout.
//!
//! ```text
//! orb-sim [CONFIG]                    run with CONFIG (default: orb-sim.toml)
//! orb-sim --write-config [PATH]       write the default config and exit
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod scenario;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use orb_combat::{builtin_catalog, Catalog};
use orb_common::OrbResult;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, CONFIG_FILE};
use crate::scenario::{Skirmish, SkirmishLog};

/// Main entry point.
fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let first = args.next();

    if first.as_deref() == Some("--write-config") {
        let path = args.next().map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
        init_tracing(&SimConfig::default())?;
        SimConfig::default().save_to(&path)?;
        return Ok(());
    }

    let path = first.map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    // Read before tracing is up so the file can choose the log filter.
    let loaded = SimConfig::read(&path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        Ok(None) | Err(_) => SimConfig::default(),
    };
    init_tracing(&config)?;

    info!("Orb Sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(Some(_)) => info!("Loaded config from {}", path.display()),
        Ok(None) => info!("Config file not found, using defaults"),
        Err(e) => warn!("Failed to load {}: {e}; using defaults", path.display()),
    }

    let catalog = Arc::new(load_catalog(&config)?);
    let mut skirmish = Skirmish::new(catalog, config.engine.clone())
        .context("failed to equip the skirmish roster")?;
    let log = SkirmishLog::new(skirmish.roster());

    let summary = skirmish.run(config.frame_delta(), config.frame_budget(), &log);
    match summary.winner {
        Some(team) => info!("{:?} win after {:.1}s", team, summary.elapsed),
        None => info!("Draw after {:.1}s", summary.elapsed),
    }
    if summary.faults > 0 {
        warn!("{} entity faults during the run", summary.faults);
    }
    let dropped = skirmish.engine().events().dropped_count();
    if dropped > 0 {
        warn!("{dropped} combat events dropped; raise engine.event_capacity");
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!("Orb Sim shutdown complete");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured filter.
fn init_tracing(config: &SimConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)?,
    };
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
    Ok(())
}

/// The configured RON catalog, or the built-in content.
fn load_catalog(config: &SimConfig) -> OrbResult<Catalog> {
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => builtin_catalog()?,
    };
    info!(
        "Catalog: {} effects, {} abilities, {} loadouts",
        catalog.effect_count(),
        catalog.ability_count(),
        catalog.loadout_count()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_builtin_catalog() {
        let catalog = load_catalog(&SimConfig::default()).expect("Built-in catalog should load");
        assert!(catalog.effect_count() > 0);
    }

    #[test]
    fn test_load_catalog_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("catalog.ron");
        let source = builtin_catalog()
            .expect("Built-in catalog should build")
            .to_ron()
            .expect("Catalog should serialize");
        std::fs::write(&path, source).expect("Failed to write catalog");

        let config = SimConfig {
            catalog_path: Some(path),
            ..SimConfig::default()
        };
        let catalog = load_catalog(&config).expect("Catalog file should load");
        assert_eq!(
            catalog.loadout_count(),
            builtin_catalog().expect("Built-in catalog should build").loadout_count()
        );
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let config = SimConfig {
            catalog_path: Some(PathBuf::from("/nonexistent/catalog.ron")),
            ..SimConfig::default()
        };
        assert!(matches!(
            load_catalog(&config),
            Err(orb_common::OrbError::Io(_))
        ));
    }
}
