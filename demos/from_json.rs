//! # Tree From JSON
//!
//! Loads a tree configuration from a JSON file and opens the viewer with it.
//! Keys use camelCase and any missing key keeps its default:
//!
//! ```json
//! { "treeColor": "#ff3355", "spiralTurns": 7, "particleCount": 8000 }
//! ```
//!
//! Run with: `cargo run --example from_json -- tree.json [seed]`

use lumina_tree::{TreeConfig, Viewer};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let json = match std::fs::read_to_string(&path) {
                Ok(json) => json,
                Err(err) => {
                    log::error!("Cannot read {path}: {err}");
                    std::process::exit(1);
                }
            };
            match TreeConfig::from_json(&json) {
                Ok(config) => config,
                Err(err) => {
                    log::error!("{path}: {err}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            log::info!("No config file given, using defaults");
            TreeConfig::default()
        }
    };

    let mut viewer = Viewer::new().with_config(config);
    if let Some(seed) = args.next().and_then(|s| s.parse().ok()) {
        viewer = viewer.with_seed(seed);
    }

    if let Err(err) = viewer.run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}
