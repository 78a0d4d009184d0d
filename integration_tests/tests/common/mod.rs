#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Once;

use anyhow::Context;
use core_sim::{load_simulation_config_from_env, SimulationConfig, SimulationSession};
use sim_runtime::NegotiationReport;

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = fixture_path("test_simulation_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test simulation config at {}",
            config_path.display()
        );

        std::env::set_var("SIM_CONFIG_PATH", &config_path);
    });
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn test_config() -> SimulationConfig {
    ensure_test_config();
    let (config, metadata) = load_simulation_config_from_env();
    debug_assert!(metadata.path().is_some(), "test config fell back to builtin");
    config
}

pub fn test_session() -> SimulationSession {
    SimulationSession::init(test_config())
}

pub fn load_report(name: &str) -> anyhow::Result<NegotiationReport> {
    let path = fixture_path(name);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("reading report fixture {}", path.display()))?;
    NegotiationReport::from_json_str(&text)
        .with_context(|| format!("parsing report fixture {}", path.display()))
}

pub fn river_summit() -> anyhow::Result<NegotiationReport> {
    load_report("river_summit_report.json")
}
