#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use command_core::{
    CommandSession, Marshal, ObjectionConfig, Personality, PersonalityCatalog, Roster,
    StaticBattlefield,
};
use rand::rngs::mock::StepRng;

static INIT: Once = Once::new();

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Points `OBJECTION_CONFIG_PATH` at the strict fixture for the whole test binary.
pub fn ensure_strict_config() {
    INIT.call_once(|| {
        let config_path = fixture_path("strict_objection_config.json");
        debug_assert!(
            config_path.exists(),
            "missing strict objection config at {}",
            config_path.display()
        );
        std::env::set_var("OBJECTION_CONFIG_PATH", &config_path);
    });
}

/// Paris - Reims - Metz - Strasbourg, enemy in Metz, Lyon hanging off Paris.
pub fn battlefield() -> StaticBattlefield {
    StaticBattlefield::new()
        .with_capital("Paris")
        .connect("Paris", "Reims")
        .connect("Reims", "Metz")
        .connect("Metz", "Strasbourg")
        .connect("Paris", "Lyon")
        .with_enemy("Metz")
        .with_ratio("Metz", 0.3)
        .with_fortified("Strasbourg")
        .with_garrison("Paris", "davout")
}

pub fn grande_armee(trust: i32) -> Roster {
    Roster::new([
        Marshal::new("ney", Personality::Aggressive, trust).at("Reims", 12_000),
        Marshal::new("davout", Personality::Cautious, trust).at("Paris", 10_000),
        Marshal::new("soult", Personality::Balanced, trust).at("Lyon", 8_000),
    ])
}

pub fn uncapped_config() -> Arc<ObjectionConfig> {
    let mut config = ObjectionConfig::default();
    config.turn.major_objections_per_turn = u8::MAX;
    Arc::new(config)
}

/// Rng pinned to the middle of every range: no severity noise, obedience rolls of 0.5.
pub fn midpoint_rng() -> StepRng {
    StepRng::new(1 << 31, 0)
}

pub fn midpoint_session(roster: Roster, config: Arc<ObjectionConfig>) -> CommandSession<StepRng> {
    CommandSession::with_rng(roster, PersonalityCatalog::builtin(), config, midpoint_rng())
}
