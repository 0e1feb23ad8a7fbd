//! Tunables for objection classification, resolution and redemption.
//!
//! Loaded from `objection_config.json` with support for environment variable overrides.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_OBJECTION_CONFIG: &str = include_str!("data/objection_config.json");

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectionConfig {
    pub severity: SeverityBands,
    pub turn: TurnLimits,
    pub resolution: ResolutionDeltas,
    pub redemption: RedemptionTuning,
    pub defaults: StartingValues,
}

impl ObjectionConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_OBJECTION_CONFIG)
                .expect("builtin objection config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, ObjectionConfigError> {
        let config: ObjectionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ObjectionConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ObjectionConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    fn validate(&self) -> Result<(), ObjectionConfigError> {
        let bands = &self.severity;
        let ordered = 0.0 <= bands.mild_threshold
            && bands.mild_threshold <= bands.major_threshold
            && bands.major_threshold <= bands.ceiling
            && bands.ceiling <= 1.0;
        if !ordered {
            return Err(ObjectionConfigError::UnorderedBands {
                mild: bands.mild_threshold,
                major: bands.major_threshold,
                ceiling: bands.ceiling,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeverityBands {
    pub mild_threshold: f32,
    pub major_threshold: f32,
    pub ceiling: f32,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self {
            mild_threshold: 0.20,
            major_threshold: 0.50,
            ceiling: 0.95,
        }
    }
}

/// Which commands an open major objection blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingPolicy {
    /// Every other marshal waits until the objection is resolved.
    #[default]
    Global,
    PerMarshal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TurnLimits {
    pub major_objections_per_turn: u8,
    pub blocking: BlockingPolicy,
}

impl Default for TurnLimits {
    fn default() -> Self {
        Self {
            major_objections_per_turn: 2,
            blocking: BlockingPolicy::Global,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolutionDeltas {
    pub trust_gain: i32,
    pub insist_comply_penalty: i32,
    pub insist_refuse_penalty: i32,
    pub compromise_gain: i32,
    /// Below this trust the insist option warns that the marshal may disobey.
    pub disobey_warning_trust: i32,
}

impl Default for ResolutionDeltas {
    fn default() -> Self {
        Self {
            trust_gain: 12,
            insist_comply_penalty: -10,
            insist_refuse_penalty: -15,
            compromise_gain: 3,
            disobey_warning_trust: 40,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedemptionTuning {
    pub trust_threshold: i32,
    pub autonomy_turns: u8,
    pub transfer_radius: u32,
    pub dismiss_authority_bonus: i32,
}

impl Default for RedemptionTuning {
    fn default() -> Self {
        Self {
            trust_threshold: 20,
            autonomy_turns: 3,
            transfer_radius: 3,
            dismiss_authority_bonus: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StartingValues {
    pub initial_trust: i32,
    pub initial_authority: i32,
}

impl Default for StartingValues {
    fn default() -> Self {
        Self {
            initial_trust: 70,
            initial_authority: 50,
        }
    }
}

#[derive(Debug, Error)]
pub enum ObjectionConfigError {
    #[error("failed to parse objection config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read objection config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("severity bands must satisfy 0 <= mild ({mild}) <= major ({major}) <= ceiling ({ceiling}) <= 1")]
    UnorderedBands { mild: f32, major: f32, ceiling: f32 },
}

/// Load objection configuration from `OBJECTION_CONFIG_PATH` or the builtin defaults.
pub fn load_objection_config_from_env() -> (Arc<ObjectionConfig>, Option<PathBuf>) {
    let override_path = env::var("OBJECTION_CONFIG_PATH").ok().map(PathBuf::from);

    if let Some(path) = override_path {
        match ObjectionConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "marshal_command::config",
                    path = %path.display(),
                    "objection_config.loaded=file"
                );
                return (Arc::new(config), Some(path));
            }
            Err(err) => {
                tracing::warn!(
                    target: "marshal_command::config",
                    path = %path.display(),
                    error = %err,
                    "objection_config.load_failed"
                );
            }
        }
    }

    tracing::info!(
        target: "marshal_command::config",
        "objection_config.loaded=builtin"
    );
    (ObjectionConfig::builtin(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_matches_defaults() {
        let config = ObjectionConfig::builtin();
        assert_eq!(config.turn.major_objections_per_turn, 2);
        assert_eq!(config.turn.blocking, BlockingPolicy::Global);
        assert_eq!(config.resolution.trust_gain, 12);
        assert_eq!(config.redemption.trust_threshold, 20);
        assert_eq!(config.severity.ceiling, 0.95);
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let config = ObjectionConfig::from_json_str(
            r#"{"turn": {"major_objections_per_turn": 1, "blocking": "per_marshal"}}"#,
        )
        .expect("config parses");
        assert_eq!(config.turn.major_objections_per_turn, 1);
        assert_eq!(config.turn.blocking, BlockingPolicy::PerMarshal);
        assert_eq!(config.resolution.insist_refuse_penalty, -15);
    }

    #[test]
    fn unordered_bands_are_rejected() {
        let err = ObjectionConfig::from_json_str(
            r#"{"severity": {"mild_threshold": 0.6, "major_threshold": 0.5}}"#,
        )
        .expect_err("bands out of order");
        assert!(matches!(err, ObjectionConfigError::UnorderedBands { .. }));
    }
}
