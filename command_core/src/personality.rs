//! Data-driven personality table: archetype -> situation -> base severity.
//!
//! Loaded from `personality_catalog.json` with support for an environment
//! variable override. A situation missing from an archetype's table means
//! that archetype never objects to it.

use std::{
    collections::BTreeMap,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;

use crate::marshal::Personality;
use crate::situation::Situation;

pub const BUILTIN_PERSONALITY_CATALOG: &str = include_str!("data/personality_catalog.json");

#[derive(Debug, Clone, Default)]
pub struct PhrasePools {
    pub mild: Vec<String>,
    pub major: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ArchetypeProfile {
    pub severities: BTreeMap<Situation, f32>,
    pub phrases: PhrasePools,
}

#[derive(Debug, Clone, Default)]
pub struct PersonalityCatalog {
    pub version: u32,
    profiles: BTreeMap<Personality, ArchetypeProfile>,
}

impl PersonalityCatalog {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            Self::from_json_str(BUILTIN_PERSONALITY_CATALOG)
                .expect("builtin personality catalog should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, PersonalityCatalogError> {
        let file: PersonalityCatalogFile = serde_json::from_str(json)?;
        Self::from_file_contents(file)
    }

    pub fn from_file(path: &Path) -> Result<Self, PersonalityCatalogError> {
        let contents =
            fs::read_to_string(path).map_err(|source| PersonalityCatalogError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json_str(&contents)
    }

    /// Base severity, or `None` when the archetype has no trigger for `situation`.
    pub fn base_severity(&self, personality: Personality, situation: Situation) -> Option<f32> {
        self.profiles
            .get(&personality)
            .and_then(|profile| profile.severities.get(&situation))
            .copied()
    }

    pub fn profile(&self, personality: Personality) -> Option<&ArchetypeProfile> {
        self.profiles.get(&personality)
    }

    pub fn phrases(&self, personality: Personality) -> Option<&PhrasePools> {
        self.profiles.get(&personality).map(|profile| &profile.phrases)
    }

    fn from_file_contents(file: PersonalityCatalogFile) -> Result<Self, PersonalityCatalogError> {
        let mut profiles = BTreeMap::new();
        for (name, entry) in file.archetypes {
            let personality = name
                .parse::<Personality>()
                .map_err(|_| PersonalityCatalogError::UnknownArchetype(name.clone()))?;

            let mut severities = BTreeMap::new();
            for (key, value) in entry.severities {
                let situation =
                    key.parse::<Situation>()
                        .map_err(|_| PersonalityCatalogError::UnknownSituation {
                            archetype: name.clone(),
                            situation: key.clone(),
                        })?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(PersonalityCatalogError::SeverityOutOfRange {
                        archetype: name.clone(),
                        situation: key,
                        value,
                    });
                }
                severities.insert(situation, value);
            }

            if entry.phrases.mild.is_empty() || entry.phrases.major.is_empty() {
                return Err(PersonalityCatalogError::EmptyPhrasePool(name));
            }

            let profile = ArchetypeProfile {
                severities,
                phrases: PhrasePools {
                    mild: entry.phrases.mild,
                    major: entry.phrases.major,
                },
            };
            if profiles.insert(personality, profile).is_some() {
                return Err(PersonalityCatalogError::Duplicate(name));
            }
        }

        Ok(Self {
            version: file.version,
            profiles,
        })
    }
}

#[derive(Debug, Error)]
pub enum PersonalityCatalogError {
    #[error("failed to parse personality catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read personality catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unknown archetype '{0}'")]
    UnknownArchetype(String),
    #[error("duplicate archetype '{0}'")]
    Duplicate(String),
    #[error("unknown situation '{situation}' for archetype '{archetype}'")]
    UnknownSituation {
        archetype: String,
        situation: String,
    },
    #[error("severity {value} for '{archetype}'/'{situation}' outside [0, 1]")]
    SeverityOutOfRange {
        archetype: String,
        situation: String,
        value: f32,
    },
    #[error("archetype '{0}' needs at least one mild and one major phrase")]
    EmptyPhrasePool(String),
}

#[derive(Deserialize)]
struct PersonalityCatalogFile {
    #[serde(default)]
    version: u32,
    archetypes: BTreeMap<String, ArchetypeCatalogEntry>,
}

#[derive(Deserialize)]
struct ArchetypeCatalogEntry {
    #[serde(default)]
    severities: BTreeMap<String, f32>,
    #[serde(default)]
    phrases: PhraseCatalogEntry,
}

#[derive(Deserialize, Default)]
struct PhraseCatalogEntry {
    #[serde(default)]
    mild: Vec<String>,
    #[serde(default)]
    major: Vec<String>,
}

/// Load the personality catalog from `PERSONALITY_CATALOG_PATH`, falling back to the builtin.
pub fn load_personality_catalog_from_env() -> Arc<PersonalityCatalog> {
    let Some(path) = env::var("PERSONALITY_CATALOG_PATH").ok().map(PathBuf::from) else {
        tracing::info!(
            target: "marshal_command::config",
            "personality_catalog.loaded=builtin"
        );
        return PersonalityCatalog::builtin();
    };

    match PersonalityCatalog::from_file(&path) {
        Ok(catalog) => {
            tracing::info!(
                target: "marshal_command::config",
                path = %path.display(),
                "personality_catalog.loaded=file"
            );
            Arc::new(catalog)
        }
        Err(err) => {
            tracing::warn!(
                target: "marshal_command::config",
                path = %path.display(),
                error = %err,
                "personality_catalog.load_failed"
            );
            PersonalityCatalog::builtin()
        }
    }
}
