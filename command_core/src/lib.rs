//! Core negotiation crate for the marshal command layer.
//!
//! Decides whether a marshal obeys, grumbles about, or formally objects to an
//! order, and tracks the trust, authority and vindication that feed back into
//! the next decision. [`CommandSession`] is the entry point for game code;
//! the component modules are public for tools and tests.

pub mod alternatives;
pub mod authority;
pub mod config;
pub mod facts;
pub mod hashing;
pub mod marshal;
pub mod messages;
pub mod objection;
pub mod orders;
pub mod personality;
pub mod redemption;
pub mod session;
pub mod severity;
pub mod situation;
pub mod trust;
pub mod vindication;

pub use alternatives::AlternativePlan;
pub use authority::{AuthorityEvent, AuthorityTracker, ResponseChoice};
pub use config::{
    load_objection_config_from_env, BlockingPolicy, ObjectionConfig, ObjectionConfigError,
};
pub use facts::{BattlefieldFacts, StaticBattlefield};
pub use marshal::{BattleResult, Marshal, MarshalRole, Personality, Roster};
pub use objection::{
    Disposition, MajorObjection, MildObjection, Objection, ObjectionEngine, ObjectionOption,
    ResolutionOutcome, TurnContext,
};
pub use orders::{Action, MarshalId, Order, OrderError, RegionId, Stance};
pub use personality::{load_personality_catalog_from_env, PersonalityCatalog, PersonalityCatalogError};
pub use redemption::{
    RedemptionChoice, RedemptionEffect, RedemptionError, RedemptionEvent, RedemptionOutcome,
};
pub use session::{BattleReport, CommandSession, Resolution, ResolveError, TurnSummary};
pub use severity::{ObjectionLevel, SeverityBreakdown, SeverityCalculator};
pub use situation::Situation;
pub use trust::{TrustLabel, TrustLedger};
pub use vindication::{VindicationOutcome, VindicationTracker};
