use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier for a marshal under the commander's authority.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarshalId(pub String);

impl MarshalId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarshalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for a map region. Topology lives in the world layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed order vocabulary produced by the parsing layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Attack,
    Defend,
    Move,
    Retreat,
    Fortify,
    Drill,
    StanceChange,
    Wait,
    Hold,
    Recruit,
    Scout,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::Attack,
        Action::Defend,
        Action::Move,
        Action::Retreat,
        Action::Fortify,
        Action::Drill,
        Action::StanceChange,
        Action::Wait,
        Action::Hold,
        Action::Recruit,
        Action::Scout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Attack => "attack",
            Action::Defend => "defend",
            Action::Move => "move",
            Action::Retreat => "retreat",
            Action::Fortify => "fortify",
            Action::Drill => "drill",
            Action::StanceChange => "stance_change",
            Action::Wait => "wait",
            Action::Hold => "hold",
            Action::Recruit => "recruit",
            Action::Scout => "scout",
        }
    }

    pub fn requires_target(self) -> bool {
        matches!(self, Action::Attack | Action::Move | Action::Scout)
    }

    /// Orders that keep the army where it stands.
    pub fn is_passive(self) -> bool {
        matches!(
            self,
            Action::Defend | Action::Wait | Action::Hold | Action::Fortify | Action::Retreat
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = OrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "attack" => Ok(Action::Attack),
            "defend" => Ok(Action::Defend),
            "move" => Ok(Action::Move),
            "retreat" => Ok(Action::Retreat),
            "fortify" => Ok(Action::Fortify),
            "drill" => Ok(Action::Drill),
            "stance_change" | "stance" => Ok(Action::StanceChange),
            "wait" => Ok(Action::Wait),
            "hold" => Ok(Action::Hold),
            "recruit" => Ok(Action::Recruit),
            "scout" => Ok(Action::Scout),
            other => Err(OrderError::UnknownAction(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Aggressive,
    Balanced,
    Defensive,
}

impl Stance {
    pub fn as_str(self) -> &'static str {
        match self {
            Stance::Aggressive => "aggressive",
            Stance::Balanced => "balanced",
            Stance::Defensive => "defensive",
        }
    }
}

/// A structured order as handed over by the parsing layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<RegionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_stance: Option<Stance>,
}

impl Order {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            target: None,
            target_stance: None,
        }
    }

    pub fn targeting(action: Action, target: RegionId) -> Self {
        Self {
            action,
            target: Some(target),
            target_stance: None,
        }
    }

    pub fn stance(stance: Stance) -> Self {
        Self {
            action: Action::StanceChange,
            target: None,
            target_stance: Some(stance),
        }
    }

    /// Short human-readable form used in objection text.
    pub fn describe(&self) -> String {
        match (&self.target, self.target_stance) {
            (_, Some(stance)) if self.action == Action::StanceChange => {
                format!("adopt a {} stance", stance.as_str())
            }
            (Some(target), _) if self.action == Action::Move => format!("move to {target}"),
            (Some(target), _) => format!("{} {}", self.action, target),
            (None, _) => match self.action {
                Action::Defend => "defend in place".to_string(),
                other => other.as_str().replace('_', " "),
            },
        }
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        if self.action.requires_target() && self.target.is_none() {
            return Err(OrderError::MissingTarget(self.action));
        }
        if self.action == Action::StanceChange && self.target_stance.is_none() {
            return Err(OrderError::MissingStance);
        }
        Ok(())
    }
}

/// Validation failures raised before an order reaches severity calculation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("order '{0}' requires a target region")]
    MissingTarget(Action),
    #[error("stance change requires a target stance")]
    MissingStance,
    #[error("marshal {0} is not registered")]
    UnknownMarshal(MarshalId),
    #[error("marshal {0} is serving in an administrative role")]
    NotInField(MarshalId),
    #[error("marshal {0} is acting autonomously")]
    Autonomous(MarshalId),
    #[error("marshal {0} already has an open objection awaiting a choice")]
    AwaitingChoice(MarshalId),
    #[error("command blocked until the objection from {0} is resolved")]
    BlockedByObjection(MarshalId),
}
