use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::facts::BattlefieldFacts;
use crate::marshal::Marshal;
use crate::orders::{Action, Order};

const SEVERELY_OUTNUMBERED: f32 = 0.33;
const OUTNUMBERED: f32 = 0.50;
const SLIGHTLY_OUTNUMBERED: f32 = 0.67;

/// Situation keys the personality catalog is indexed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Situation {
    Defend,
    Wait,
    HoldPosition,
    WaitWithEnemyNearby,
    AttackOutnumberedSevere,
    AttackOutnumbered,
    AttackOutnumberedSlight,
    AttackFortified,
    Retreat,
    Fortify,
    ExposeCapital,
    /// Present in catalog data; no analyzer rule produces it yet.
    AmbiguousOrder,
}

impl Situation {
    pub const ALL: [Situation; 12] = [
        Situation::Defend,
        Situation::Wait,
        Situation::HoldPosition,
        Situation::WaitWithEnemyNearby,
        Situation::AttackOutnumberedSevere,
        Situation::AttackOutnumbered,
        Situation::AttackOutnumberedSlight,
        Situation::AttackFortified,
        Situation::Retreat,
        Situation::Fortify,
        Situation::ExposeCapital,
        Situation::AmbiguousOrder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Situation::Defend => "defend",
            Situation::Wait => "wait",
            Situation::HoldPosition => "hold_position",
            Situation::WaitWithEnemyNearby => "wait_with_enemy_nearby",
            Situation::AttackOutnumberedSevere => "attack_outnumbered_severe",
            Situation::AttackOutnumbered => "attack_outnumbered",
            Situation::AttackOutnumberedSlight => "attack_outnumbered_slight",
            Situation::AttackFortified => "attack_fortified",
            Situation::Retreat => "retreat",
            Situation::Fortify => "fortify",
            Situation::ExposeCapital => "expose_capital",
            Situation::AmbiguousOrder => "ambiguous_order",
        }
    }

    pub fn class(self) -> SituationClass {
        match self {
            Situation::Defend
            | Situation::Wait
            | Situation::HoldPosition
            | Situation::WaitWithEnemyNearby
            | Situation::Retreat
            | Situation::Fortify => SituationClass::Passive,
            Situation::AttackOutnumberedSevere
            | Situation::AttackOutnumbered
            | Situation::AttackOutnumberedSlight
            | Situation::AttackFortified => SituationClass::RiskyAttack,
            Situation::ExposeCapital => SituationClass::CapitalExposure,
            Situation::AmbiguousOrder => SituationClass::Ambiguous,
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Situation {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Situation::ALL
            .into_iter()
            .find(|situation| situation.as_str() == value.trim())
            .ok_or(())
    }
}

/// Coarse grouping used to pick an alternative-order strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SituationClass {
    Passive,
    RiskyAttack,
    CapitalExposure,
    Ambiguous,
}

/// Classifies `order` for `marshal` against the supplied facts.
///
/// Missing facts never fail: each rule falls through to the next applicable
/// check and finally to `None`.
pub fn classify<F>(marshal: &Marshal, order: &Order, facts: &F) -> Option<Situation>
where
    F: BattlefieldFacts + ?Sized,
{
    match order.action {
        Action::Defend => Some(Situation::Defend),
        Action::Wait | Action::Hold => {
            let threatened = marshal
                .location
                .as_ref()
                .map(|region| facts.enemy_adjacent(region))
                .unwrap_or(false);
            if threatened {
                Some(Situation::WaitWithEnemyNearby)
            } else if order.action == Action::Wait {
                Some(Situation::Wait)
            } else {
                Some(Situation::HoldPosition)
            }
        }
        Action::Attack => {
            let target = order.target.as_ref()?;
            let tier = facts
                .strength_ratio(&marshal.id, target)
                .and_then(outnumbered_tier);
            tier.or_else(|| facts.is_fortified(target).then_some(Situation::AttackFortified))
        }
        Action::Retreat => Some(Situation::Retreat),
        Action::Fortify => Some(Situation::Fortify),
        Action::Move => {
            let location = marshal.location.as_ref()?;
            let capital = facts.capital()?;
            let leaving = order.target.as_ref() != Some(&capital);
            (leaving && *location == capital && !facts.friendly_presence(&capital, &marshal.id))
                .then_some(Situation::ExposeCapital)
        }
        Action::Drill
        | Action::StanceChange
        | Action::Recruit
        | Action::Scout => None,
    }
}

fn outnumbered_tier(ratio: f32) -> Option<Situation> {
    if ratio < SEVERELY_OUTNUMBERED {
        Some(Situation::AttackOutnumberedSevere)
    } else if ratio < OUTNUMBERED {
        Some(Situation::AttackOutnumbered)
    } else if ratio < SLIGHTLY_OUTNUMBERED {
        Some(Situation::AttackOutnumberedSlight)
    } else {
        None
    }
}
