use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::orders::{MarshalId, RegionId};
use crate::trust::TrustLedger;

pub const VINDICATION_MIN: i32 = -5;
pub const VINDICATION_MAX: i32 = 5;
pub const BATTLE_HISTORY: usize = 3;
pub const OVERRIDE_HISTORY: usize = 5;

/// Closed set of marshal temperaments. Behaviour lives in the personality catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Aggressive,
    Cautious,
    Literal,
    Balanced,
    Loyal,
}

impl Personality {
    pub const ALL: [Personality; 5] = [
        Personality::Aggressive,
        Personality::Cautious,
        Personality::Literal,
        Personality::Balanced,
        Personality::Loyal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Personality::Aggressive => "aggressive",
            Personality::Cautious => "cautious",
            Personality::Literal => "literal",
            Personality::Balanced => "balanced",
            Personality::Loyal => "loyal",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Personality {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Personality::ALL
            .into_iter()
            .find(|personality| personality.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleResult {
    Victory,
    Defeat,
    Draw,
}

impl BattleResult {
    pub fn as_str(self) -> &'static str {
        match self {
            BattleResult::Victory => "victory",
            BattleResult::Defeat => "defeat",
            BattleResult::Draw => "draw",
        }
    }
}

/// Where a marshal currently serves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "role")]
pub enum MarshalRole {
    Field,
    /// Staff posting; the field command is parked until restoration.
    Administrative {
        stored_strength: u32,
        stored_location: Option<RegionId>,
    },
}

#[derive(Clone, Debug)]
pub struct Marshal {
    pub id: MarshalId,
    pub personality: Personality,
    pub trust: TrustLedger,
    pub location: Option<RegionId>,
    pub strength: u32,
    pub role: MarshalRole,
    pub redemption_pending: bool,
    /// Set when a redemption fires; cleared once trust climbs back over the threshold.
    pub redemption_spent: bool,
    /// Turns left in an autonomy window, if one is open.
    pub autonomy_turns: Option<u8>,
    vindication: i32,
    recent_battles: VecDeque<BattleResult>,
    recent_overrides: VecDeque<bool>,
}

impl Marshal {
    pub fn new(id: impl Into<String>, personality: Personality, trust: i32) -> Self {
        Self {
            id: MarshalId::new(id),
            personality,
            trust: TrustLedger::new(trust),
            location: None,
            strength: 0,
            role: MarshalRole::Field,
            redemption_pending: false,
            redemption_spent: false,
            autonomy_turns: None,
            vindication: 0,
            recent_battles: VecDeque::with_capacity(BATTLE_HISTORY),
            recent_overrides: VecDeque::with_capacity(OVERRIDE_HISTORY),
        }
    }

    pub fn at(mut self, region: &str, strength: u32) -> Self {
        self.location = Some(RegionId::new(region));
        self.strength = strength;
        self
    }

    pub fn vindication(&self) -> i32 {
        self.vindication
    }

    /// Applies a clamped vindication change and returns the applied delta.
    pub fn adjust_vindication(&mut self, delta: i32) -> i32 {
        let before = self.vindication;
        self.vindication = before
            .saturating_add(delta)
            .clamp(VINDICATION_MIN, VINDICATION_MAX);
        self.vindication - before
    }

    pub fn recent_battles(&self) -> impl Iterator<Item = BattleResult> + '_ {
        self.recent_battles.iter().copied()
    }

    pub fn recent_overrides(&self) -> impl Iterator<Item = bool> + '_ {
        self.recent_overrides.iter().copied()
    }

    pub fn record_battle(&mut self, result: BattleResult) {
        if self.recent_battles.len() == BATTLE_HISTORY {
            self.recent_battles.pop_front();
        }
        self.recent_battles.push_back(result);
    }

    pub fn record_override(&mut self, overridden: bool) {
        if self.recent_overrides.len() == OVERRIDE_HISTORY {
            self.recent_overrides.pop_front();
        }
        self.recent_overrides.push_back(overridden);
    }

    pub fn reset_performance(&mut self) {
        self.recent_battles.clear();
        self.recent_overrides.clear();
    }

    pub fn is_field(&self) -> bool {
        matches!(self.role, MarshalRole::Field)
    }

    pub fn is_autonomous(&self) -> bool {
        self.autonomy_turns.is_some()
    }
}

/// Every marshal still serving under the commander, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    marshals: BTreeMap<MarshalId, Marshal>,
}

impl Roster {
    pub fn new(marshals: impl IntoIterator<Item = Marshal>) -> Self {
        Self {
            marshals: marshals
                .into_iter()
                .map(|marshal| (marshal.id.clone(), marshal))
                .collect(),
        }
    }

    pub fn insert(&mut self, marshal: Marshal) -> Option<Marshal> {
        self.marshals.insert(marshal.id.clone(), marshal)
    }

    pub fn get(&self, id: &MarshalId) -> Option<&Marshal> {
        self.marshals.get(id)
    }

    pub fn get_mut(&mut self, id: &MarshalId) -> Option<&mut Marshal> {
        self.marshals.get_mut(id)
    }

    pub fn remove(&mut self, id: &MarshalId) -> Option<Marshal> {
        self.marshals.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marshal> {
        self.marshals.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Marshal> {
        self.marshals.values_mut()
    }

    pub fn len(&self) -> usize {
        self.marshals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marshals.is_empty()
    }

    pub fn field_count(&self) -> usize {
        self.marshals.values().filter(|marshal| marshal.is_field()).count()
    }

    pub fn administrative_holder(&self) -> Option<&MarshalId> {
        self.marshals
            .values()
            .find(|marshal| !marshal.is_field())
            .map(|marshal| &marshal.id)
    }

    pub fn total_strength(&self) -> u64 {
        self.marshals
            .values()
            .map(|marshal| match &marshal.role {
                MarshalRole::Field => u64::from(marshal.strength),
                MarshalRole::Administrative {
                    stored_strength, ..
                } => u64::from(*stored_strength),
            })
            .sum()
    }
}
