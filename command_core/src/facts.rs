//! World-layer queries the negotiation core consumes but never computes.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Deserialize;

use crate::orders::{MarshalId, RegionId};

/// Read-only facts about the battlefield supplied by the map and combat layers.
///
/// Every query degrades to "unknown" (`None`, `false`, empty) instead of failing;
/// callers fall through to their next check.
pub trait BattlefieldFacts {
    /// An enemy force stands in or next to `region`.
    fn enemy_adjacent(&self, region: &RegionId) -> bool;

    /// Regions next to `region` held by the enemy, nearest first.
    fn adjacent_enemy_regions(&self, region: &RegionId) -> Vec<RegionId>;

    /// Friendly-to-enemy strength ratio for `marshal` attacking `target`.
    fn strength_ratio(&self, marshal: &MarshalId, target: &RegionId) -> Option<f32>;

    fn is_fortified(&self, region: &RegionId) -> bool;

    fn capital(&self) -> Option<RegionId>;

    /// Another friendly force besides `excluding` garrisons `region`.
    fn friendly_presence(&self, region: &RegionId, excluding: &MarshalId) -> bool;

    /// Adjacency-validated destinations from `from`.
    fn valid_moves(&self, from: &RegionId) -> Vec<RegionId>;

    /// Shortest-path distance in region hops.
    fn distance(&self, from: &RegionId, to: &RegionId) -> Option<u32>;
}

/// In-memory battlefield used by scenario replays and tests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaticBattlefield {
    pub capital: Option<RegionId>,
    pub adjacency: BTreeMap<RegionId, BTreeSet<RegionId>>,
    pub enemy_regions: BTreeSet<RegionId>,
    pub strength_ratios: BTreeMap<RegionId, f32>,
    pub fortified: BTreeSet<RegionId>,
    pub garrisons: BTreeMap<RegionId, BTreeSet<MarshalId>>,
}

impl StaticBattlefield {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capital(mut self, region: &str) -> Self {
        self.capital = Some(RegionId::new(region));
        self
    }

    pub fn connect(mut self, a: &str, b: &str) -> Self {
        let (a, b) = (RegionId::new(a), RegionId::new(b));
        self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b).or_default().insert(a);
        self
    }

    pub fn with_enemy(mut self, region: &str) -> Self {
        self.enemy_regions.insert(RegionId::new(region));
        self
    }

    pub fn with_ratio(mut self, region: &str, ratio: f32) -> Self {
        self.strength_ratios.insert(RegionId::new(region), ratio);
        self
    }

    pub fn with_fortified(mut self, region: &str) -> Self {
        self.fortified.insert(RegionId::new(region));
        self
    }

    pub fn with_garrison(mut self, region: &str, marshal: &str) -> Self {
        self.garrisons
            .entry(RegionId::new(region))
            .or_default()
            .insert(MarshalId::new(marshal));
        self
    }

    fn neighbours(&self, region: &RegionId) -> BTreeSet<RegionId> {
        let mut out: BTreeSet<RegionId> = self.adjacency.get(region).cloned().unwrap_or_default();
        for (from, targets) in &self.adjacency {
            if targets.contains(region) {
                out.insert(from.clone());
            }
        }
        out.remove(region);
        out
    }
}

impl BattlefieldFacts for StaticBattlefield {
    fn enemy_adjacent(&self, region: &RegionId) -> bool {
        self.enemy_regions.contains(region)
            || self
                .neighbours(region)
                .iter()
                .any(|neighbour| self.enemy_regions.contains(neighbour))
    }

    fn adjacent_enemy_regions(&self, region: &RegionId) -> Vec<RegionId> {
        self.neighbours(region)
            .into_iter()
            .filter(|neighbour| self.enemy_regions.contains(neighbour))
            .collect()
    }

    fn strength_ratio(&self, _marshal: &MarshalId, target: &RegionId) -> Option<f32> {
        self.strength_ratios
            .get(target)
            .copied()
            .filter(|ratio| ratio.is_finite() && *ratio >= 0.0)
    }

    fn is_fortified(&self, region: &RegionId) -> bool {
        self.fortified.contains(region)
    }

    fn capital(&self) -> Option<RegionId> {
        self.capital.clone()
    }

    fn friendly_presence(&self, region: &RegionId, excluding: &MarshalId) -> bool {
        self.garrisons
            .get(region)
            .map(|present| present.iter().any(|id| id != excluding))
            .unwrap_or(false)
    }

    fn valid_moves(&self, from: &RegionId) -> Vec<RegionId> {
        self.neighbours(from).into_iter().collect()
    }

    fn distance(&self, from: &RegionId, to: &RegionId) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        let mut seen = BTreeSet::from([from.clone()]);
        let mut frontier = VecDeque::from([(from.clone(), 0u32)]);
        while let Some((region, hops)) = frontier.pop_front() {
            for neighbour in self.neighbours(&region) {
                if &neighbour == to {
                    return Some(hops + 1);
                }
                if seen.insert(neighbour.clone()) {
                    frontier.push_back((neighbour, hops + 1));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> StaticBattlefield {
        StaticBattlefield::new()
            .connect("Paris", "Reims")
            .connect("Reims", "Metz")
            .connect("Metz", "Strasbourg")
            .connect("Strasbourg", "Ulm")
            .with_enemy("Ulm")
    }

    #[test]
    fn distance_walks_shortest_path() {
        let field = line();
        assert_eq!(
            field.distance(&RegionId::new("Paris"), &RegionId::new("Metz")),
            Some(2)
        );
        assert_eq!(
            field.distance(&RegionId::new("Paris"), &RegionId::new("Madrid")),
            None
        );
    }

    #[test]
    fn enemy_adjacency_checks_neighbours() {
        let field = line();
        assert!(field.enemy_adjacent(&RegionId::new("Strasbourg")));
        assert!(!field.enemy_adjacent(&RegionId::new("Metz")));
        assert_eq!(
            field.adjacent_enemy_regions(&RegionId::new("Strasbourg")),
            vec![RegionId::new("Ulm")]
        );
    }

    #[test]
    fn garrison_presence_ignores_self() {
        let field = StaticBattlefield::new()
            .with_garrison("Paris", "davout")
            .with_garrison("Lyon", "ney")
            .with_garrison("Lyon", "murat");
        assert!(!field.friendly_presence(&RegionId::new("Paris"), &MarshalId::new("davout")));
        assert!(field.friendly_presence(&RegionId::new("Lyon"), &MarshalId::new("ney")));
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "capital": "Paris",
            "adjacency": {"Paris": ["Reims"]},
            "strength_ratios": {"Reims": 0.4},
            "fortified": ["Reims"]
        }"#;
        let field: StaticBattlefield = serde_json::from_str(json).expect("battlefield parses");
        assert_eq!(field.capital(), Some(RegionId::new("Paris")));
        assert_eq!(
            field.strength_ratio(&MarshalId::new("ney"), &RegionId::new("Reims")),
            Some(0.4)
        );
        assert_eq!(field.valid_moves(&RegionId::new("Reims")), vec![RegionId::new("Paris")]);
    }
}
