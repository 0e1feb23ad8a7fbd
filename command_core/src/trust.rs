use serde::{Deserialize, Serialize};

pub const TRUST_MIN: i32 = 0;
pub const TRUST_MAX: i32 = 100;

/// Named band of a trust value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLabel {
    Loyal,
    Reliable,
    Questioning,
    Strained,
    Broken,
}

impl TrustLabel {
    pub fn from_value(value: i32) -> Self {
        match value {
            v if v >= 80 => TrustLabel::Loyal,
            v if v >= 60 => TrustLabel::Reliable,
            v if v >= 40 => TrustLabel::Questioning,
            v if v >= 20 => TrustLabel::Strained,
            _ => TrustLabel::Broken,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrustLabel::Loyal => "Loyal",
            TrustLabel::Reliable => "Reliable",
            TrustLabel::Questioning => "Questioning",
            TrustLabel::Strained => "Strained",
            TrustLabel::Broken => "Broken",
        }
    }
}

/// A marshal's trust in the commander, always within `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustLedger {
    value: i32,
}

impl Default for TrustLedger {
    fn default() -> Self {
        Self { value: 70 }
    }
}

impl TrustLedger {
    pub fn new(initial: i32) -> Self {
        Self {
            value: initial.clamp(TRUST_MIN, TRUST_MAX),
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Applies `delta` and returns the change that actually landed after clamping.
    pub fn modify(&mut self, delta: i32) -> i32 {
        let before = self.value;
        self.value = before.saturating_add(delta).clamp(TRUST_MIN, TRUST_MAX);
        self.value - before
    }

    pub fn set(&mut self, value: i32) {
        self.value = value.clamp(TRUST_MIN, TRUST_MAX);
    }

    pub fn label(&self) -> TrustLabel {
        TrustLabel::from_value(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modify_returns_applied_delta() {
        for start in [0, 1, 15, 50, 88, 99, 100] {
            for delta in [-200, -15, -10, -1, 0, 1, 3, 12, 200] {
                let mut ledger = TrustLedger::new(start);
                let applied = ledger.modify(delta);
                let expected = (start + delta).clamp(0, 100);
                assert_eq!(ledger.value(), expected, "start {start} delta {delta}");
                assert_eq!(applied, expected - start);
            }
        }
    }

    #[test]
    fn extreme_deltas_do_not_overflow() {
        let mut ledger = TrustLedger::new(50);
        assert_eq!(ledger.modify(i32::MAX), 50);
        assert_eq!(ledger.modify(i32::MIN), -100);
        assert_eq!(ledger.value(), 0);
    }

    #[test]
    fn labels_follow_bands() {
        assert_eq!(TrustLedger::new(100).label(), TrustLabel::Loyal);
        assert_eq!(TrustLedger::new(80).label(), TrustLabel::Loyal);
        assert_eq!(TrustLedger::new(79).label(), TrustLabel::Reliable);
        assert_eq!(TrustLedger::new(45).label(), TrustLabel::Questioning);
        assert_eq!(TrustLedger::new(20).label(), TrustLabel::Strained);
        assert_eq!(TrustLedger::new(19).label(), TrustLabel::Broken);
    }

    #[test]
    fn construction_clamps() {
        assert_eq!(TrustLedger::new(140).value(), 100);
        assert_eq!(TrustLedger::new(-3).value(), 0);
    }
}
