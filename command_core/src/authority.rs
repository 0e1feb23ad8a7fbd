use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

pub const AUTHORITY_MIN: i32 = 0;
pub const AUTHORITY_MAX: i32 = 100;
const WINDOW_SIZE: usize = 10;
const MIN_SAMPLES: usize = 5;
const THRESHOLDS: [u8; 3] = [70, 50, 30];

/// The commander's answer to a major objection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseChoice {
    Trust,
    Insist,
    Compromise,
}

impl ResponseChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseChoice::Trust => "trust",
            ResponseChoice::Insist => "insist",
            ResponseChoice::Compromise => "compromise",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trust" | "trust_marshal" => Some(ResponseChoice::Trust),
            "insist" | "overrule" => Some(ResponseChoice::Insist),
            "compromise" => Some(ResponseChoice::Compromise),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted the first time authority falls below one of the named thresholds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthorityEvent {
    pub threshold: u8,
    pub authority: i32,
    pub message: String,
}

fn threshold_message(threshold: u8) -> &'static str {
    match threshold {
        70 => "Murmurs in the staff tent: the marshals no longer take every order as gospel.",
        50 => "Your authority is openly questioned. Marshals argue orders before obeying them.",
        _ => "Command is fraying. Your marshals obey only when it suits them.",
    }
}

/// Commander-wide authority derived from a sliding window of response choices.
#[derive(Clone, Debug)]
pub struct AuthorityTracker {
    value: i32,
    window: VecDeque<ResponseChoice>,
    fired: BTreeSet<u8>,
    events: Vec<AuthorityEvent>,
}

impl Default for AuthorityTracker {
    fn default() -> Self {
        Self::new(50)
    }
}

impl AuthorityTracker {
    pub fn new(initial: i32) -> Self {
        Self {
            value: initial.clamp(AUTHORITY_MIN, AUTHORITY_MAX),
            window: VecDeque::with_capacity(WINDOW_SIZE),
            fired: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn recent_choices(&self) -> impl Iterator<Item = ResponseChoice> + '_ {
        self.window.iter().copied()
    }

    pub fn has_fired(&self, threshold: u8) -> bool {
        self.fired.contains(&threshold)
    }

    /// Records a response choice and applies the pattern drift. Returns the applied drift.
    pub fn record_choice(&mut self, choice: ResponseChoice) -> i32 {
        if self.window.len() == WINDOW_SIZE {
            self.window.pop_front();
        }
        self.window.push_back(choice);

        let drift = self.pattern_drift();
        if drift == 0 {
            return 0;
        }
        let applied = self.modify(drift);
        tracing::debug!(
            target: "marshal_command::authority",
            %choice,
            drift = applied,
            authority = self.value,
            "authority.drift"
        );
        applied
    }

    /// Applies a direct authority change, clamped, and returns the applied delta.
    pub fn modify(&mut self, delta: i32) -> i32 {
        let before = self.value;
        self.value = before
            .saturating_add(delta)
            .clamp(AUTHORITY_MIN, AUTHORITY_MAX);
        self.check_thresholds(before);
        self.value - before
    }

    pub fn drain_events(&mut self) -> Vec<AuthorityEvent> {
        std::mem::take(&mut self.events)
    }

    fn ratio(&self, choice: ResponseChoice) -> f32 {
        if self.window.is_empty() {
            return 0.0;
        }
        let count = self.window.iter().filter(|entry| **entry == choice).count();
        count as f32 / self.window.len() as f32
    }

    fn pattern_drift(&self) -> i32 {
        if self.window.len() < MIN_SAMPLES {
            return 0;
        }
        let trust_ratio = self.ratio(ResponseChoice::Trust);
        let insist_ratio = self.ratio(ResponseChoice::Insist);
        if trust_ratio > 0.80 {
            -5
        } else if trust_ratio > 0.60 {
            -2
        } else if insist_ratio > 0.80 {
            1
        } else if (0.30..=0.60).contains(&trust_ratio) {
            1
        } else {
            0
        }
    }

    /// Only a fall from at-or-above a threshold to below it counts as a crossing.
    fn check_thresholds(&mut self, before: i32) {
        let mut crossed = None;
        for threshold in THRESHOLDS {
            let line = i32::from(threshold);
            if before >= line && self.value < line && self.fired.insert(threshold) {
                crossed = Some(threshold);
            }
        }
        if let Some(threshold) = crossed {
            tracing::info!(
                target: "marshal_command::authority",
                threshold,
                authority = self.value,
                "authority.threshold_crossed"
            );
            self.events.push(AuthorityEvent {
                threshold,
                authority: self.value,
                message: threshold_message(threshold).to_string(),
            });
        }
    }

    /// Scales positive trust gains; chronic trusting makes gratitude cheap.
    pub fn trust_gain_modifier(&self) -> f32 {
        if self.window.len() < MIN_SAMPLES {
            return 1.0;
        }
        let trust_ratio = self.ratio(ResponseChoice::Trust);
        if trust_ratio > 0.80 {
            0.5
        } else if trust_ratio > 0.60 {
            0.75
        } else {
            1.0
        }
    }

    pub fn obedience_modifier(&self) -> f32 {
        match self.value {
            v if v >= 70 => 1.10,
            v if v >= 30 => 1.0,
            _ => 0.90,
        }
    }

    pub fn severity_modifier(&self) -> f32 {
        match self.value {
            v if v >= 50 => 1.0,
            v if v >= 30 => 1.1,
            _ => 1.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_waits_for_five_samples() {
        let mut tracker = AuthorityTracker::new(50);
        for _ in 0..4 {
            assert_eq!(tracker.record_choice(ResponseChoice::Trust), 0);
        }
        assert_eq!(tracker.value(), 50);
        assert_eq!(tracker.record_choice(ResponseChoice::Trust), -5);
        assert_eq!(tracker.value(), 45);
    }

    #[test]
    fn chronic_insisting_builds_authority() {
        let mut tracker = AuthorityTracker::new(50);
        for _ in 0..5 {
            tracker.record_choice(ResponseChoice::Insist);
        }
        assert_eq!(tracker.value(), 51);
    }

    #[test]
    fn balanced_pattern_builds_authority() {
        let mut tracker = AuthorityTracker::new(50);
        tracker.record_choice(ResponseChoice::Trust);
        tracker.record_choice(ResponseChoice::Insist);
        tracker.record_choice(ResponseChoice::Compromise);
        tracker.record_choice(ResponseChoice::Trust);
        // 2/5 trust = 0.40 sits inside the balanced band.
        assert_eq!(tracker.record_choice(ResponseChoice::Insist), 1);
    }

    #[test]
    fn window_keeps_last_ten() {
        let mut tracker = AuthorityTracker::new(50);
        for _ in 0..10 {
            tracker.record_choice(ResponseChoice::Insist);
        }
        for _ in 0..3 {
            tracker.record_choice(ResponseChoice::Compromise);
        }
        assert_eq!(tracker.recent_choices().count(), 10);
        assert_eq!(
            tracker
                .recent_choices()
                .filter(|choice| *choice == ResponseChoice::Insist)
                .count(),
            7
        );
    }

    #[test]
    fn authority_stays_bounded() {
        let mut tracker = AuthorityTracker::new(3);
        for _ in 0..40 {
            tracker.record_choice(ResponseChoice::Trust);
        }
        assert_eq!(tracker.value(), 0);
        assert_eq!(tracker.modify(500), 100);
        assert_eq!(tracker.value(), 100);
    }

    #[test]
    fn thresholds_fire_once_and_lowest_wins() {
        let mut tracker = AuthorityTracker::new(80);
        tracker.modify(-55);
        let events = tracker.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].threshold, 30);
        assert!(tracker.has_fired(70) && tracker.has_fired(50));

        tracker.modify(60);
        tracker.modify(-60);
        assert!(tracker.drain_events().is_empty());
    }

    #[test]
    fn rising_authority_crosses_nothing() {
        let mut tracker = AuthorityTracker::new(50);
        assert_eq!(tracker.modify(10), 10);
        assert!(tracker.drain_events().is_empty());
        assert!(!tracker.has_fired(70));

        // Starting below 70 never counts as having crossed it.
        tracker.modify(-15);
        let events = tracker.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].threshold, 50);
        assert!(!tracker.has_fired(70));
    }

    #[test]
    fn modifiers_follow_bands() {
        assert_eq!(AuthorityTracker::new(75).obedience_modifier(), 1.10);
        assert_eq!(AuthorityTracker::new(50).obedience_modifier(), 1.0);
        assert_eq!(AuthorityTracker::new(10).obedience_modifier(), 0.90);
        assert_eq!(AuthorityTracker::new(50).severity_modifier(), 1.0);
        assert_eq!(AuthorityTracker::new(10).severity_modifier(), 1.25);

        let mut tracker = AuthorityTracker::new(100);
        for _ in 0..6 {
            tracker.record_choice(ResponseChoice::Trust);
        }
        assert_eq!(tracker.trust_gain_modifier(), 0.5);
    }

    #[test]
    fn choice_parsing_is_lenient() {
        assert_eq!(ResponseChoice::parse(" Insist"), Some(ResponseChoice::Insist));
        assert_eq!(ResponseChoice::parse("bribe"), None);
    }
}
