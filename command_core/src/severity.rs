use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::authority::AuthorityTracker;
use crate::config::SeverityBands;
use crate::marshal::{BattleResult, Marshal};
use crate::personality::PersonalityCatalog;
use crate::situation::Situation;

/// Classification of a severity score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectionLevel {
    None,
    Mild,
    Major,
}

impl ObjectionLevel {
    pub fn classify(severity: f32, bands: &SeverityBands) -> Self {
        if severity < bands.mild_threshold {
            ObjectionLevel::None
        } else if severity < bands.major_threshold {
            ObjectionLevel::Mild
        } else {
            ObjectionLevel::Major
        }
    }
}

/// Every factor that went into a severity score, for logging and previews.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeverityBreakdown {
    pub situation: Option<Situation>,
    pub base: f32,
    pub trust: f32,
    pub vindication: f32,
    pub performance: f32,
    pub overrides: f32,
    pub authority: f32,
    pub variance: f32,
    pub severity: f32,
}

impl SeverityBreakdown {
    fn untriggered(situation: Option<Situation>) -> Self {
        Self {
            situation,
            base: 0.0,
            trust: 1.0,
            vindication: 1.0,
            performance: 1.0,
            overrides: 1.0,
            authority: 1.0,
            variance: 0.0,
            severity: 0.0,
        }
    }
}

pub fn trust_modifier(trust: i32) -> f32 {
    match trust {
        t if t >= 80 => 0.7,
        t if t >= 40 => 1.0,
        t if t >= 20 => 1.3,
        _ => 1.6,
    }
}

pub fn vindication_modifier(vindication: i32) -> f32 {
    match vindication {
        v if v <= -2 => 0.85,
        v if v <= 2 => 1.0,
        _ => 1.15,
    }
}

/// Two wins in the last three battles calm a marshal; two losses sour the mood.
pub fn performance_modifier(recent: impl IntoIterator<Item = BattleResult>) -> f32 {
    let recent: Vec<_> = recent.into_iter().collect();
    let window = &recent[recent.len().saturating_sub(3)..];
    let wins = window
        .iter()
        .filter(|result| **result == BattleResult::Victory)
        .count();
    let losses = window
        .iter()
        .filter(|result| **result == BattleResult::Defeat)
        .count();
    if wins >= 2 {
        0.85
    } else if losses >= 2 {
        1.15
    } else {
        1.0
    }
}

pub fn override_modifier(recent: impl IntoIterator<Item = bool>) -> f32 {
    let recent: Vec<_> = recent.into_iter().collect();
    let window = &recent[recent.len().saturating_sub(5)..];
    match window.iter().filter(|overridden| **overridden).count() {
        n if n >= 4 => 1.3,
        n if n >= 2 => 1.1,
        _ => 1.0,
    }
}

/// Half-width of the uniform noise band for a pre-variance score.
pub fn variance_band(severity: f32) -> f32 {
    if severity < 0.20 {
        0.0
    } else if severity < 0.35 {
        0.03
    } else if severity < 0.60 {
        0.08
    } else {
        0.12
    }
}

/// Combines the personality base with the marshal's standing and the commander's authority.
#[derive(Debug, Clone)]
pub struct SeverityCalculator {
    catalog: Arc<PersonalityCatalog>,
    ceiling: f32,
}

impl SeverityCalculator {
    pub fn new(catalog: Arc<PersonalityCatalog>, bands: &SeverityBands) -> Self {
        Self {
            catalog,
            ceiling: bands.ceiling,
        }
    }

    pub fn catalog(&self) -> &PersonalityCatalog {
        &self.catalog
    }

    /// Deterministic severity: no variance is applied.
    pub fn calculate(
        &self,
        marshal: &Marshal,
        situation: Option<Situation>,
        authority: &AuthorityTracker,
    ) -> SeverityBreakdown {
        self.compose(marshal, situation, authority, |_| 0.0)
    }

    pub fn calculate_with_variance<R: Rng + ?Sized>(
        &self,
        marshal: &Marshal,
        situation: Option<Situation>,
        authority: &AuthorityTracker,
        rng: &mut R,
    ) -> SeverityBreakdown {
        self.compose(marshal, situation, authority, |pre| {
            let band = variance_band(pre);
            if band > 0.0 {
                rng.gen_range(-band..=band)
            } else {
                0.0
            }
        })
    }

    fn compose(
        &self,
        marshal: &Marshal,
        situation: Option<Situation>,
        authority: &AuthorityTracker,
        variance: impl FnOnce(f32) -> f32,
    ) -> SeverityBreakdown {
        let Some(base) =
            situation.and_then(|key| self.catalog.base_severity(marshal.personality, key))
        else {
            return SeverityBreakdown::untriggered(situation);
        };

        let trust = trust_modifier(marshal.trust.value());
        let vindication = vindication_modifier(marshal.vindication());
        let performance = performance_modifier(marshal.recent_battles());
        let overrides = override_modifier(marshal.recent_overrides());
        let authority = authority.severity_modifier();

        let pre_variance = base * trust * vindication * performance * overrides * authority;
        let variance = variance(pre_variance);
        let severity = (pre_variance + variance).clamp(0.0, self.ceiling);

        SeverityBreakdown {
            situation,
            base,
            trust,
            vindication,
            performance,
            overrides,
            authority,
            variance,
            severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeverityBands;
    use crate::marshal::Personality;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn calculator() -> SeverityCalculator {
        SeverityCalculator::new(PersonalityCatalog::builtin(), &SeverityBands::default())
    }

    #[test]
    fn missing_entry_means_zero() {
        let calc = calculator();
        let ney = Marshal::new("ney", Personality::Aggressive, 90);
        let authority = AuthorityTracker::default();
        let breakdown = calc.calculate(&ney, Some(Situation::AttackOutnumbered), &authority);
        assert_eq!(breakdown.severity, 0.0);
        assert_eq!(calc.calculate(&ney, None, &authority).severity, 0.0);
    }

    #[test]
    fn aggressive_defend_at_forty_trust_is_major() {
        let calc = calculator();
        let ney = Marshal::new("ney", Personality::Aggressive, 40);
        let breakdown = calc.calculate(&ney, Some(Situation::Defend), &AuthorityTracker::default());
        assert!((breakdown.severity - 0.60).abs() < 1e-6);
        assert_eq!(
            ObjectionLevel::classify(breakdown.severity, &SeverityBands::default()),
            ObjectionLevel::Major
        );
    }

    #[test]
    fn modifiers_compound_and_clamp() {
        let calc = calculator();
        let mut davout = Marshal::new("davout", Personality::Cautious, 10);
        for _ in 0..3 {
            davout.adjust_vindication(1);
        }
        for _ in 0..4 {
            davout.record_override(true);
        }
        let low_authority = AuthorityTracker::new(10);
        let breakdown = calc.calculate(
            &davout,
            Some(Situation::AttackOutnumberedSevere),
            &low_authority,
        );
        assert_eq!(breakdown.trust, 1.6);
        assert_eq!(breakdown.vindication, 1.15);
        assert_eq!(breakdown.overrides, 1.3);
        assert_eq!(breakdown.authority, 1.25);
        assert_eq!(breakdown.severity, 0.95);
    }

    #[test]
    fn performance_counts_last_three() {
        use BattleResult::*;
        assert_eq!(performance_modifier([Victory, Victory, Defeat]), 0.85);
        assert_eq!(performance_modifier([Defeat, Draw, Defeat]), 1.15);
        assert_eq!(performance_modifier([Victory, Victory, Defeat, Defeat, Draw]), 1.0);
        assert_eq!(performance_modifier([]), 1.0);
    }

    #[test]
    fn override_counts_last_five() {
        assert_eq!(override_modifier([true, true, true, true]), 1.3);
        assert_eq!(override_modifier([true, false, true]), 1.1);
        assert_eq!(
            override_modifier([true, true, true, false, false, false, false]),
            1.1
        );
        assert_eq!(override_modifier([false, true]), 1.0);
    }

    #[test]
    fn step_modifiers_follow_bands() {
        assert_eq!(trust_modifier(80), 0.7);
        assert_eq!(trust_modifier(79), 1.0);
        assert_eq!(trust_modifier(20), 1.3);
        assert_eq!(trust_modifier(19), 1.6);
        assert_eq!(vindication_modifier(-2), 0.85);
        assert_eq!(vindication_modifier(2), 1.0);
        assert_eq!(vindication_modifier(3), 1.15);
    }

    #[test]
    fn variance_stays_inside_band() {
        let calc = calculator();
        let ney = Marshal::new("ney", Personality::Aggressive, 40);
        let authority = AuthorityTracker::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            let breakdown =
                calc.calculate_with_variance(&ney, Some(Situation::Defend), &authority, &mut rng);
            assert!(breakdown.variance.abs() <= 0.12 + f32::EPSILON);
            assert!((0.0..=0.95).contains(&breakdown.severity));
        }
    }

    #[test]
    fn low_scores_get_no_noise() {
        let calc = calculator();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let ney = Marshal::new("ney", Personality::Aggressive, 90);
        let breakdown = calc.calculate_with_variance(
            &ney,
            Some(Situation::Defend),
            &AuthorityTracker::default(),
            &mut rng,
        );
        // 0.60 * 0.7 = 0.42 sits in the +-0.08 band.
        assert!(breakdown.variance.abs() <= 0.08 + f32::EPSILON);
        assert_eq!(variance_band(0.19), 0.0);
    }
}
