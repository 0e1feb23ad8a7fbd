//! Evaluates orders into objections and resolves the commander's response.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::alternatives::{propose_alternative, propose_compromise, AlternativePlan};
use crate::authority::{AuthorityTracker, ResponseChoice};
use crate::config::ObjectionConfig;
use crate::facts::BattlefieldFacts;
use crate::marshal::Marshal;
use crate::messages;
use crate::orders::{MarshalId, Order};
use crate::personality::PersonalityCatalog;
use crate::severity::{ObjectionLevel, SeverityBreakdown, SeverityCalculator};
use crate::situation::{classify, Situation};

/// Per-turn state the engine reads and updates. Reset at the turn boundary.
#[derive(Clone, Debug, Serialize)]
pub struct TurnContext {
    turn: u32,
    majors_raised: u8,
    major_cap: u8,
}

impl TurnContext {
    pub fn new(major_cap: u8) -> Self {
        Self {
            turn: 1,
            majors_raised: 0,
            major_cap,
        }
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn majors_raised(&self) -> u8 {
        self.majors_raised
    }

    pub fn cap_reached(&self) -> bool {
        self.majors_raised >= self.major_cap
    }

    fn note_major(&mut self) {
        self.majors_raised = self.majors_raised.saturating_add(1);
    }

    pub fn advance_turn(&mut self) {
        self.turn = self.turn.saturating_add(1);
        self.majors_raised = 0;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectionOption {
    pub choice: ResponseChoice,
    pub description: String,
    /// Preview of the trust change if this option is chosen.
    pub trust_delta: i32,
    pub may_disobey: bool,
}

/// Non-blocking objection: the original order proceeds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MildObjection {
    pub marshal: MarshalId,
    pub situation: Situation,
    pub severity: f32,
    pub message: String,
    /// Set when a major objection was demoted by the per-turn cap.
    pub downgraded: bool,
    pub auto_resolution: Order,
}

/// Blocking objection awaiting the commander's choice.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MajorObjection {
    pub marshal: MarshalId,
    pub situation: Situation,
    pub severity: f32,
    pub message: String,
    pub original: Order,
    pub alternative: AlternativePlan,
    pub compromise: Option<Order>,
    pub options: Vec<ObjectionOption>,
}

impl MajorObjection {
    pub fn option(&self, choice: ResponseChoice) -> Option<&ObjectionOption> {
        self.options.iter().find(|option| option.choice == choice)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum Objection {
    Mild(MildObjection),
    Major(MajorObjection),
}

impl Objection {
    pub fn marshal(&self) -> &MarshalId {
        match self {
            Objection::Mild(mild) => &mild.marshal,
            Objection::Major(major) => &major.marshal,
        }
    }

    pub fn is_major(&self) -> bool {
        matches!(self, Objection::Major(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    AdoptedAlternative,
    Complied,
    Refused,
    AdoptedCompromise,
    /// Unrecognised choice; the original order went ahead untouched.
    OriginalFallback,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ObedienceRoll {
    pub probability: f32,
    pub roll: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolutionOutcome {
    pub marshal: MarshalId,
    pub choice: Option<ResponseChoice>,
    pub disposition: Disposition,
    /// The order that goes to the executor, if any.
    pub executed: Option<Order>,
    pub trust_delta: i32,
    pub trust: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obedience: Option<ObedienceRoll>,
    pub anomaly: bool,
    pub message: String,
}

/// Chance that a marshal complies with an insisted order.
pub fn obedience_probability(trust: i32, authority_modifier: f32) -> f32 {
    let t = trust as f32;
    let base = if trust >= 80 {
        1.0
    } else if trust >= 60 {
        0.90 + 0.005 * (t - 60.0)
    } else if trust >= 40 {
        0.70 + 0.01 * (t - 40.0)
    } else if trust >= 20 {
        0.40 + 0.015 * (t - 20.0)
    } else {
        0.20 + 0.01 * t
    };
    (base * authority_modifier).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct ObjectionEngine {
    calculator: SeverityCalculator,
    config: Arc<ObjectionConfig>,
}

impl ObjectionEngine {
    pub fn new(catalog: Arc<PersonalityCatalog>, config: Arc<ObjectionConfig>) -> Self {
        Self {
            calculator: SeverityCalculator::new(catalog, &config.severity),
            config,
        }
    }

    pub fn calculator(&self) -> &SeverityCalculator {
        &self.calculator
    }

    pub fn config(&self) -> &ObjectionConfig {
        &self.config
    }

    /// Deterministic severity for `order`, with no side effects.
    pub fn preview<F>(
        &self,
        marshal: &Marshal,
        order: &Order,
        facts: &F,
        authority: &AuthorityTracker,
    ) -> SeverityBreakdown
    where
        F: BattlefieldFacts + ?Sized,
    {
        let situation = classify(marshal, order, facts);
        self.calculator.calculate(marshal, situation, authority)
    }

    /// Returns `None` when the marshal carries out the order silently.
    pub fn evaluate<F, R>(
        &self,
        marshal: &Marshal,
        order: &Order,
        facts: &F,
        authority: &AuthorityTracker,
        turn: &mut TurnContext,
        rng: &mut R,
    ) -> Option<Objection>
    where
        F: BattlefieldFacts + ?Sized,
        R: Rng + ?Sized,
    {
        let situation = classify(marshal, order, facts);
        let breakdown =
            self.calculator
                .calculate_with_variance(marshal, situation, authority, rng);
        let level = ObjectionLevel::classify(breakdown.severity, &self.config.severity);
        let situation = match (level, breakdown.situation) {
            (ObjectionLevel::None, _) | (_, None) => {
                tracing::trace!(
                    target: "marshal_command::objection",
                    marshal = %marshal.id,
                    severity = breakdown.severity,
                    "objection.none"
                );
                return None;
            }
            (_, Some(situation)) => situation,
        };

        let catalog = self.calculator.catalog();
        let downgraded = level == ObjectionLevel::Major && turn.cap_reached();

        if level == ObjectionLevel::Mild || downgraded {
            let message = messages::compose(
                catalog,
                marshal.personality,
                ObjectionLevel::Mild,
                &marshal.id,
                order,
                None,
                rng,
            );
            tracing::debug!(
                target: "marshal_command::objection",
                marshal = %marshal.id,
                %situation,
                severity = breakdown.severity,
                downgraded,
                "objection.raised=mild"
            );
            return Some(Objection::Mild(MildObjection {
                marshal: marshal.id.clone(),
                situation,
                severity: breakdown.severity,
                message,
                downgraded,
                auto_resolution: order.clone(),
            }));
        }

        turn.note_major();
        let alternative = propose_alternative(marshal, situation, facts);
        let compromise = propose_compromise(marshal, order, alternative.order(), situation);
        let message = messages::compose(
            catalog,
            marshal.personality,
            ObjectionLevel::Major,
            &marshal.id,
            order,
            Some(alternative.order()),
            rng,
        );
        let options = self.build_options(marshal, order, &alternative, compromise.as_ref());

        tracing::info!(
            target: "marshal_command::objection",
            marshal = %marshal.id,
            %situation,
            severity = breakdown.severity,
            trust = marshal.trust.value(),
            majors_this_turn = turn.majors_raised(),
            "objection.raised=major"
        );

        Some(Objection::Major(MajorObjection {
            marshal: marshal.id.clone(),
            situation,
            severity: breakdown.severity,
            message,
            original: order.clone(),
            alternative,
            compromise,
            options,
        }))
    }

    fn build_options(
        &self,
        marshal: &Marshal,
        original: &Order,
        alternative: &AlternativePlan,
        compromise: Option<&Order>,
    ) -> Vec<ObjectionOption> {
        let deltas = &self.config.resolution;
        let mut options = vec![
            ObjectionOption {
                choice: ResponseChoice::Trust,
                description: format!(
                    "Trust {}: {} instead",
                    marshal.id,
                    alternative.order().describe()
                ),
                trust_delta: deltas.trust_gain,
                may_disobey: false,
            },
            ObjectionOption {
                choice: ResponseChoice::Insist,
                description: format!("Insist: {} as ordered", original.describe()),
                trust_delta: deltas.insist_comply_penalty,
                may_disobey: marshal.trust.value() < deltas.disobey_warning_trust,
            },
        ];
        if let Some(compromise) = compromise {
            options.push(ObjectionOption {
                choice: ResponseChoice::Compromise,
                description: format!("Compromise: {}", compromise.describe()),
                trust_delta: deltas.compromise_gain,
                may_disobey: false,
            });
        }
        options
    }

    /// Applies the commander's `choice` to an open major objection.
    ///
    /// Unrecognised choices, including a compromise when none was offered, let
    /// the original order proceed with no trust change and flag an anomaly.
    pub fn resolve<R>(
        &self,
        marshal: &mut Marshal,
        objection: &MajorObjection,
        choice: &str,
        authority: &mut AuthorityTracker,
        rng: &mut R,
    ) -> ResolutionOutcome
    where
        R: Rng + ?Sized,
    {
        let deltas = &self.config.resolution;
        let parsed = ResponseChoice::parse(choice)
            .filter(|choice| *choice != ResponseChoice::Compromise || objection.compromise.is_some());

        let Some(parsed) = parsed else {
            tracing::warn!(
                target: "marshal_command::objection",
                marshal = %marshal.id,
                choice,
                "objection.resolve_anomaly"
            );
            return ResolutionOutcome {
                marshal: marshal.id.clone(),
                choice: None,
                disposition: Disposition::OriginalFallback,
                executed: Some(objection.original.clone()),
                trust_delta: 0,
                trust: marshal.trust.value(),
                obedience: None,
                anomaly: true,
                message: format!(
                    "No clear answer reached {}; the order to {} stands.",
                    marshal.id,
                    objection.original.describe()
                ),
            };
        };

        let (disposition, executed, requested, obedience, message) = match parsed {
            ResponseChoice::Trust => (
                Disposition::AdoptedAlternative,
                Some(objection.alternative.order().clone()),
                deltas.trust_gain,
                None,
                format!(
                    "{} will {} as proposed.",
                    marshal.id,
                    objection.alternative.order().describe()
                ),
            ),
            ResponseChoice::Compromise => {
                let compromise = objection.compromise.clone();
                let message = compromise
                    .as_ref()
                    .map(|order| format!("{} agrees to {}.", marshal.id, order.describe()))
                    .unwrap_or_default();
                (
                    Disposition::AdoptedCompromise,
                    compromise,
                    deltas.compromise_gain,
                    None,
                    message,
                )
            }
            ResponseChoice::Insist => {
                let probability =
                    obedience_probability(marshal.trust.value(), authority.obedience_modifier());
                let roll: f32 = rng.gen();
                let obedience = Some(ObedienceRoll { probability, roll });
                if roll < probability {
                    (
                        Disposition::Complied,
                        Some(objection.original.clone()),
                        deltas.insist_comply_penalty,
                        obedience,
                        format!(
                            "{} complies, under protest, and will {}.",
                            marshal.id,
                            objection.original.describe()
                        ),
                    )
                } else {
                    (
                        Disposition::Refused,
                        None,
                        deltas.insist_refuse_penalty,
                        obedience,
                        format!("{} refuses the order outright.", marshal.id),
                    )
                }
            }
        };

        let trust_delta = marshal.trust.modify(requested);
        marshal.record_override(parsed == ResponseChoice::Insist);
        authority.record_choice(parsed);

        tracing::info!(
            target: "marshal_command::objection",
            marshal = %marshal.id,
            choice = %parsed,
            ?disposition,
            trust_delta,
            trust = marshal.trust.value(),
            "objection.resolved"
        );

        ResolutionOutcome {
            marshal: marshal.id.clone(),
            choice: Some(parsed),
            disposition,
            executed,
            trust_delta,
            trust: marshal.trust.value(),
            obedience,
            anomaly: false,
            message,
        }
    }
}
