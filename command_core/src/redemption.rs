//! Forced resolution once a marshal's trust has collapsed.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::authority::AuthorityTracker;
use crate::config::RedemptionTuning;
use crate::facts::BattlefieldFacts;
use crate::marshal::{Marshal, MarshalRole, Roster};
use crate::orders::MarshalId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionChoice {
    GrantAutonomy,
    AdministrativeRole,
    Dismiss,
}

impl RedemptionChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            RedemptionChoice::GrantAutonomy => "grant_autonomy",
            RedemptionChoice::AdministrativeRole => "administrative_role",
            RedemptionChoice::Dismiss => "dismiss",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grant_autonomy" | "autonomy" => Some(RedemptionChoice::GrantAutonomy),
            "administrative_role" | "administrative" | "staff" => {
                Some(RedemptionChoice::AdministrativeRole)
            }
            "dismiss" => Some(RedemptionChoice::Dismiss),
            _ => None,
        }
    }
}

impl fmt::Display for RedemptionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedemptionOption {
    pub choice: RedemptionChoice,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedemptionEvent {
    pub marshal: MarshalId,
    pub trust: i32,
    pub message: String,
    pub options: Vec<RedemptionOption>,
}

impl RedemptionEvent {
    pub fn new(marshal: &Marshal, roster: &Roster, tuning: &RedemptionTuning) -> Self {
        let options = eligible_choices(roster)
            .into_iter()
            .map(|choice| RedemptionOption {
                choice,
                description: describe_choice(choice, &marshal.id, tuning),
            })
            .collect();
        Self {
            marshal: marshal.id.clone(),
            trust: marshal.trust.value(),
            message: format!(
                "{} no longer trusts your command. Something must change.",
                marshal.id
            ),
            options,
        }
    }

    pub fn offers(&self, choice: RedemptionChoice) -> bool {
        self.options.iter().any(|option| option.choice == choice)
    }
}

fn describe_choice(choice: RedemptionChoice, marshal: &MarshalId, tuning: &RedemptionTuning) -> String {
    match choice {
        RedemptionChoice::GrantAutonomy => format!(
            "Let {marshal} act independently for {} turns",
            tuning.autonomy_turns
        ),
        RedemptionChoice::AdministrativeRole => {
            format!("Reassign {marshal} to the general staff (+1 action per turn)")
        }
        RedemptionChoice::Dismiss => format!(
            "Dismiss {marshal} (+{} authority)",
            tuning.dismiss_authority_bonus
        ),
    }
}

/// Trust has just collapsed for a field marshal under direct command.
///
/// One event per collapse: after it fires, nothing new opens until [`rearm`]
/// has seen trust recover above the threshold.
pub fn should_trigger(marshal: &Marshal, tuning: &RedemptionTuning) -> bool {
    marshal.trust.value() <= tuning.trust_threshold
        && !marshal.redemption_pending
        && !marshal.redemption_spent
        && marshal.is_field()
        && !marshal.is_autonomous()
}

/// Clears the collapse latch once trust is back above the threshold. Returns true if it re-armed.
pub fn rearm(marshal: &mut Marshal, tuning: &RedemptionTuning) -> bool {
    if marshal.redemption_spent && marshal.trust.value() > tuning.trust_threshold {
        marshal.redemption_spent = false;
        return true;
    }
    false
}

/// Choices open right now. Autonomy is always available.
pub fn eligible_choices(roster: &Roster) -> Vec<RedemptionChoice> {
    let field = roster.field_count();
    let mut choices = vec![RedemptionChoice::GrantAutonomy];
    if field >= 2 && roster.administrative_holder().is_none() {
        choices.push(RedemptionChoice::AdministrativeRole);
    }
    if field >= 2 {
        choices.push(RedemptionChoice::Dismiss);
    }
    choices
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum RedemptionEffect {
    Autonomy {
        turns: u8,
    },
    Administrative {
        stored_strength: u32,
        bonus_actions: u8,
    },
    Dismissed {
        transferred_to: Option<MarshalId>,
        strength: u32,
        authority_delta: i32,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedemptionOutcome {
    pub marshal: MarshalId,
    pub choice: RedemptionChoice,
    pub effect: RedemptionEffect,
    pub message: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedemptionError {
    #[error("marshal {0} is not registered")]
    UnknownMarshal(MarshalId),
    #[error("no redemption event is pending for {0}")]
    NotPending(MarshalId),
    #[error("unknown redemption choice '{0}'")]
    UnknownChoice(String),
    #[error("'{choice}' is not available for {marshal}")]
    IneligibleChoice {
        marshal: MarshalId,
        choice: RedemptionChoice,
    },
    #[error("marshal {0} is not serving in an administrative role")]
    NotAdministrative(MarshalId),
}

/// Applies `choice` to `marshal`, re-checking eligibility against the current roster.
pub fn apply_choice<F>(
    roster: &mut Roster,
    authority: &mut AuthorityTracker,
    marshal_id: &MarshalId,
    choice: RedemptionChoice,
    facts: &F,
    tuning: &RedemptionTuning,
) -> Result<RedemptionOutcome, RedemptionError>
where
    F: BattlefieldFacts + ?Sized,
{
    if roster.get(marshal_id).is_none() {
        return Err(RedemptionError::UnknownMarshal(marshal_id.clone()));
    }
    if !eligible_choices(roster).contains(&choice) {
        return Err(RedemptionError::IneligibleChoice {
            marshal: marshal_id.clone(),
            choice,
        });
    }

    let (effect, message) = match choice {
        RedemptionChoice::GrantAutonomy => {
            let marshal = roster
                .get_mut(marshal_id)
                .ok_or_else(|| RedemptionError::UnknownMarshal(marshal_id.clone()))?;
            marshal.autonomy_turns = Some(tuning.autonomy_turns);
            marshal.reset_performance();
            marshal.redemption_pending = false;
            (
                RedemptionEffect::Autonomy {
                    turns: tuning.autonomy_turns,
                },
                format!(
                    "{marshal_id} will act independently for {} turns.",
                    tuning.autonomy_turns
                ),
            )
        }
        RedemptionChoice::AdministrativeRole => {
            let marshal = roster
                .get_mut(marshal_id)
                .ok_or_else(|| RedemptionError::UnknownMarshal(marshal_id.clone()))?;
            let stored_strength = std::mem::take(&mut marshal.strength);
            marshal.role = MarshalRole::Administrative {
                stored_strength,
                stored_location: marshal.location.take(),
            };
            marshal.redemption_pending = false;
            (
                RedemptionEffect::Administrative {
                    stored_strength,
                    bonus_actions: 1,
                },
                format!("{marshal_id} takes up a post on the general staff."),
            )
        }
        RedemptionChoice::Dismiss => {
            let recipient = nearest_ally(roster, marshal_id, facts, tuning.transfer_radius);
            let dismissed = roster
                .remove(marshal_id)
                .ok_or_else(|| RedemptionError::UnknownMarshal(marshal_id.clone()))?;
            let strength = dismissed.strength;
            let transferred_to = recipient.and_then(|id| {
                let ally = roster.get_mut(&id)?;
                ally.strength = ally.strength.saturating_add(strength);
                Some(id)
            });
            let authority_delta = authority.modify(tuning.dismiss_authority_bonus);
            let message = match &transferred_to {
                Some(ally) => format!("{marshal_id} is dismissed. {ally} absorbs the command."),
                None => format!("{marshal_id} is dismissed. The command is disbanded."),
            };
            (
                RedemptionEffect::Dismissed {
                    transferred_to,
                    strength,
                    authority_delta,
                },
                message,
            )
        }
    };

    tracing::info!(
        target: "marshal_command::redemption",
        marshal = %marshal_id,
        %choice,
        "redemption.resolved"
    );

    Ok(RedemptionOutcome {
        marshal: marshal_id.clone(),
        choice,
        effect,
        message,
    })
}

/// Closest field marshal within `radius` hops; ties go to the lowest id.
fn nearest_ally<F>(
    roster: &Roster,
    marshal_id: &MarshalId,
    facts: &F,
    radius: u32,
) -> Option<MarshalId>
where
    F: BattlefieldFacts + ?Sized,
{
    let origin = roster.get(marshal_id)?.location.as_ref()?;
    roster
        .iter()
        .filter(|ally| &ally.id != marshal_id && ally.is_field())
        .filter_map(|ally| {
            let location = ally.location.as_ref()?;
            let hops = facts.distance(origin, location)?;
            (hops <= radius).then(|| (hops, ally.id.clone()))
        })
        .min()
        .map(|(_, id)| id)
}

/// Returns a staff marshal to the field with the command parked on reassignment.
pub fn restore_from_administration(
    roster: &mut Roster,
    marshal_id: &MarshalId,
) -> Result<u32, RedemptionError> {
    let marshal = roster
        .get_mut(marshal_id)
        .ok_or_else(|| RedemptionError::UnknownMarshal(marshal_id.clone()))?;
    let MarshalRole::Administrative {
        stored_strength,
        stored_location,
    } = std::mem::replace(&mut marshal.role, MarshalRole::Field)
    else {
        return Err(RedemptionError::NotAdministrative(marshal_id.clone()));
    };
    marshal.strength = stored_strength;
    marshal.location = stored_location;
    Ok(stored_strength)
}
