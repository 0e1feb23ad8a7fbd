//! Retrospective credit or blame once a battle settles who was right.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::authority::{AuthorityTracker, ResponseChoice};
use crate::marshal::{BattleResult, Marshal};
use crate::orders::{MarshalId, Order};

/// The last objection decision awaiting a battle result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingVindication {
    pub choice: ResponseChoice,
    pub original: Order,
    pub alternative: Order,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VindicationOutcome {
    pub marshal: MarshalId,
    pub choice: ResponseChoice,
    pub result: BattleResult,
    pub vindication_delta: i32,
    pub trust_delta: i32,
    pub authority_delta: i32,
    pub message: String,
}

/// Raw (vindication, trust, authority) deltas before clamping and gain scaling.
pub fn vindication_effect(choice: ResponseChoice, result: BattleResult) -> (i32, i32, i32) {
    use BattleResult::*;
    use ResponseChoice::*;

    match (choice, result) {
        (Trust, Victory) => (1, 3, 0),
        (Trust, Defeat) => (-1, 0, 0),
        (Trust, Draw) => (0, 1, 0),
        (Insist, Victory) => (-1, 0, 5),
        (Insist, Defeat) => (1, -5, -5),
        (Insist, Draw) => (0, -1, 0),
        (Compromise, Victory) => (0, 3, 2),
        (Compromise, Defeat) => (0, -2, -2),
        (Compromise, Draw) => (0, 0, 0),
    }
}

fn outcome_message(marshal: &MarshalId, choice: ResponseChoice, result: BattleResult) -> String {
    use BattleResult::*;
    use ResponseChoice::*;

    match (choice, result) {
        (Trust, Victory) => format!("{marshal}'s judgment is vindicated on the field."),
        (Trust, Defeat) => format!("{marshal}'s plan failed, and the staff took note."),
        (Insist, Victory) => format!("Your order carried the day. {marshal} concedes the point."),
        (Insist, Defeat) => {
            format!("{marshal} was right to object. The defeat is laid at your door.")
        }
        (Compromise, Victory) => format!("The compromise with {marshal} paid off."),
        (Compromise, Defeat) => format!("The half-measure agreed with {marshal} failed."),
        (_, Draw) => format!("The battle proves nothing either way for {marshal}."),
    }
}

/// One pending decision per marshal; a later decision replaces an earlier one.
#[derive(Clone, Debug, Default)]
pub struct VindicationTracker {
    pending: BTreeMap<MarshalId, PendingVindication>,
}

impl VindicationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_choice(
        &mut self,
        marshal: MarshalId,
        choice: ResponseChoice,
        original: Order,
        alternative: Order,
    ) {
        self.pending.insert(
            marshal,
            PendingVindication {
                choice,
                original,
                alternative,
            },
        );
    }

    pub fn has_pending(&self, marshal: &MarshalId) -> bool {
        self.pending.contains_key(marshal)
    }

    pub fn pending(&self, marshal: &MarshalId) -> Option<&PendingVindication> {
        self.pending.get(marshal)
    }

    pub fn forget(&mut self, marshal: &MarshalId) {
        self.pending.remove(marshal);
    }

    pub fn clear_all(&mut self) {
        self.pending.clear();
    }

    /// Consumes the pending decision for `marshal` and applies credit or blame.
    ///
    /// Returns `None` and touches nothing when no decision is pending. Battle
    /// history is the caller's to record.
    pub fn resolve_battle(
        &mut self,
        marshal: &mut Marshal,
        authority: &mut AuthorityTracker,
        result: BattleResult,
    ) -> Option<VindicationOutcome> {
        let pending = self.pending.remove(&marshal.id)?;
        let (vindication, trust, authority_delta) = vindication_effect(pending.choice, result);

        let trust = if trust > 0 {
            (trust as f32 * authority.trust_gain_modifier()).round() as i32
        } else {
            trust
        };

        let outcome = VindicationOutcome {
            marshal: marshal.id.clone(),
            choice: pending.choice,
            result,
            vindication_delta: marshal.adjust_vindication(vindication),
            trust_delta: marshal.trust.modify(trust),
            authority_delta: authority.modify(authority_delta),
            message: outcome_message(&marshal.id, pending.choice, result),
        };

        tracing::debug!(
            target: "marshal_command::vindication",
            marshal = %outcome.marshal,
            choice = %outcome.choice,
            result = result.as_str(),
            vindication = marshal.vindication(),
            trust = marshal.trust.value(),
            "vindication.resolved"
        );
        Some(outcome)
    }
}
