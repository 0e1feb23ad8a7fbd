//! Game-facing facade that owns every piece of negotiation state.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

use crate::authority::{AuthorityEvent, AuthorityTracker};
use crate::config::{BlockingPolicy, ObjectionConfig};
use crate::facts::BattlefieldFacts;
use crate::hashing::seed_from_label;
use crate::marshal::{BattleResult, Marshal, Roster};
use crate::objection::{MajorObjection, Objection, ObjectionEngine, ResolutionOutcome, TurnContext};
use crate::orders::{MarshalId, Order, OrderError};
use crate::personality::PersonalityCatalog;
use crate::redemption::{
    self, RedemptionChoice, RedemptionEffect, RedemptionError, RedemptionEvent, RedemptionOutcome,
};
use crate::severity::SeverityBreakdown;
use crate::vindication::{VindicationOutcome, VindicationTracker};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("marshal {0} is not registered")]
    UnknownMarshal(MarshalId),
    #[error("no open objection from {0}")]
    NoOpenObjection(MarshalId),
}

/// Outcome of an objection resolution, plus a redemption event if trust collapsed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resolution {
    #[serde(flatten)]
    pub outcome: ResolutionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redemption: Option<RedemptionEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BattleReport {
    pub marshal: MarshalId,
    pub result: BattleResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vindication: Option<VindicationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redemption: Option<RedemptionEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnSummary {
    pub turn: u32,
    /// Marshals whose autonomy window closed at this boundary.
    pub autonomy_ended: Vec<MarshalId>,
}

pub struct CommandSession<R: Rng = ChaCha8Rng> {
    config: Arc<ObjectionConfig>,
    engine: ObjectionEngine,
    roster: Roster,
    authority: AuthorityTracker,
    turn: TurnContext,
    open: BTreeMap<MarshalId, MajorObjection>,
    redemptions: BTreeMap<MarshalId, RedemptionEvent>,
    vindication: VindicationTracker,
    bonus_actions: u8,
    rng: R,
}

impl CommandSession<ChaCha8Rng> {
    pub fn new(
        roster: Roster,
        catalog: Arc<PersonalityCatalog>,
        config: Arc<ObjectionConfig>,
        seed: u64,
    ) -> Self {
        Self::with_rng(roster, catalog, config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Seeds the session from a campaign name so a replay of the same campaign matches.
    pub fn for_campaign(
        label: &str,
        roster: Roster,
        catalog: Arc<PersonalityCatalog>,
        config: Arc<ObjectionConfig>,
    ) -> Self {
        Self::new(roster, catalog, config, seed_from_label(label))
    }
}

impl<R: Rng> CommandSession<R> {
    pub fn with_rng(
        roster: Roster,
        catalog: Arc<PersonalityCatalog>,
        config: Arc<ObjectionConfig>,
        rng: R,
    ) -> Self {
        Self {
            engine: ObjectionEngine::new(catalog, Arc::clone(&config)),
            authority: AuthorityTracker::new(config.defaults.initial_authority),
            turn: TurnContext::new(config.turn.major_objections_per_turn),
            config,
            roster,
            open: BTreeMap::new(),
            redemptions: BTreeMap::new(),
            vindication: VindicationTracker::new(),
            bonus_actions: 0,
            rng,
        }
    }

    pub fn config(&self) -> &ObjectionConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn marshal(&self, id: &MarshalId) -> Option<&Marshal> {
        self.roster.get(id)
    }

    /// World-layer updates (position, strength, scripted trust shifts).
    pub fn marshal_mut(&mut self, id: &MarshalId) -> Option<&mut Marshal> {
        self.roster.get_mut(id)
    }

    pub fn authority(&self) -> &AuthorityTracker {
        &self.authority
    }

    pub fn turn(&self) -> &TurnContext {
        &self.turn
    }

    pub fn bonus_actions(&self) -> u8 {
        self.bonus_actions
    }

    pub fn vindication(&self) -> &VindicationTracker {
        &self.vindication
    }

    pub fn open_objection(&self, id: &MarshalId) -> Option<&MajorObjection> {
        self.open.get(id)
    }

    pub fn open_objections(&self) -> impl Iterator<Item = &MajorObjection> {
        self.open.values()
    }

    pub fn pending_redemption(&self, id: &MarshalId) -> Option<&RedemptionEvent> {
        self.redemptions.get(id)
    }

    pub fn pending_redemptions(&self) -> impl Iterator<Item = &RedemptionEvent> {
        self.redemptions.values()
    }

    pub fn drain_authority_events(&mut self) -> Vec<AuthorityEvent> {
        self.authority.drain_events()
    }

    fn validate(&self, id: &MarshalId, order: &Order) -> Result<(), OrderError> {
        order.validate()?;
        let marshal = self
            .roster
            .get(id)
            .ok_or_else(|| OrderError::UnknownMarshal(id.clone()))?;
        if !marshal.is_field() {
            return Err(OrderError::NotInField(id.clone()));
        }
        if marshal.is_autonomous() {
            return Err(OrderError::Autonomous(id.clone()));
        }
        if self.open.contains_key(id) {
            return Err(OrderError::AwaitingChoice(id.clone()));
        }
        if self.config.turn.blocking == BlockingPolicy::Global {
            if let Some(holder) = self.open.keys().next() {
                return Err(OrderError::BlockedByObjection(holder.clone()));
            }
        }
        Ok(())
    }

    /// Evaluates an order. `Ok(None)` means the marshal carries it out without comment.
    pub fn issue_order<F>(
        &mut self,
        id: &MarshalId,
        order: Order,
        facts: &F,
    ) -> Result<Option<Objection>, OrderError>
    where
        F: BattlefieldFacts + ?Sized,
    {
        if let Err(err) = self.validate(id, &order) {
            tracing::debug!(
                target: "marshal_command::session",
                marshal = %id,
                error = %err,
                "order.rejected"
            );
            return Err(err);
        }
        let marshal = self
            .roster
            .get(id)
            .ok_or_else(|| OrderError::UnknownMarshal(id.clone()))?;

        let objection = self.engine.evaluate(
            marshal,
            &order,
            facts,
            &self.authority,
            &mut self.turn,
            &mut self.rng,
        );
        if let Some(Objection::Major(major)) = &objection {
            self.open.insert(id.clone(), major.clone());
        }
        Ok(objection)
    }

    /// Deterministic severity preview; nothing is recorded.
    pub fn preview_severity<F>(
        &self,
        id: &MarshalId,
        order: &Order,
        facts: &F,
    ) -> Result<SeverityBreakdown, OrderError>
    where
        F: BattlefieldFacts + ?Sized,
    {
        order.validate()?;
        let marshal = self
            .roster
            .get(id)
            .ok_or_else(|| OrderError::UnknownMarshal(id.clone()))?;
        Ok(self.engine.preview(marshal, order, facts, &self.authority))
    }

    pub fn resolve_objection(
        &mut self,
        id: &MarshalId,
        choice: &str,
    ) -> Result<Resolution, ResolveError> {
        if self.roster.get(id).is_none() {
            return Err(ResolveError::UnknownMarshal(id.clone()));
        }
        let objection = self
            .open
            .remove(id)
            .ok_or_else(|| ResolveError::NoOpenObjection(id.clone()))?;
        let marshal = self
            .roster
            .get_mut(id)
            .ok_or_else(|| ResolveError::UnknownMarshal(id.clone()))?;

        let outcome = self.engine.resolve(
            marshal,
            &objection,
            choice,
            &mut self.authority,
            &mut self.rng,
        );
        if let Some(choice) = outcome.choice {
            self.vindication.record_choice(
                id.clone(),
                choice,
                objection.original,
                objection.alternative.into_order(),
            );
        }
        let redemption = self.check_redemption(id);
        Ok(Resolution {
            outcome,
            redemption,
        })
    }

    /// Opens a redemption event for `id` the first time trust collapses.
    ///
    /// A resolved event does not re-open until trust has recovered above the
    /// threshold and fallen again.
    pub fn check_redemption(&mut self, id: &MarshalId) -> Option<RedemptionEvent> {
        let tuning = &self.config.redemption;
        let marshal = self.roster.get_mut(id)?;
        if redemption::rearm(marshal, tuning) {
            tracing::debug!(
                target: "marshal_command::redemption",
                marshal = %id,
                trust = marshal.trust.value(),
                "redemption.rearmed"
            );
        }
        if !redemption::should_trigger(marshal, tuning) {
            return None;
        }
        marshal.redemption_pending = true;
        marshal.redemption_spent = true;

        let marshal = self.roster.get(id)?;
        let event = RedemptionEvent::new(marshal, &self.roster, &self.config.redemption);
        tracing::info!(
            target: "marshal_command::redemption",
            marshal = %id,
            trust = event.trust,
            options = event.options.len(),
            "redemption.triggered"
        );
        self.redemptions.insert(id.clone(), event.clone());
        Some(event)
    }

    pub fn resolve_redemption<F>(
        &mut self,
        id: &MarshalId,
        choice: &str,
        facts: &F,
    ) -> Result<RedemptionOutcome, RedemptionError>
    where
        F: BattlefieldFacts + ?Sized,
    {
        if !self.redemptions.contains_key(id) {
            return Err(RedemptionError::NotPending(id.clone()));
        }
        let choice = RedemptionChoice::parse(choice)
            .ok_or_else(|| RedemptionError::UnknownChoice(choice.to_string()))?;

        let outcome = redemption::apply_choice(
            &mut self.roster,
            &mut self.authority,
            id,
            choice,
            facts,
            &self.config.redemption,
        )?;
        self.redemptions.remove(id);

        match &outcome.effect {
            RedemptionEffect::Administrative { bonus_actions, .. } => {
                self.bonus_actions = self.bonus_actions.saturating_add(*bonus_actions);
            }
            RedemptionEffect::Dismissed { .. } => {
                self.open.remove(id);
                self.vindication.forget(id);
            }
            RedemptionEffect::Autonomy { .. } => {}
        }
        Ok(outcome)
    }

    pub fn restore_from_administration(&mut self, id: &MarshalId) -> Result<u32, RedemptionError> {
        let strength = redemption::restore_from_administration(&mut self.roster, id)?;
        self.bonus_actions = self.bonus_actions.saturating_sub(1);
        tracing::info!(
            target: "marshal_command::session",
            marshal = %id,
            strength,
            "administration.restored"
        );
        Ok(strength)
    }

    /// Records a battle and settles any pending vindication for the marshal.
    pub fn report_battle(
        &mut self,
        id: &MarshalId,
        result: BattleResult,
    ) -> Result<BattleReport, OrderError> {
        let marshal = self
            .roster
            .get_mut(id)
            .ok_or_else(|| OrderError::UnknownMarshal(id.clone()))?;
        marshal.record_battle(result);
        let vindication = self
            .vindication
            .resolve_battle(marshal, &mut self.authority, result);
        let redemption = self.check_redemption(id);
        Ok(BattleReport {
            marshal: id.clone(),
            result,
            vindication,
            redemption,
        })
    }

    pub fn clear_pending_vindications(&mut self) {
        self.vindication.clear_all();
    }

    /// Closes the turn: resets the major-objection counter and ticks autonomy windows.
    pub fn end_turn(&mut self) -> TurnSummary {
        let finished = self.turn.turn();
        self.turn.advance_turn();

        let mut autonomy_ended = Vec::new();
        for marshal in self.roster.iter_mut() {
            let Some(turns) = marshal.autonomy_turns else {
                continue;
            };
            let remaining = turns.saturating_sub(1);
            if remaining == 0 {
                marshal.autonomy_turns = None;
                autonomy_ended.push(marshal.id.clone());
            } else {
                marshal.autonomy_turns = Some(remaining);
            }
        }

        tracing::debug!(
            target: "marshal_command::session",
            turn = finished,
            open_objections = self.open.len(),
            autonomy_ended = autonomy_ended.len(),
            "turn.ended"
        );
        TurnSummary {
            turn: finished,
            autonomy_ended,
        }
    }
}
