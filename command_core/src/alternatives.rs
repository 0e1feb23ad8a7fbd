//! Counter-proposals a marshal offers when raising a major objection.

use serde::Serialize;

use crate::facts::BattlefieldFacts;
use crate::marshal::{Marshal, Personality};
use crate::orders::{Action, Order, Stance};
use crate::situation::{Situation, SituationClass};

/// The alternative order, tagged with the reasoning that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", content = "order", rename_all = "snake_case")]
pub enum AlternativePlan {
    /// Strike an adjacent enemy or push toward one.
    Advance(Order),
    /// Pull back, dig in or turn defensive, scaled to the odds.
    FallBack(Order),
    /// Keep the capital garrisoned.
    GuardCapital(Order),
    /// Do nothing until the order is clarified.
    AwaitClarification(Order),
    DefendInPlace(Order),
}

impl AlternativePlan {
    pub fn order(&self) -> &Order {
        match self {
            AlternativePlan::Advance(order)
            | AlternativePlan::FallBack(order)
            | AlternativePlan::GuardCapital(order)
            | AlternativePlan::AwaitClarification(order)
            | AlternativePlan::DefendInPlace(order) => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            AlternativePlan::Advance(order)
            | AlternativePlan::FallBack(order)
            | AlternativePlan::GuardCapital(order)
            | AlternativePlan::AwaitClarification(order)
            | AlternativePlan::DefendInPlace(order) => order,
        }
    }
}

/// Picks the alternative for `(personality, situation class)`.
pub fn propose_alternative<F>(
    marshal: &Marshal,
    situation: Situation,
    facts: &F,
) -> AlternativePlan
where
    F: BattlefieldFacts + ?Sized,
{
    match (marshal.personality, situation.class()) {
        (Personality::Aggressive, SituationClass::Passive) => advance(marshal, facts),
        (Personality::Cautious, SituationClass::RiskyAttack) => fall_back(situation),
        (_, SituationClass::CapitalExposure) => {
            let action = if marshal.personality == Personality::Balanced {
                Action::Hold
            } else {
                Action::Defend
            };
            AlternativePlan::GuardCapital(Order::new(action))
        }
        (_, SituationClass::Ambiguous) => {
            AlternativePlan::AwaitClarification(Order::new(Action::Wait))
        }
        (_, SituationClass::Passive) if situation == Situation::WaitWithEnemyNearby => {
            advance(marshal, facts)
        }
        (_, SituationClass::RiskyAttack) => {
            AlternativePlan::FallBack(Order::new(Action::Fortify))
        }
        _ => AlternativePlan::DefendInPlace(Order::new(Action::Defend)),
    }
}

fn advance<F>(marshal: &Marshal, facts: &F) -> AlternativePlan
where
    F: BattlefieldFacts + ?Sized,
{
    let Some(location) = marshal.location.as_ref() else {
        return AlternativePlan::Advance(Order::stance(Stance::Aggressive));
    };

    if let Some(enemy) = facts.adjacent_enemy_regions(location).into_iter().next() {
        return AlternativePlan::Advance(Order::targeting(Action::Attack, enemy));
    }
    match facts.valid_moves(location).into_iter().next() {
        Some(destination) => AlternativePlan::Advance(Order::targeting(Action::Move, destination)),
        None => AlternativePlan::Advance(Order::stance(Stance::Aggressive)),
    }
}

fn fall_back(situation: Situation) -> AlternativePlan {
    let order = match situation {
        Situation::AttackOutnumberedSevere => Order::new(Action::Retreat),
        Situation::AttackOutnumbered => Order::new(Action::Fortify),
        _ => Order::stance(Stance::Defensive),
    };
    AlternativePlan::FallBack(order)
}

/// A middle ground between the original order and the alternative, if one exists.
///
/// Personality logic is tried first, then the original x alternative table,
/// then "defend in place". A candidate identical to either side is discarded.
pub fn propose_compromise(
    marshal: &Marshal,
    original: &Order,
    alternative: &Order,
    situation: Situation,
) -> Option<Order> {
    let candidate = personality_compromise(marshal.personality, original, situation)
        .or_else(|| table_compromise(original, alternative))
        .unwrap_or_else(|| Order::new(Action::Defend));

    (candidate != *original && candidate != *alternative).then_some(candidate)
}

fn personality_compromise(
    personality: Personality,
    original: &Order,
    situation: Situation,
) -> Option<Order> {
    match (personality, situation.class()) {
        (Personality::Cautious, SituationClass::RiskyAttack) => original
            .target
            .clone()
            .map(|target| Order::targeting(Action::Scout, target)),
        (Personality::Aggressive, SituationClass::Passive) => Some(Order::stance(Stance::Aggressive)),
        (Personality::Literal, SituationClass::Ambiguous) => Some(Order::new(Action::Hold)),
        _ => None,
    }
}

fn table_compromise(original: &Order, alternative: &Order) -> Option<Order> {
    use Action::*;

    let scout_original = || {
        original
            .target
            .clone()
            .map(|target| Order::targeting(Scout, target))
    };
    let scout_alternative = || {
        alternative
            .target
            .clone()
            .map(|target| Order::targeting(Scout, target))
    };

    match (original.action, alternative.action) {
        (Attack, Retreat) => Some(Order::new(Fortify)),
        (Attack, Fortify) => Some(Order::stance(Stance::Defensive)),
        (Attack, StanceChange | Defend | Hold) => scout_original(),
        (Defend | Wait | Hold | Fortify, Attack) => Some(Order::stance(Stance::Aggressive)),
        (held, Move) if held.is_passive() => scout_alternative(),
        (Retreat, Attack) => Some(Order::new(Defend)),
        (Move, Hold | Defend) => Some(Order::new(Fortify)),
        _ => None,
    }
}
