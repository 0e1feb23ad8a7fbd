mod common;

use std::sync::Arc;

use anyhow::{Context, Result};
use command_core::{
    BattleResult, CommandSession, Marshal, MarshalId, ObjectionConfig, Personality, RedemptionChoice,
    RedemptionEffect, RedemptionError, Roster, StaticBattlefield,
};
use rand::rngs::mock::StepRng;

fn collapse(session: &mut CommandSession<StepRng>, id: &MarshalId, trust: i32) {
    if let Some(marshal) = session.marshal_mut(id) {
        marshal.trust.set(trust);
    }
}

#[test]
fn redemption_fires_once_until_resolved() -> Result<()> {
    let mut session = common::midpoint_session(common::grande_armee(60), common::uncapped_config());
    let ney = MarshalId::new("ney");

    collapse(&mut session, &ney, 20);
    let event = session
        .check_redemption(&ney)
        .context("trust 20 sits on the threshold")?;
    assert_eq!(event.trust, 20);

    collapse(&mut session, &ney, 15);
    assert!(session.check_redemption(&ney).is_none());
    assert_eq!(session.pending_redemptions().count(), 1);

    session.resolve_redemption(&ney, "grant_autonomy", &common::battlefield())?;
    assert!(session.pending_redemption(&ney).is_none());
    assert!(!session.marshal(&ney).context("ney serves")?.redemption_pending);
    Ok(())
}

#[test]
fn resolved_redemption_waits_for_trust_to_recover() -> Result<()> {
    let mut session = common::midpoint_session(common::grande_armee(60), common::uncapped_config());
    let ney = MarshalId::new("ney");

    collapse(&mut session, &ney, 10);
    session.check_redemption(&ney).context("trust collapsed")?;
    session.resolve_redemption(&ney, "grant_autonomy", &common::battlefield())?;

    // Autonomous and still at 10: a battle report must not reopen the event.
    let report = session.report_battle(&ney, BattleResult::Draw)?;
    assert!(report.redemption.is_none());
    assert!(session.pending_redemption(&ney).is_none());

    for _ in 0..3 {
        session.end_turn();
    }
    assert!(!session.marshal(&ney).context("ney serves")?.is_autonomous());
    assert!(session.check_redemption(&ney).is_none());

    collapse(&mut session, &ney, 35);
    assert!(session.check_redemption(&ney).is_none());
    collapse(&mut session, &ney, 12);
    let event = session
        .check_redemption(&ney)
        .context("a fresh collapse after recovery opens a new event")?;
    assert_eq!(event.trust, 12);
    Ok(())
}

#[test]
fn dismiss_without_ally_in_range_disbands_the_command() -> Result<()> {
    let mut config = ObjectionConfig::default();
    config.defaults.initial_authority = 95;
    let mut session = common::midpoint_session(common::grande_armee(60), Arc::new(config));
    let ney = MarshalId::new("ney");
    let before = session.roster().total_strength();

    collapse(&mut session, &ney, 10);
    session.check_redemption(&ney).context("trust collapsed")?;
    let outcome = session.resolve_redemption(&ney, "dismiss", &StaticBattlefield::new())?;

    assert_eq!(
        outcome.effect,
        RedemptionEffect::Dismissed {
            transferred_to: None,
            strength: 12_000,
            authority_delta: 5,
        }
    );
    assert_eq!(session.roster().total_strength(), before - 12_000);
    assert_eq!(session.authority().value(), 100);
    assert!(session.marshal(&ney).is_none());
    Ok(())
}

#[test]
fn dismiss_hands_command_to_nearest_ally() -> Result<()> {
    let mut session = common::midpoint_session(common::grande_armee(60), common::uncapped_config());
    let ney = MarshalId::new("ney");
    let before = session.roster().total_strength();

    collapse(&mut session, &ney, 10);
    session.check_redemption(&ney).context("trust collapsed")?;
    let outcome = session.resolve_redemption(&ney, "dismiss", &common::battlefield())?;

    // Reims -> Paris is one hop, Reims -> Lyon two.
    assert!(matches!(
        outcome.effect,
        RedemptionEffect::Dismissed {
            transferred_to: Some(ref ally),
            ..
        } if ally.as_str() == "davout"
    ));
    assert_eq!(session.roster().total_strength(), before);
    assert_eq!(session.authority().value(), 60);
    Ok(())
}

#[test]
fn eligibility_is_rechecked_at_resolution() -> Result<()> {
    let mut session = common::midpoint_session(common::grande_armee(60), common::uncapped_config());
    let field = common::battlefield();
    let ney = MarshalId::new("ney");
    let soult = MarshalId::new("soult");

    collapse(&mut session, &ney, 10);
    collapse(&mut session, &soult, 10);
    let ney_event = session.check_redemption(&ney).context("ney collapsed")?;
    let soult_event = session.check_redemption(&soult).context("soult collapsed")?;
    assert!(ney_event.offers(RedemptionChoice::AdministrativeRole));
    assert!(soult_event.offers(RedemptionChoice::AdministrativeRole));

    session.resolve_redemption(&ney, "administrative_role", &field)?;
    assert_eq!(session.bonus_actions(), 1);

    let err = session
        .resolve_redemption(&soult, "administrative_role", &field)
        .expect_err("staff post already taken");
    assert_eq!(
        err,
        RedemptionError::IneligibleChoice {
            marshal: soult.clone(),
            choice: RedemptionChoice::AdministrativeRole,
        }
    );
    assert!(session.pending_redemption(&soult).is_some());

    assert_eq!(
        session.resolve_redemption(&soult, "exile", &field),
        Err(RedemptionError::UnknownChoice("exile".to_string()))
    );
    Ok(())
}

#[test]
fn last_field_marshal_can_only_be_granted_autonomy() -> Result<()> {
    let roster =
        Roster::new([Marshal::new("ney", Personality::Aggressive, 60).at("Reims", 12_000)]);
    let mut session = common::midpoint_session(roster, common::uncapped_config());
    let ney = MarshalId::new("ney");

    collapse(&mut session, &ney, 5);
    let event = session.check_redemption(&ney).context("trust collapsed")?;
    let offered: Vec<_> = event.options.iter().map(|option| option.choice).collect();
    assert_eq!(offered, vec![RedemptionChoice::GrantAutonomy]);

    assert!(matches!(
        session.resolve_redemption(&ney, "dismiss", &common::battlefield()),
        Err(RedemptionError::IneligibleChoice { .. })
    ));
    Ok(())
}
