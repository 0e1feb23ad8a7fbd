mod common;

use anyhow::{bail, Context, Result};
use command_core::{
    Action, BattleResult, CommandSession, Disposition, MarshalId, Objection, Order,
    ResponseChoice,
};
use rand::rngs::mock::StepRng;

fn raise_major(
    session: &mut CommandSession<StepRng>,
    marshal: &MarshalId,
    order: Order,
) -> Result<()> {
    let field = common::battlefield();
    match session.issue_order(marshal, order, &field)? {
        Some(Objection::Major(_)) => Ok(()),
        other => bail!("expected a major objection from {marshal}, got {other:?}"),
    }
}

#[test]
fn repeated_overrides_harden_objections() -> Result<()> {
    let mut session = common::midpoint_session(common::grande_armee(70), common::uncapped_config());
    let ney = MarshalId::new("ney");
    let field = common::battlefield();

    let before = session.preview_severity(&ney, &Order::new(Action::Defend), &field)?;
    assert!((before.severity - 0.60).abs() < 1e-6);

    for expected_trust in [60, 50, 40, 30] {
        raise_major(&mut session, &ney, Order::new(Action::Defend))?;
        let resolution = session.resolve_objection(&ney, "insist")?;
        assert_eq!(resolution.outcome.disposition, Disposition::Complied);
        assert_eq!(resolution.outcome.trust, expected_trust);
        assert!(resolution.redemption.is_none());
    }

    let after = session.preview_severity(&ney, &Order::new(Action::Defend), &field)?;
    assert_eq!(after.overrides, 1.3);
    assert_eq!(after.trust, 1.3);
    assert_eq!(after.severity, 0.95);

    // Fifth insist: trust 30 still obeys a 0.5 roll, lands on 20 and collapses.
    raise_major(&mut session, &ney, Order::new(Action::Defend))?;
    let resolution = session.resolve_objection(&ney, "insist")?;
    assert_eq!(resolution.outcome.trust, 20);
    let event = resolution
        .redemption
        .context("trust at the threshold should open a redemption")?;
    assert_eq!(event.options.len(), 3);

    // Five insists in a row nudge authority up.
    assert_eq!(session.authority().value(), 51);
    Ok(())
}

#[test]
fn chronic_trusting_erodes_authority_once_per_threshold() -> Result<()> {
    let mut session = common::midpoint_session(common::grande_armee(40), common::uncapped_config());
    let ney = MarshalId::new("ney");

    let mut crossed = Vec::new();
    for _ in 0..9 {
        if let Some(marshal) = session.marshal_mut(&ney) {
            marshal.trust.set(40);
        }
        raise_major(&mut session, &ney, Order::new(Action::Defend))?;
        let resolution = session.resolve_objection(&ney, "trust")?;
        assert_eq!(resolution.outcome.disposition, Disposition::AdoptedAlternative);
        crossed.extend(
            session
                .drain_authority_events()
                .into_iter()
                .map(|event| event.threshold),
        );
    }

    // 50 -> 45 -> 40 -> 35 -> 30 -> 25
    assert_eq!(session.authority().value(), 25);
    assert_eq!(crossed, vec![50, 30]);
    assert_eq!(session.authority().obedience_modifier(), 0.90);
    Ok(())
}

#[test]
fn vindication_rewards_the_right_call() -> Result<()> {
    let mut session = common::midpoint_session(common::grande_armee(40), common::uncapped_config());
    let ney = MarshalId::new("ney");

    raise_major(&mut session, &ney, Order::new(Action::Defend))?;
    session.resolve_objection(&ney, ResponseChoice::Insist.as_str())?;
    let trust_after_insist = session.marshal(&ney).context("ney serves")?.trust.value();

    let report = session.report_battle(&ney, BattleResult::Defeat)?;
    let vindication = report
        .vindication
        .context("insist decision should be awaiting a battle")?;
    assert_eq!(vindication.vindication_delta, 1);
    assert_eq!(vindication.trust_delta, -5);
    assert_eq!(vindication.authority_delta, -5);

    let ney_state = session.marshal(&ney).context("ney serves")?;
    assert_eq!(ney_state.trust.value(), trust_after_insist - 5);
    assert_eq!(ney_state.vindication(), 1);
    assert_eq!(
        ney_state.recent_battles().collect::<Vec<_>>(),
        vec![BattleResult::Defeat]
    );
    assert_eq!(ney_state.recent_overrides().collect::<Vec<_>>(), vec![true]);

    let again = session.report_battle(&ney, BattleResult::Victory)?;
    assert!(again.vindication.is_none());
    Ok(())
}

#[test]
fn cleared_vindications_do_not_settle() -> Result<()> {
    let mut session = common::midpoint_session(common::grande_armee(40), common::uncapped_config());
    let ney = MarshalId::new("ney");

    raise_major(&mut session, &ney, Order::new(Action::Defend))?;
    session.resolve_objection(&ney, "trust")?;
    session.clear_pending_vindications();

    let report = session.report_battle(&ney, BattleResult::Victory)?;
    assert!(report.vindication.is_none());
    Ok(())
}
