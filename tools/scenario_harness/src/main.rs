use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use command_core::{
    load_objection_config_from_env, load_personality_catalog_from_env, BattleResult,
    CommandSession, Marshal, MarshalId, Order, Personality, Roster, StaticBattlefield,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays a marshal command scenario", long_about = None)]
struct Args {
    /// Path to scenario JSON file
    #[arg(long)]
    scenario: PathBuf,

    /// Rng seed; defaults to a hash of the scenario's campaign name
    #[arg(long)]
    seed: Option<u64>,

    /// Pretty-print each record
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default = "default_campaign")]
    campaign: String,
    #[serde(default)]
    battlefield: StaticBattlefield,
    marshals: Vec<MarshalEntry>,
    #[serde(default)]
    steps: Vec<Step>,
}

fn default_campaign() -> String {
    "unnamed".to_string()
}

#[derive(Debug, Deserialize)]
struct MarshalEntry {
    id: String,
    personality: Personality,
    trust: Option<i32>,
    location: Option<String>,
    #[serde(default)]
    strength: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Order { marshal: MarshalId, order: Order },
    Preview { marshal: MarshalId, order: Order },
    Resolve { marshal: MarshalId, choice: String },
    Redemption { marshal: MarshalId, choice: String },
    Battle { marshal: MarshalId, result: BattleResult },
    Restore { marshal: MarshalId },
    ClearVindications,
    EndTurn,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Order { .. } => "order",
            Step::Preview { .. } => "preview",
            Step::Resolve { .. } => "resolve",
            Step::Redemption { .. } => "redemption",
            Step::Battle { .. } => "battle",
            Step::Restore { .. } => "restore",
            Step::ClearVindications => "clear_vindications",
            Step::EndTurn => "end_turn",
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let scenario_json = fs::read_to_string(&args.scenario)
        .with_context(|| format!("Failed to read scenario at {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&scenario_json).with_context(|| {
        format!(
            "Failed to parse scenario JSON at {}",
            args.scenario.display()
        )
    })?;

    let (config, config_path) = load_objection_config_from_env();
    let catalog = load_personality_catalog_from_env();
    let initial_trust = config.defaults.initial_trust;

    let roster = Roster::new(scenario.marshals.iter().map(|entry| {
        let mut marshal = Marshal::new(
            entry.id.as_str(),
            entry.personality,
            entry.trust.unwrap_or(initial_trust),
        );
        if let Some(location) = &entry.location {
            marshal = marshal.at(location, entry.strength);
        } else {
            marshal.strength = entry.strength;
        }
        marshal
    }));

    let mut session = match args.seed {
        Some(seed) => CommandSession::new(roster, catalog, config, seed),
        None => CommandSession::for_campaign(&scenario.campaign, roster, catalog, config),
    };
    tracing::info!(
        target: "marshal_command::harness",
        campaign = %scenario.campaign,
        seed = ?args.seed,
        config = ?config_path,
        marshals = session.roster().len(),
        steps = scenario.steps.len(),
        "scenario.start"
    );

    let field = &scenario.battlefield;
    for (index, step) in scenario.steps.iter().enumerate() {
        let record = run_step(&mut session, field, step)?;
        let events = session.drain_authority_events();
        let mut line = json!({
            "step": index,
            "op": step.name(),
            "record": record,
        });
        if !events.is_empty() {
            line["authority_events"] = serde_json::to_value(&events)?;
        }
        let rendered = if args.pretty {
            serde_json::to_string_pretty(&line)?
        } else {
            serde_json::to_string(&line)?
        };
        println!("{rendered}");
    }

    let summary = json!({
        "campaign": scenario.campaign,
        "turn": session.turn().turn(),
        "authority": session.authority().value(),
        "bonus_actions": session.bonus_actions(),
        "marshals": session
            .roster()
            .iter()
            .map(|marshal| json!({
                "id": marshal.id,
                "trust": marshal.trust.value(),
                "label": marshal.trust.label().as_str(),
                "vindication": marshal.vindication(),
                "role": marshal.role,
                "strength": marshal.strength,
                "autonomy_turns": marshal.autonomy_turns,
            }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// Executes one step. Rejections are reported in the record, not as failures.
fn run_step(
    session: &mut CommandSession,
    field: &StaticBattlefield,
    step: &Step,
) -> Result<JsonValue> {
    let record = match step {
        Step::Order { marshal, order } => {
            match session.issue_order(marshal, order.clone(), field) {
                Ok(objection) => serde_json::to_value(objection)?,
                Err(err) => rejection(err),
            }
        }
        Step::Preview { marshal, order } => match session.preview_severity(marshal, order, field) {
            Ok(breakdown) => serde_json::to_value(breakdown)?,
            Err(err) => rejection(err),
        },
        Step::Resolve { marshal, choice } => match session.resolve_objection(marshal, choice) {
            Ok(resolution) => serde_json::to_value(resolution)?,
            Err(err) => rejection(err),
        },
        Step::Redemption { marshal, choice } => {
            match session.resolve_redemption(marshal, choice, field) {
                Ok(outcome) => serde_json::to_value(outcome)?,
                Err(err) => rejection(err),
            }
        }
        Step::Battle { marshal, result } => match session.report_battle(marshal, *result) {
            Ok(report) => serde_json::to_value(report)?,
            Err(err) => rejection(err),
        },
        Step::Restore { marshal } => match session.restore_from_administration(marshal) {
            Ok(strength) => json!({ "restored_strength": strength }),
            Err(err) => rejection(err),
        },
        Step::ClearVindications => {
            session.clear_pending_vindications();
            JsonValue::Null
        }
        Step::EndTurn => serde_json::to_value(session.end_turn())?,
    };
    Ok(record)
}

fn rejection(err: impl std::fmt::Display) -> JsonValue {
    json!({ "rejected": err.to_string() })
}
