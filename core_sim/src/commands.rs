use serde_json::{json, Value};
use sim_runtime::CommandPayload;
use tracing::info;

use crate::outcome::OutcomeApplication;
use crate::session::{SessionError, SimulationSession};

/// Run one host command against `session`, returning a JSON reply for the client.
pub fn execute_command(
    session: &mut SimulationSession,
    command: CommandPayload,
) -> Result<Value, SessionError> {
    match command {
        CommandPayload::Turn { steps } => {
            for _ in 0..steps {
                session.advance_turn()?;
            }
            let state = session.current_state();
            info!(
                target: "concord::server",
                steps,
                turn = state.turn,
                "command.applied=turn"
            );
            Ok(json!({ "turn": state.turn, "day": state.day }))
        }
        CommandPayload::ApplyReport { report } => {
            let application = session.apply_report(report)?;
            info!(
                target: "concord::server",
                turn = application.state.turn,
                changes = application.state_changes(),
                "command.applied=report"
            );
            Ok(application_summary(&application))
        }
        CommandPayload::PreviewReport { report } => {
            let application = session.preview_report(&report);
            Ok(application_summary(&application))
        }
        CommandPayload::ProvinceOwner { province, faction } => {
            if let Some(faction) = faction {
                let change = session.set_province_owner(province.as_str(), faction)?;
                info!(
                    target: "concord::server",
                    %province,
                    changed = !change.is_noop(),
                    "command.applied=owner"
                );
            }
            Ok(json!({
                "province": province,
                "owner": session.province_owner(&province),
            }))
        }
        CommandPayload::Relation { from, to, value } => {
            if let Some(value) = value {
                session.set_relation(from.as_str(), to.as_str(), value)?;
                info!(
                    target: "concord::server",
                    %from,
                    %to,
                    value,
                    "command.applied=relation"
                );
            }
            Ok(json!({
                "from": from,
                "to": to,
                "value": session.relation(&from, &to),
            }))
        }
        CommandPayload::Save { path } => {
            let blob = session.save_game_to(&path)?;
            Ok(json!({
                "path": path.display().to_string(),
                "version": blob.version,
                "turn": blob.state.turn,
            }))
        }
        CommandPayload::Load { path } => {
            session.load_game_from(&path)?;
            let state = session.current_state();
            Ok(json!({ "turn": state.turn, "day": state.day }))
        }
        CommandPayload::State => {
            let state = session.current_state();
            Ok(json!({
                "turn": state.turn,
                "day": state.day,
                "seed": state.seed,
                "digest": format!("{:016x}", state.digest()),
                "provinces": state.provinces,
                "relations": state.relations,
                "events": state.event_log.len(),
            }))
        }
    }
}

fn application_summary(application: &OutcomeApplication) -> Value {
    let resolutions: Vec<Value> = application
        .resolutions
        .iter()
        .map(|resolution| {
            json!({
                "index": resolution.index,
                "intent": resolution.kind.as_str(),
                "initiator": resolution.initiator,
                "target": resolution.target,
                "justification_defaulted": resolution.justification_defaulted,
                "effect": resolution.effect,
            })
        })
        .collect();
    json!({
        "turn": application.state.turn,
        "state_changes": application.state_changes(),
        "resolutions": resolutions,
    })
}
