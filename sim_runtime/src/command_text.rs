use std::num::{ParseFloatError, ParseIntError};
use std::path::PathBuf;

use thiserror::Error;

use crate::{CommandPayload, NegotiationReport, ReportParseError};

/// Upper bound on `turn <n>`.
pub const MAX_TURN_STEPS: u32 = 1000;

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid integer '{value}' for {context}: {source}")]
    InvalidInteger {
        value: String,
        context: &'static str,
        source: ParseIntError,
    },
    #[error("invalid float '{value}' for {context}: {source}")]
    InvalidFloat {
        value: String,
        context: &'static str,
        source: ParseFloatError,
    },
    #[error("turn steps {requested} exceeds the limit of {max}")]
    TooManySteps { requested: u32, max: u32 },
    #[error("invalid report payload: {0}")]
    InvalidReport(#[from] ReportParseError),
}

/// Parse one line of the host's text protocol.
///
/// `report` and `preview` take the remainder of the line as a JSON negotiation
/// report; `save` and `load` take it as a path. `owner <province> -` (or `none`)
/// releases a province.
pub fn parse_command_line(input: &str) -> Result<CommandPayload, CommandParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommandParseError::Empty);
    }

    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb.to_ascii_lowercase(), rest.trim()),
        None => (trimmed.to_ascii_lowercase(), ""),
    };
    let mut parts = rest.split_whitespace();

    match verb.as_str() {
        "turn" | "advance" => {
            let steps_str = parts.next().unwrap_or("1");
            let steps = parse_u32(steps_str, "turn steps")?;
            if steps > MAX_TURN_STEPS {
                return Err(CommandParseError::TooManySteps {
                    requested: steps,
                    max: MAX_TURN_STEPS,
                });
            }
            Ok(CommandPayload::Turn { steps })
        }
        "report" | "apply" => Ok(CommandPayload::ApplyReport {
            report: parse_report(rest)?,
        }),
        "preview" => Ok(CommandPayload::PreviewReport {
            report: parse_report(rest)?,
        }),
        "owner" => {
            let province = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("province"))?;
            let faction = parts.next().map(|token| match token {
                "-" | "none" => String::new(),
                other => other.to_string(),
            });
            Ok(CommandPayload::ProvinceOwner {
                province: province.to_string(),
                faction,
            })
        }
        "relation" => {
            let from = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("from"))?;
            let to = parts
                .next()
                .ok_or(CommandParseError::MissingArgument("to"))?;
            let value = match parts.next() {
                Some(token) => Some(parse_f32(token, "relation value")?),
                None => None,
            };
            Ok(CommandPayload::Relation {
                from: from.to_string(),
                to: to.to_string(),
                value,
            })
        }
        "save" => Ok(CommandPayload::Save {
            path: parse_path(rest)?,
        }),
        "load" => Ok(CommandPayload::Load {
            path: parse_path(rest)?,
        }),
        "state" | "status" => Ok(CommandPayload::State),
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_report(json: &str) -> Result<NegotiationReport, CommandParseError> {
    if json.is_empty() {
        return Err(CommandParseError::MissingArgument("report json"));
    }
    Ok(NegotiationReport::from_json_str(json)?)
}

fn parse_path(rest: &str) -> Result<PathBuf, CommandParseError> {
    if rest.is_empty() {
        return Err(CommandParseError::MissingArgument("path"));
    }
    Ok(PathBuf::from(rest))
}

fn parse_u32(value: &str, context: &'static str) -> Result<u32, CommandParseError> {
    value
        .parse::<u32>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_f32(value: &str, context: &'static str) -> Result<f32, CommandParseError> {
    value
        .parse::<f32>()
        .map_err(|source| CommandParseError::InvalidFloat {
            value: value.to_string(),
            context,
            source,
        })
}
