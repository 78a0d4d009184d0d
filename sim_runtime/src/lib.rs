//! Shared contracts for the Concord simulation core.
//!
//! Types in this crate describe what crosses the boundary between the core and
//! its collaborators: negotiation reports coming in from the analysis
//! pipeline, province records going out to the presentation layer, and the
//! text command surface of the host process. Nothing here touches world state.

mod command_text;
mod commands;
mod province;
mod report;

pub use command_text::{parse_command_line, CommandParseError, MAX_TURN_STEPS};
pub use commands::CommandPayload;
pub use province::ProvinceData;
pub use report::{
    report_schema, Concession, ContentSafety, CounterOffer, Intent, IntentKind, IntentParties,
    Justification, NegotiationReport, Proposal, ReportParseError, Severity, SmallTalk,
    SpeakerTurn, Ultimatum,
};
