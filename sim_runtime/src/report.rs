use std::collections::BTreeMap;

use schemars::{schema::RootSchema, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// How strongly the negotiation pipeline rates an intent. Only consulted for ultimatums.
///
/// Decoding is case-insensitive; null or unrecognised levels read as [`Severity::Low`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        let level = raw
            .as_ref()
            .and_then(Value::as_str)
            .map(|level| level.trim().to_ascii_lowercase());
        Ok(match level.as_deref() {
            Some("medium") => Severity::Medium,
            Some("high") => Severity::High,
            _ => Severity::Low,
        })
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Discriminant of an [`Intent`], usable without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Proposal,
    CounterOffer,
    Ultimatum,
    Concession,
    SmallTalk,
    Unknown,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Proposal => "proposal",
            IntentKind::CounterOffer => "counter_offer",
            IntentKind::Ultimatum => "ultimatum",
            IntentKind::Concession => "concession",
            IntentKind::SmallTalk => "small_talk",
            IntentKind::Unknown => "unknown",
        }
    }
}

/// Parties and free text shared by every intent variant.
///
/// Missing identifiers deserialize as empty strings; the simulation core treats an
/// empty identifier as malformed and skips any relation update that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct IntentParties {
    #[serde(deserialize_with = "null_as_default")]
    pub initiator_faction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub target_faction: String,
    #[serde(alias = "content", deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
}

impl IntentParties {
    pub fn new(
        initiator: impl Into<String>,
        target: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            initiator_faction: initiator.into(),
            target_faction: target.into(),
            summary: summary.into(),
            speaker_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Proposal {
    #[serde(flatten)]
    pub parties: IntentParties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub terms: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CounterOffer {
    #[serde(flatten)]
    pub parties: IntentParties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_proposal_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub counter_terms: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Ultimatum {
    #[serde(flatten)]
    pub parties: IntentParties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub consequences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Concession {
    #[serde(flatten)]
    pub parties: IntentParties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concession_type: Option<String>,
    /// Relative value of the concession on a 0..=100 scale, as rated upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SmallTalk {
    #[serde(flatten)]
    pub parties: IntentParties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// A structured diplomatic action detected by the negotiation pipeline.
///
/// Tags are matched on the `type` field. Tags this build does not know about decode as
/// [`Intent::Unknown`] so newer pipelines can ship intent kinds ahead of the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    #[serde(alias = "Proposal")]
    Proposal(Proposal),
    #[serde(alias = "CounterOffer", alias = "counteroffer")]
    CounterOffer(CounterOffer),
    #[serde(alias = "Ultimatum")]
    Ultimatum(Ultimatum),
    #[serde(alias = "Concession")]
    Concession(Concession),
    #[serde(alias = "SmallTalk", alias = "smalltalk")]
    SmallTalk(SmallTalk),
    #[serde(other)]
    Unknown,
}

impl Intent {
    pub fn proposal(initiator: &str, target: &str, summary: &str) -> Self {
        Intent::Proposal(Proposal {
            parties: IntentParties::new(initiator, target, summary),
            ..Default::default()
        })
    }

    pub fn counter_offer(initiator: &str, target: &str, summary: &str) -> Self {
        Intent::CounterOffer(CounterOffer {
            parties: IntentParties::new(initiator, target, summary),
            ..Default::default()
        })
    }

    pub fn ultimatum(initiator: &str, target: &str, summary: &str) -> Self {
        Intent::Ultimatum(Ultimatum {
            parties: IntentParties::new(initiator, target, summary),
            ..Default::default()
        })
    }

    pub fn concession(initiator: &str, target: &str, summary: &str) -> Self {
        Intent::Concession(Concession {
            parties: IntentParties::new(initiator, target, summary),
            ..Default::default()
        })
    }

    pub fn small_talk(initiator: &str, target: &str, summary: &str) -> Self {
        Intent::SmallTalk(SmallTalk {
            parties: IntentParties::new(initiator, target, summary),
            ..Default::default()
        })
    }

    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Proposal(_) => IntentKind::Proposal,
            Intent::CounterOffer(_) => IntentKind::CounterOffer,
            Intent::Ultimatum(_) => IntentKind::Ultimatum,
            Intent::Concession(_) => IntentKind::Concession,
            Intent::SmallTalk(_) => IntentKind::SmallTalk,
            Intent::Unknown => IntentKind::Unknown,
        }
    }

    /// Shared party data, absent only for intents of an unrecognised kind.
    pub fn parties(&self) -> Option<&IntentParties> {
        match self {
            Intent::Proposal(inner) => Some(&inner.parties),
            Intent::CounterOffer(inner) => Some(&inner.parties),
            Intent::Ultimatum(inner) => Some(&inner.parties),
            Intent::Concession(inner) => Some(&inner.parties),
            Intent::SmallTalk(inner) => Some(&inner.parties),
            Intent::Unknown => None,
        }
    }

    pub fn initiator(&self) -> &str {
        self.parties()
            .map(|parties| parties.initiator_faction.as_str())
            .unwrap_or("")
    }

    pub fn target(&self) -> &str {
        self.parties()
            .map(|parties| parties.target_faction.as_str())
            .unwrap_or("")
    }

    pub fn summary(&self) -> &str {
        self.parties()
            .map(|parties| parties.summary.as_str())
            .unwrap_or("")
    }

    /// Case-insensitive substring match against the summary.
    pub fn summary_mentions(&self, keyword: &str) -> bool {
        if keyword.is_empty() {
            return false;
        }
        self.summary()
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    }
}

/// Per-intent metadata, index-aligned with [`NegotiationReport::intents`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Justification {
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: f32,
    pub severity: Severity,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub rationale: Vec<String>,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
}

impl Justification {
    pub fn new(confidence: f32, severity: Severity) -> Self {
        Self {
            confidence,
            severity,
            ..Default::default()
        }
    }

    /// Confidence clamped into `[0, 1]`; non-finite input reads as zero.
    pub fn confidence(&self) -> f32 {
        if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SpeakerTurn {
    pub speaker_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ContentSafety {
    pub is_safe: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Ordered batch of intents produced by one negotiation session.
///
/// `intents` and `justifications` decode entry by entry: an intent that cannot be read
/// becomes [`Intent::Unknown`] and an unreadable justification becomes the default, so
/// one bad entry never costs the rest of the batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct NegotiationReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Faction id string, or the faction record the negotiation service attaches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_faction: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterpart_faction: Option<Value>,
    #[serde(default, deserialize_with = "decode_intents")]
    pub intents: Vec<Intent>,
    #[serde(default, deserialize_with = "decode_justifications")]
    pub justifications: Vec<Justification>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub transcript: Vec<SpeakerTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Value>,
    #[serde(
        default,
        alias = "content_safety_report",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_safety: Option<ContentSafety>,
}

#[derive(Debug, Error)]
pub enum ReportParseError {
    #[error("failed to parse negotiation report: {0}")]
    Json(#[from] serde_json::Error),
}

impl NegotiationReport {
    pub fn new(intents: Vec<Intent>, justifications: Vec<Justification>) -> Self {
        Self {
            intents,
            justifications,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ReportParseError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self, ReportParseError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Justification aligned with intent `index`, if the pipeline supplied one.
    pub fn justification_for(&self, index: usize) -> Option<&Justification> {
        self.justifications.get(index)
    }

    pub fn initiator_id(&self) -> Option<&str> {
        self.initiator_faction.as_ref().and_then(faction_id)
    }

    pub fn counterpart_id(&self) -> Option<&str> {
        self.counterpart_faction.as_ref().and_then(faction_id)
    }

    /// True only when the pipeline explicitly flagged the content as unsafe.
    pub fn is_flagged_unsafe(&self) -> bool {
        self.content_safety
            .as_ref()
            .is_some_and(|safety| !safety.is_safe)
    }
}

/// A bare string, or the `id` (falling back to `name`) of a faction record.
fn faction_id(value: &Value) -> Option<&str> {
    match value {
        Value::String(id) => Some(id.as_str()),
        Value::Object(record) => record
            .get("id")
            .or_else(|| record.get("name"))
            .and_then(Value::as_str),
        _ => None,
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn decode_intents<'de, D>(deserializer: D) -> Result<Vec<Intent>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|entry| serde_json::from_value(entry).unwrap_or(Intent::Unknown))
        .collect())
}

fn decode_justifications<'de, D>(deserializer: D) -> Result<Vec<Justification>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|entry| serde_json::from_value(entry).unwrap_or_default())
        .collect())
}

/// JSON schema describing the report shape accepted by the simulation core.
pub fn report_schema() -> RootSchema {
    schemars::schema_for!(NegotiationReport)
}
