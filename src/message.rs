//! Core record types shared across the pipeline.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

// ── Raw record ──────────────────────────────────────────────────────

/// One exported message as read from an input file.
///
/// Built once by the reader and never mutated afterwards. `id` is
/// unique within a batch (Message-ID, or a generated UUID when the
/// export lacks one).
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Opaque unique id.
    pub id: String,
    /// Sender call sign (upper-cased local part of the From address).
    pub sender: String,
    /// Candidate destination addresses in header order, To before Cc,
    /// pre-cleaned (label removed, trailing comma stripped, trimmed).
    pub recipient_block: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Composite send time, always interpreted as UTC.
    pub timestamp: DateTime<Utc>,
    /// Raw body text.
    pub body: String,
    /// Named attachments, insertion order preserved.
    pub attachments: Vec<(String, Vec<u8>)>,
}

impl RawRecord {
    /// First attachment whose name contains `marker`.
    pub fn attachment_containing(&self, marker: &str) -> Option<(&str, &[u8])> {
        self.attachments
            .iter()
            .find(|(name, _)| name.contains(marker))
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
    }
}

// ── Message type catalog ────────────────────────────────────────────

/// Semantic message types, in attachment-priority order.
///
/// The declaration order of the form-bearing variants is the
/// classification priority: a record carrying markers for two types is
/// always classified by the one listed first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    CheckIn,
    CheckOut,
    FieldSituation,
    SevereWeather,
    HospitalBed,
    Dyfi,
    Ics213,
    IncidentReport,
    Unknown,
}

impl MessageType {
    /// Whether this type is expected to carry a geographic coordinate.
    ///
    /// `IncidentReport` is geolocated but tolerates a missing point
    /// (free-text reports without coordinates still succeed).
    pub fn is_gis(self) -> bool {
        !matches!(self, Self::Ics213 | Self::Unknown)
    }

    /// Stable lower-case label used in config filters and summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
            Self::FieldSituation => "field_situation",
            Self::SevereWeather => "severe_weather",
            Self::HospitalBed => "hospital_bed",
            Self::Dyfi => "dyfi",
            Self::Ics213 => "ics213",
            Self::IncidentReport => "incident_report",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a config-supplied label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "check_in" => Some(Self::CheckIn),
            "check_out" => Some(Self::CheckOut),
            "field_situation" => Some(Self::FieldSituation),
            "severe_weather" => Some(Self::SevereWeather),
            "hospital_bed" => Some(Self::HospitalBed),
            "dyfi" => Some(Self::Dyfi),
            "ics213" => Some(Self::Ics213),
            "incident_report" => Some(Self::IncidentReport),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Classified message ──────────────────────────────────────────────

/// A raw record annotated with its type and extracted fields.
///
/// Immutable after extraction, with one exception: output smoothing may
/// overwrite `location` with a jittered value so co-located survivors
/// don't stack on a map. That is a presentation fix, not a
/// correctness-bearing mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedMessage {
    /// Id of the source record.
    pub record_id: String,
    /// Sender call sign.
    pub sender: String,
    /// Subject line of the source record.
    pub subject: String,
    /// Composite send time of the source record.
    pub timestamp: DateTime<Utc>,
    /// Assigned semantic type.
    pub message_type: MessageType,
    /// Extracted field names to values; absent optionals are empty.
    pub fields: BTreeMap<String, String>,
    /// Parsed location, when the type carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

// ── Rejection ───────────────────────────────────────────────────────

/// Why a record was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum RejectReason {
    /// No recognized attachment or subject rule matched.
    UnsupportedType,
    /// A geolocated type had no parseable coordinate pair.
    #[serde(rename = "CANT_PARSE_LATLONG")]
    CantParseLatLong,
    /// A JSON-bodied type carried malformed JSON.
    CantParseJson,
    /// Unexpected extraction failure (bad XML, bad bytes).
    ProcessingError,
    /// Excluded by the operator-supplied type filter.
    WrongMessageType,
    /// Identity dedup: a later message from the same sender survives.
    SameCall,
    /// Location dedup: a later message at the same spot survives.
    SameLocation,
}

/// A record that failed classification or extraction, or lost a
/// deduplication pass. Created once, never mutated, never re-enters
/// processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    /// Id of the source record.
    pub record_id: String,
    /// Closed reason code.
    pub reason: RejectReason,
    /// Free-text diagnostic context (attempted tags, parse error, ...).
    pub context: String,
    /// For dedup losers: id of the surviving record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
}

impl Rejection {
    pub fn new(record_id: impl Into<String>, reason: RejectReason, context: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            reason,
            context: context.into(),
            superseded_by: None,
        }
    }

    /// A dedup-loss rejection pointing at the survivor.
    pub fn superseded(
        record_id: impl Into<String>,
        reason: RejectReason,
        context: impl Into<String>,
        survivor_id: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            reason,
            context: context.into(),
            superseded_by: Some(survivor_id.into()),
        }
    }
}
