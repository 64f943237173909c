//! Pipeline configuration.
//!
//! Supplied by the operator's wrapper (CLI or environment); the core
//! only consumes the parsed struct. Filter parse failures are the one
//! fatal condition in the system and are raised before any record is
//! touched.

use std::collections::BTreeSet;

use crate::address::AddressPreferences;
use crate::dedup::DEFAULT_THRESHOLD_METERS;
use crate::error::ConfigError;
use crate::message::MessageType;

/// Configuration consumed by the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Duplicate-location threshold in meters; negative disables
    /// location dedup entirely.
    pub dedup_threshold_meters: i64,
    /// Non-geolocated types that opt in to identity dedup.
    pub identity_dedup_types: BTreeSet<MessageType>,
    /// Address-preference sets for destination resolution.
    pub address_preferences: AddressPreferences,
    /// When set, records of any other type are rejected with
    /// `WRONG_MESSAGE_TYPE`.
    pub required_types: Option<BTreeSet<MessageType>>,
    /// Record ids or call signs that get verbose per-record logging.
    pub dump_ids: BTreeSet<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dedup_threshold_meters: DEFAULT_THRESHOLD_METERS,
            identity_dedup_types: BTreeSet::new(),
            address_preferences: AddressPreferences::default(),
            required_types: None,
            dump_ids: BTreeSet::new(),
        }
    }
}

impl PipelineConfig {
    /// Build config from `WL_INGEST_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let dedup_threshold_meters = match std::env::var("WL_INGEST_DEDUP_METERS") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "WL_INGEST_DEDUP_METERS".into(),
                message: format!("not an integer: {raw:?}"),
            })?,
            Err(_) => DEFAULT_THRESHOLD_METERS,
        };

        let identity_dedup_types =
            parse_type_list(&env_or_default("WL_INGEST_IDENTITY_DEDUP_TYPES"))?;

        let required_types = match std::env::var("WL_INGEST_REQUIRED_TYPES") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_type_list(&raw)?),
            _ => None,
        };

        let address_preferences = AddressPreferences::from_lists(
            &env_or_default("WL_INGEST_PREFERRED_PREFIXES"),
            &env_or_default("WL_INGEST_PREFERRED_SUFFIXES"),
            &env_or_default("WL_INGEST_NOT_PREFERRED_PREFIXES"),
            &env_or_default("WL_INGEST_NOT_PREFERRED_SUFFIXES"),
        );

        let dump_ids = env_or_default("WL_INGEST_DUMP_IDS")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            dedup_threshold_meters,
            identity_dedup_types,
            address_preferences,
            required_types,
            dump_ids,
        })
    }

    /// Whether a record id or call sign asked for verbose logging.
    pub fn is_dump(&self, id: &str, sender: &str) -> bool {
        self.dump_ids.contains(id) || self.dump_ids.contains(sender)
    }
}

fn env_or_default(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

/// Parse a comma-separated list of message-type labels.
fn parse_type_list(raw: &str) -> Result<BTreeSet<MessageType>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|label| {
            MessageType::from_label(label)
                .ok_or_else(|| ConfigError::UnknownMessageType(label.to_string()))
        })
        .collect()
}
