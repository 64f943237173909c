//! "Did You Feel It" earthquake reports.
//!
//! The DYFI form embeds a JSON object (the USGS submission payload)
//! rather than flat XML, so it gets its own extractor. The JSON lives
//! in the form attachment when present, otherwise in the plain body.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::geo::{self, GeoPoint};
use crate::message::{ClassifiedMessage, MessageType, RawRecord, RejectReason, Rejection};

use super::FormExtractor;

const MARKER: &str = "DYFI";

/// Optional descriptive keys carried through to the field map.
const FIELDS: &[&str] = &["intensity", "city", "state", "comments"];

pub struct DyfiExtractor;

impl FormExtractor for DyfiExtractor {
    fn extract(&self, record: &RawRecord) -> Result<ClassifiedMessage, Rejection> {
        let text = match record.attachment_containing(MARKER) {
            Some((name, bytes)) => std::str::from_utf8(bytes)
                .map_err(|e| {
                    Rejection::new(
                        &record.id,
                        RejectReason::ProcessingError,
                        format!("attachment {name}: {e}"),
                    )
                })?
                .to_string(),
            None => record.body.clone(),
        };

        let payload = json_payload(&text)
            .map_err(|context| Rejection::new(&record.id, RejectReason::CantParseJson, context))?;

        let location = coord(&payload, "latitude")
            .zip(coord(&payload, "longitude"))
            .and_then(|(lat, lon)| GeoPoint::new(lat, lon));
        let Some(location) = location else {
            return Err(Rejection::new(
                &record.id,
                RejectReason::CantParseLatLong,
                "tried keys: latitude, longitude",
            ));
        };

        let mut fields = BTreeMap::new();
        for key in FIELDS {
            fields.insert(key.to_string(), field_text(&payload, key));
        }

        Ok(ClassifiedMessage {
            record_id: record.id.clone(),
            sender: record.sender.clone(),
            subject: record.subject.clone(),
            timestamp: record.timestamp,
            message_type: MessageType::Dyfi,
            fields,
            location: Some(location),
        })
    }
}

/// Extract and parse the first JSON object embedded in form text.
fn json_payload(text: &str) -> Result<Value, String> {
    let start = text.find('{').ok_or("no JSON object in body")?;
    let end = text.rfind('}').ok_or("unterminated JSON object")?;
    if end < start {
        return Err("unterminated JSON object".into());
    }
    serde_json::from_str(&text[start..=end]).map_err(|e| e.to_string())
}

/// A coordinate key as decimal degrees; accepts numbers or any string
/// notation the coordinate parser understands.
fn coord(payload: &Value, key: &str) -> Option<f64> {
    match payload.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => geo::parse_coordinate(s).ok(),
        _ => None,
    }
}

/// A descriptive key as text; absent or non-scalar becomes empty.
fn field_text(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
