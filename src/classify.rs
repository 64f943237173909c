//! Message classification.
//!
//! An ordered rule list: attachment-name markers first (fixed priority,
//! first match wins), then subject rules. Attachment markers always
//! beat subject content — a record carrying two recognized form
//! attachments classifies by the marker listed earliest here.

use tracing::debug;

use crate::message::{MessageType, RawRecord};

/// Attachment-name markers in priority order.
pub const ATTACHMENT_RULES: &[(&str, MessageType)] = &[
    ("Winlink_Check_In", MessageType::CheckIn),
    ("Winlink_Check_Out", MessageType::CheckOut),
    ("Field_Situation_Report", MessageType::FieldSituation),
    ("Severe_WX_Report", MessageType::SevereWeather),
    ("Hospital_Bed_Report", MessageType::HospitalBed),
    ("DYFI", MessageType::Dyfi),
    ("ICS213", MessageType::Ics213),
];

/// Subject rules, evaluated only when no attachment marker matched.
const SUBJECT_RULES: &[(&str, MessageType)] = &[
    ("WINLINK CHECK IN", MessageType::CheckIn),
    ("WINLINK CHECK OUT", MessageType::CheckOut),
    ("INCIDENT REPORT", MessageType::IncidentReport),
];

/// Assign a semantic type to a raw record. State-free.
pub fn classify(record: &RawRecord) -> MessageType {
    for (marker, ty) in ATTACHMENT_RULES {
        if record.attachments.iter().any(|(name, _)| name.contains(marker)) {
            debug!(id = %record.id, marker, %ty, "classified by attachment");
            return *ty;
        }
    }

    let subject = record.subject.trim().to_ascii_uppercase();
    for (prefix, ty) in SUBJECT_RULES {
        if subject.starts_with(prefix) {
            debug!(id = %record.id, prefix, %ty, "classified by subject");
            return *ty;
        }
    }

    MessageType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(subject: &str, attachments: &[&str]) -> RawRecord {
        RawRecord {
            id: "m1".into(),
            sender: "W7ABC".into(),
            recipient_block: vec![],
            subject: subject.into(),
            timestamp: Utc::now(),
            body: String::new(),
            attachments: attachments
                .iter()
                .map(|name| (name.to_string(), Vec::new()))
                .collect(),
        }
    }

    #[test]
    fn classifies_by_attachment_marker() {
        let r = record("whatever", &["RMS_Express_Form_Winlink_Check_In_Viewer.xml"]);
        assert_eq!(classify(&r), MessageType::CheckIn);
    }

    #[test]
    fn attachment_priority_is_declaration_order() {
        // Both markers present; Check In is listed first and wins even
        // though the subject says otherwise.
        let r = record(
            "INCIDENT REPORT downtown",
            &["DYFI_submission.xml", "RMS_Express_Form_Winlink_Check_In.xml"],
        );
        assert_eq!(classify(&r), MessageType::CheckIn);
    }

    #[test]
    fn attachment_beats_subject() {
        let r = record("Winlink Check Out", &["Field_Situation_Report_form.xml"]);
        assert_eq!(classify(&r), MessageType::FieldSituation);
    }

    #[test]
    fn subject_rules_case_insensitive() {
        assert_eq!(
            classify(&record("winlink check in W7ABC 40m", &[])),
            MessageType::CheckIn
        );
        assert_eq!(
            classify(&record("Incident Report: tree down", &[])),
            MessageType::IncidentReport
        );
    }

    #[test]
    fn check_out_subject_not_swallowed_by_check_in() {
        assert_eq!(
            classify(&record("Winlink Check Out W7ABC", &[])),
            MessageType::CheckOut
        );
    }

    #[test]
    fn unrecognized_record_is_unknown() {
        let r = record("hello from the field", &["photo.jpg"]);
        assert_eq!(classify(&r), MessageType::Unknown);
    }
}
