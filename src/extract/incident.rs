//! Free-text incident reports.
//!
//! No form attachment: operators type a coordinate pair on the first
//! body line and prose after it. The first two tokens on line one that
//! parse as doubles become latitude/longitude; everything after the
//! first line is the comment. A report with no parseable pair still
//! succeeds without a location — the one exception to the "geolocated
//! types require a point" rule.

use std::collections::BTreeMap;

use crate::geo::GeoPoint;
use crate::message::{ClassifiedMessage, MessageType, RawRecord, Rejection};

use super::FormExtractor;

pub struct IncidentReportExtractor;

impl FormExtractor for IncidentReportExtractor {
    fn extract(&self, record: &RawRecord) -> Result<ClassifiedMessage, Rejection> {
        let mut lines = record.body.lines();
        let first = lines.next().unwrap_or("");
        let rest = lines.collect::<Vec<_>>().join("\n");

        let location = scan_pair(first);
        let comment = if location.is_some() {
            rest
        } else {
            record.body.clone()
        };

        let mut fields = BTreeMap::new();
        fields.insert("comments".to_string(), comment.trim().to_string());

        Ok(ClassifiedMessage {
            record_id: record.id.clone(),
            sender: record.sender.clone(),
            subject: record.subject.clone(),
            timestamp: record.timestamp,
            message_type: MessageType::IncidentReport,
            fields,
            location,
        })
    }
}

/// First two whitespace tokens parseable as doubles, as a valid point.
fn scan_pair(line: &str) -> Option<GeoPoint> {
    let mut numbers = line
        .split_whitespace()
        .filter_map(|tok| tok.trim_matches(',').parse::<f64>().ok());
    let lat = numbers.next()?;
    let lon = numbers.next()?;
    GeoPoint::new(lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(body: &str) -> RawRecord {
        RawRecord {
            id: "i1".into(),
            sender: "N0CALL".into(),
            recipient_block: vec![],
            subject: "INCIDENT REPORT tree down".into(),
            timestamp: Utc::now(),
            body: body.into(),
            attachments: vec![],
        }
    }

    #[test]
    fn first_line_pair_becomes_location() {
        let msg = IncidentReportExtractor
            .extract(&record("47.61 -122.33 near the bridge\nLarge tree across SR-99."))
            .unwrap();
        let loc = msg.location.unwrap();
        assert_eq!(loc.latitude, 47.61);
        assert_eq!(loc.longitude, -122.33);
        assert_eq!(msg.fields["comments"], "Large tree across SR-99.");
    }

    #[test]
    fn comma_separated_pair_accepted() {
        let msg = IncidentReportExtractor
            .extract(&record("47.61, -122.33\ndetails"))
            .unwrap();
        assert!(msg.location.is_some());
    }

    #[test]
    fn leading_words_before_pair_are_skipped() {
        let msg = IncidentReportExtractor
            .extract(&record("position 47.61 -122.33\ndetails"))
            .unwrap();
        assert_eq!(msg.location.unwrap().latitude, 47.61);
    }

    #[test]
    fn no_pair_keeps_whole_body_as_comment() {
        let msg = IncidentReportExtractor
            .extract(&record("tree down near the park\nno power on 5th Ave"))
            .unwrap();
        assert!(msg.location.is_none());
        assert_eq!(
            msg.fields["comments"],
            "tree down near the park\nno power on 5th Ave"
        );
    }

    #[test]
    fn single_number_is_not_a_pair() {
        let msg = IncidentReportExtractor
            .extract(&record("47.61 somewhere\ndetails"))
            .unwrap();
        assert!(msg.location.is_none());
        assert!(msg.fields["comments"].contains("47.61 somewhere"));
    }

    #[test]
    fn invalid_pair_falls_back_to_no_location() {
        // Tokens parse as doubles but the pair is out of range.
        let msg = IncidentReportExtractor
            .extract(&record("123.0 456.0 mile marker\ndetails"))
            .unwrap();
        assert!(msg.location.is_none());
        assert!(msg.fields["comments"].contains("mile marker"));
    }

    #[test]
    fn empty_body_still_succeeds() {
        let msg = IncidentReportExtractor.extract(&record("")).unwrap();
        assert!(msg.location.is_none());
        assert_eq!(msg.fields["comments"], "");
    }
}
