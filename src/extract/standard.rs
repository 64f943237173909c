//! Generic extractor for flat XML form attachments.
//!
//! Most message types share one shape: a form attachment with
//! `<Tag>value</Tag>` pairs, or (for attachment-less submissions) the
//! same fields as `Key: value` body lines. Only the field list and the
//! location tag overrides differ per type, so the standard extractor is
//! data-driven from the registry in `extract::mod`.

use std::collections::BTreeMap;

use crate::forms::{self, FormDocument};
use crate::message::{ClassifiedMessage, MessageType, RawRecord, RejectReason, Rejection};

use super::FormExtractor;

/// Data-driven extractor for flat-form message types.
pub struct StandardFormExtractor {
    pub message_type: MessageType,
    /// Attachment-name marker for this type's form.
    pub marker: &'static str,
    /// Semantic fields to pull from the document.
    pub fields: &'static [&'static str],
    /// Type-specific location tags tried after the default set.
    pub location_overrides: &'static [&'static str],
}

impl StandardFormExtractor {
    /// Build the document view: the form attachment when present,
    /// otherwise the plain body as `Key: value` lines.
    fn document(&self, record: &RawRecord) -> Result<FormDocument, Rejection> {
        match record.attachment_containing(self.marker) {
            Some((name, bytes)) => {
                let xml = std::str::from_utf8(bytes).map_err(|e| {
                    Rejection::new(
                        &record.id,
                        RejectReason::ProcessingError,
                        format!("attachment {name}: {e}"),
                    )
                })?;
                FormDocument::parse(xml).map_err(|e| {
                    Rejection::new(
                        &record.id,
                        RejectReason::ProcessingError,
                        format!("attachment {name}: {e}"),
                    )
                })
            }
            None => Ok(FormDocument::from_lines(&record.body, ':')),
        }
    }
}

impl FormExtractor for StandardFormExtractor {
    fn extract(&self, record: &RawRecord) -> Result<ClassifiedMessage, Rejection> {
        let doc = self.document(record)?;

        let location = if self.message_type.is_gis() {
            let found = forms::extract_location(&doc, self.location_overrides);
            if found.is_none() {
                return Err(Rejection::new(
                    &record.id,
                    RejectReason::CantParseLatLong,
                    format!("tried tags: {}", forms::attempted_tags(self.location_overrides)),
                ));
            }
            found
        } else {
            None
        };

        let mut fields = BTreeMap::new();
        for name in self.fields {
            let value = doc.get(name).unwrap_or("");
            fields.insert(name.to_string(), value.to_string());
        }

        Ok(ClassifiedMessage {
            record_id: record.id.clone(),
            sender: record.sender.clone(),
            subject: record.subject.clone(),
            timestamp: record.timestamp,
            message_type: self.message_type,
            fields,
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn extractor() -> StandardFormExtractor {
        StandardFormExtractor {
            message_type: MessageType::CheckIn,
            marker: "Winlink_Check_In",
            fields: &["call", "band", "mode", "comments"],
            location_overrides: &["maplat", "lat"],
        }
    }

    fn record_with_form(xml: &str) -> RawRecord {
        RawRecord {
            id: "m1".into(),
            sender: "W7ABC".into(),
            recipient_block: vec![],
            subject: "Winlink Check In".into(),
            timestamp: Utc::now(),
            body: String::new(),
            attachments: vec![(
                "RMS_Express_Form_Winlink_Check_In_Viewer.xml".into(),
                xml.as_bytes().to_vec(),
            )],
        }
    }

    #[test]
    fn extracts_fields_and_location_from_form() {
        let msg = extractor()
            .extract(&record_with_form(
                "<f><Call>W7ABC</Call><Band>40m</Band>\
                 <Latitude>47-32.23N</Latitude><Longitude>122-14.33W</Longitude></f>",
            ))
            .unwrap();
        assert_eq!(msg.message_type, MessageType::CheckIn);
        assert_eq!(msg.fields["call"], "W7ABC");
        assert_eq!(msg.fields["band"], "40m");
        // Absent optional fields are empty strings, not errors.
        assert_eq!(msg.fields["comments"], "");
        let loc = msg.location.unwrap();
        assert_eq!(loc.latitude, 47.53717);
    }

    #[test]
    fn missing_location_is_cant_parse_latlong() {
        let rej = extractor()
            .extract(&record_with_form("<f><Call>W7ABC</Call></f>"))
            .unwrap_err();
        assert_eq!(rej.reason, RejectReason::CantParseLatLong);
        assert!(rej.context.contains("maplat"), "context: {}", rej.context);
    }

    #[test]
    fn malformed_xml_is_processing_error() {
        let rej = extractor()
            .extract(&record_with_form("<f><Call>W7ABC</f>"))
            .unwrap_err();
        assert_eq!(rej.reason, RejectReason::ProcessingError);
    }

    #[test]
    fn non_utf8_attachment_is_processing_error() {
        let mut record = record_with_form("ignored");
        record.attachments[0].1 = vec![0xff, 0xfe, 0x00];
        let rej = extractor().extract(&record).unwrap_err();
        assert_eq!(rej.reason, RejectReason::ProcessingError);
    }

    #[test]
    fn attachmentless_record_reads_body_lines() {
        let mut record = record_with_form("ignored");
        record.attachments.clear();
        record.body = "Call: W7ABC\nBand: 80m\nLatitude: 47.5\nLongitude: -122.2\n".into();
        let msg = extractor().extract(&record).unwrap();
        assert_eq!(msg.fields["band"], "80m");
        assert_eq!(msg.location.unwrap().longitude, -122.2);
    }

    #[test]
    fn non_gis_type_skips_location() {
        let ics = StandardFormExtractor {
            message_type: MessageType::Ics213,
            marker: "ICS213",
            fields: &["to", "from", "message"],
            location_overrides: &[],
        };
        let mut record = record_with_form("<f><To>EOC</To><Message>supplies low</Message></f>");
        record.attachments[0].0 = "ICS213_form.xml".into();
        let msg = ics.extract(&record).unwrap();
        assert!(msg.location.is_none());
        assert_eq!(msg.fields["to"], "EOC");
        assert_eq!(msg.fields["message"], "supplies low");
    }
}
