//! Type-specific field extraction.
//!
//! One extractor per recognized message type, behind the
//! [`FormExtractor`] trait. Dispatch is a closed match over
//! [`MessageType`] so adding a variant without an extractor fails to
//! compile. Nothing escapes an extractor: every failure path becomes a
//! [`Rejection`].

mod dyfi;
mod incident;
mod standard;

pub use dyfi::DyfiExtractor;
pub use incident::IncidentReportExtractor;
pub use standard::StandardFormExtractor;

use crate::message::{ClassifiedMessage, MessageType, RawRecord, Rejection};

/// One message type's extraction strategy.
///
/// `extract` never panics and never returns a raw error — a record
/// either becomes a classified message or a rejection.
pub trait FormExtractor: Sync {
    fn extract(&self, record: &RawRecord) -> Result<ClassifiedMessage, Rejection>;
}

static CHECK_IN: StandardFormExtractor = StandardFormExtractor {
    message_type: MessageType::CheckIn,
    marker: "Winlink_Check_In",
    fields: &["call", "band", "mode", "comments"],
    location_overrides: &["maplat", "lat"],
};

static CHECK_OUT: StandardFormExtractor = StandardFormExtractor {
    message_type: MessageType::CheckOut,
    marker: "Winlink_Check_Out",
    fields: &["call", "band", "mode", "comments"],
    location_overrides: &["maplat", "lat"],
};

static FIELD_SITUATION: StandardFormExtractor = StandardFormExtractor {
    message_type: MessageType::FieldSituation,
    marker: "Field_Situation_Report",
    fields: &["city", "county", "state", "power", "water", "internet", "comments"],
    location_overrides: &["sitlatitude"],
};

static SEVERE_WEATHER: StandardFormExtractor = StandardFormExtractor {
    message_type: MessageType::SevereWeather,
    marker: "Severe_WX_Report",
    fields: &["city", "state", "event", "magnitude", "comments"],
    location_overrides: &["stormlat"],
};

static HOSPITAL_BED: StandardFormExtractor = StandardFormExtractor {
    message_type: MessageType::HospitalBed,
    marker: "Hospital_Bed_Report",
    fields: &["facility", "contact", "beds_available", "beds_total", "comments"],
    location_overrides: &["hosplatitude"],
};

static ICS213: StandardFormExtractor = StandardFormExtractor {
    message_type: MessageType::Ics213,
    marker: "ICS213",
    fields: &["to", "from", "subjectline", "message", "approvedby"],
    location_overrides: &[],
};

static DYFI: DyfiExtractor = DyfiExtractor;
static INCIDENT: IncidentReportExtractor = IncidentReportExtractor;

/// The extractor registered for a message type; `None` only for
/// `Unknown`, which the pipeline rejects before dispatch.
pub fn extractor_for(ty: MessageType) -> Option<&'static dyn FormExtractor> {
    match ty {
        MessageType::CheckIn => Some(&CHECK_IN),
        MessageType::CheckOut => Some(&CHECK_OUT),
        MessageType::FieldSituation => Some(&FIELD_SITUATION),
        MessageType::SevereWeather => Some(&SEVERE_WEATHER),
        MessageType::HospitalBed => Some(&HOSPITAL_BED),
        MessageType::Dyfi => Some(&DYFI),
        MessageType::Ics213 => Some(&ICS213),
        MessageType::IncidentReport => Some(&INCIDENT),
        MessageType::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn hospital_bed_form_fills_bed_count_fields() {
        let record = RawRecord {
            id: "m1".into(),
            sender: "W7ABC".into(),
            recipient_block: vec![],
            subject: "Hospital Bed Report".into(),
            timestamp: Utc::now(),
            body: String::new(),
            attachments: vec![(
                "RMS_Express_Form_Hospital_Bed_Report_Viewer.xml".into(),
                b"<f><Facility>Harborview</Facility><Beds_available>12</Beds_available>\
                  <Beds_total>40</Beds_total>\
                  <Latitude>47.61</Latitude><Longitude>-122.33</Longitude></f>"
                    .to_vec(),
            )],
        };
        let msg = extractor_for(MessageType::HospitalBed)
            .unwrap()
            .extract(&record)
            .unwrap();
        assert_eq!(msg.fields["facility"], "Harborview");
        assert_eq!(msg.fields["beds_available"], "12");
        assert_eq!(msg.fields["beds_total"], "40");
    }

    #[test]
    fn every_recognized_type_has_an_extractor() {
        for ty in [
            MessageType::CheckIn,
            MessageType::CheckOut,
            MessageType::FieldSituation,
            MessageType::SevereWeather,
            MessageType::HospitalBed,
            MessageType::Dyfi,
            MessageType::Ics213,
            MessageType::IncidentReport,
        ] {
            assert!(extractor_for(ty).is_some(), "missing extractor for {ty}");
        }
        assert!(extractor_for(MessageType::Unknown).is_none());
    }
}
