//! End-to-end batch test: exported files on disk through the full
//! pipeline.

use std::collections::BTreeSet;
use std::fs;

use tempfile::TempDir;

use wl_ingest::address::AddressPreferences;
use wl_ingest::{MessageType, PipelineConfig, RejectReason, run_dir};

/// An exported check-in envelope with a form attachment.
fn check_in_envelope(id: &str, call: &str, time: &str, lat: &str, lon: &str) -> String {
    format!(
        "Message-ID: <{id}@winlink.org>\r\n\
From: {call}@winlink.org\r\n\
Subject: Winlink Check In {call}\r\n\
Date: {time}\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"BOUND\"\r\n\
\r\n\
--BOUND\r\n\
Content-Type: text/plain\r\n\
\r\n\
To: ETO-BK@winlink.org,\r\n\
Cc: QTH@example.com\r\n\
Message-ID: {id}\r\n\
\r\n\
--BOUND\r\n\
Content-Type: application/xml; name=\"RMS_Express_Form_Winlink_Check_In_Viewer.xml\"\r\n\
Content-Disposition: attachment; filename=\"RMS_Express_Form_Winlink_Check_In_Viewer.xml\"\r\n\
\r\n\
<f><Call>{call}</Call><Band>40m</Band><Mode>JS8</Mode>\
<Latitude>{lat}</Latitude><Longitude>{lon}</Longitude></f>\r\n\
--BOUND--\r\n"
    )
}

fn incident_envelope(id: &str, call: &str, time: &str, body: &str) -> String {
    format!(
        "Message-ID: <{id}@winlink.org>\r\n\
From: {call}@winlink.org\r\n\
Subject: INCIDENT REPORT\r\n\
Date: {time}\r\n\
\r\n\
{body}\r\n"
    )
}

fn config() -> PipelineConfig {
    PipelineConfig {
        address_preferences: AddressPreferences::from_lists("ETO", "", "QTH", ""),
        ..PipelineConfig::default()
    }
}

#[test]
fn full_batch_classifies_dedups_and_accounts_for_every_record() {
    let dir = TempDir::new().unwrap();

    // Two same-spot check-ins from one call, ten minutes apart.
    fs::write(
        dir.path().join("export_1.txt"),
        check_in_envelope(
            "M1",
            "W7ABC",
            "Thu, 12 Mar 2026 18:00:00 +0000",
            "47-32.23N",
            "122-14.33W",
        ),
    )
    .unwrap();
    fs::write(
        dir.path().join("export_2.txt"),
        check_in_envelope(
            "M2",
            "W7ABC",
            "Thu, 12 Mar 2026 18:10:00 +0000",
            "47-32.23N",
            "122-14.33W",
        ),
    )
    .unwrap();
    // A distant check-in from another call.
    fs::write(
        dir.path().join("export_3.txt"),
        check_in_envelope(
            "M3",
            "K7XYZ",
            "Thu, 12 Mar 2026 18:05:00 +0000",
            "45.52",
            "-122.67",
        ),
    )
    .unwrap();
    // A free-text incident report with a first-line pair.
    fs::write(
        dir.path().join("export_4.txt"),
        incident_envelope(
            "M4",
            "N0CALL",
            "Thu, 12 Mar 2026 18:07:00 +0000",
            "47.61 -122.33 at the overpass\nTree blocking both lanes.",
        ),
    )
    .unwrap();
    // An unclassifiable message.
    fs::write(
        dir.path().join("export_5.txt"),
        incident_envelope("M5", "N0CALL", "Thu, 12 Mar 2026 18:08:00 +0000", "hi")
            .replace("Subject: INCIDENT REPORT", "Subject: checking the radio"),
    )
    .unwrap();
    // A corrupt file, skipped with a warning.
    fs::write(dir.path().join("export_6.txt"), "").unwrap();

    let out = run_dir(dir.path(), &config()).unwrap();

    // 5 parseable inputs: survivors + rejections account for all.
    assert_eq!(out.survivor_count() + out.rejections.len(), 5);

    let check_ins = &out.messages[&MessageType::CheckIn];
    assert_eq!(check_ins.len(), 2);
    let m2 = check_ins
        .iter()
        .find(|m| m.record_id == "M2@winlink.org")
        .expect("later same-spot check-in survives");
    assert_eq!(m2.fields["call"], "W7ABC");
    assert_eq!(m2.fields["band"], "40m");
    assert_eq!(m2.fields["destination"], "ETO-BK");
    assert_eq!(m2.location.unwrap().latitude, 47.53717);

    let dup = out
        .rejections
        .iter()
        .find(|r| r.reason == RejectReason::SameLocation)
        .expect("earlier same-spot check-in rejected");
    assert_eq!(dup.record_id, "M1@winlink.org");
    assert_eq!(dup.superseded_by.as_deref(), Some("M2@winlink.org"));

    let incidents = &out.messages[&MessageType::IncidentReport];
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].location.unwrap().latitude, 47.61);
    assert_eq!(incidents[0].fields["comments"], "Tree blocking both lanes.");

    assert!(
        out.rejections
            .iter()
            .any(|r| r.reason == RejectReason::UnsupportedType)
    );
}

#[test]
fn negative_threshold_keeps_every_survivor() {
    let dir = TempDir::new().unwrap();
    for (id, minutes) in [("M1", "00"), ("M2", "10")] {
        fs::write(
            dir.path().join(format!("{id}.txt")),
            check_in_envelope(
                id,
                "W7ABC",
                &format!("Thu, 12 Mar 2026 18:{minutes}:00 +0000"),
                "47.61",
                "-122.33",
            ),
        )
        .unwrap();
    }

    let cfg = PipelineConfig {
        dedup_threshold_meters: -1,
        ..config()
    };
    let out = run_dir(dir.path(), &cfg).unwrap();
    assert_eq!(out.messages[&MessageType::CheckIn].len(), 2);
    assert!(out.rejections.is_empty());
}

#[test]
fn type_filter_rejects_other_types() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("m1.txt"),
        check_in_envelope(
            "M1",
            "W7ABC",
            "Thu, 12 Mar 2026 18:00:00 +0000",
            "47.61",
            "-122.33",
        ),
    )
    .unwrap();

    let cfg = PipelineConfig {
        required_types: Some(BTreeSet::from([MessageType::FieldSituation])),
        ..config()
    };
    let out = run_dir(dir.path(), &cfg).unwrap();
    assert_eq!(out.survivor_count(), 0);
    assert_eq!(out.rejections[0].reason, RejectReason::WrongMessageType);
}
