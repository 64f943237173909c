//! Bulk reading of exported message files.
//!
//! Each input file holds one or more RFC-2822 envelopes (mbox-style
//! `From ` separators when there are several). The envelope body itself
//! carries the forwarded header block — `To:`/`Cc:` candidate lines
//! terminated by `Message-ID:` — which feeds the address resolver.
//! Unreadable or unparseable files are skipped with a warning; bad
//! input data never aborts a batch.

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use mail_parser::{MessageParser, MimeHeaders};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ReadError;
use crate::message::RawRecord;

/// Read every file in a directory into raw records.
///
/// Files are visited in name order for reproducible logs; the pipeline
/// sorts records by timestamp regardless, so enumeration order never
/// affects results.
pub fn read_dir(dir: &Path) -> Result<Vec<RawRecord>, ReadError> {
    if !dir.is_dir() {
        return Err(ReadError::NotADirectory(dir.display().to_string()));
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut records = Vec::new();
    for path in paths {
        match read_file(&path) {
            Ok(mut batch) => {
                debug!(file = %path.display(), count = batch.len(), "read envelopes");
                records.append(&mut batch);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable file");
            }
        }
    }
    Ok(records)
}

/// Read one exported file into raw records.
pub fn read_file(path: &Path) -> Result<Vec<RawRecord>, ReadError> {
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    if content.trim().is_empty() {
        return Err(ReadError::Malformed {
            file: path.display().to_string(),
            reason: "empty file".into(),
        });
    }

    let mut records = Vec::new();
    for envelope in split_envelopes(&content) {
        match parse_envelope(envelope) {
            Some(record) => records.push(record),
            None => warn!(file = %path.display(), "skipping unparseable envelope"),
        }
    }
    if records.is_empty() {
        return Err(ReadError::Malformed {
            file: path.display().to_string(),
            reason: "no parseable envelopes".into(),
        });
    }
    Ok(records)
}

/// Split mbox-style multi-envelope content on `From ` separator lines;
/// a file without separators is a single envelope.
///
/// Only lines with the real separator shape (`From <addr> <date>`)
/// split; a body line that merely begins with the word "From" stays
/// inside its envelope, and `>From ` escapes are undone.
fn split_envelopes(content: &str) -> Vec<String> {
    if !content.lines().next().is_some_and(is_mbox_separator) {
        return vec![content.to_string()];
    }

    let mut envelopes = Vec::new();
    let mut current = String::new();
    for line in content.lines() {
        if is_mbox_separator(line) {
            if !current.trim().is_empty() {
                envelopes.push(std::mem::take(&mut current));
            }
            continue; // separator line is not part of the envelope
        }
        // mbox writers escape body lines that would look like a
        // separator by prefixing one '>'.
        if let Some(rest) = line.strip_prefix(">From ") {
            current.push_str("From ");
            current.push_str(rest);
        } else {
            current.push_str(line);
        }
        current.push('\n');
    }
    if !current.trim().is_empty() {
        envelopes.push(current);
    }
    envelopes
}

/// An mbox separator line is `From <envelope-addr> <date>`: the word
/// `From`, an address token containing `@`, and a date after it.
fn is_mbox_separator(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("From ") else {
        return false;
    };
    let mut tokens = rest.split_whitespace();
    tokens.next().is_some_and(|addr| addr.contains('@')) && tokens.next().is_some()
}

/// Parse one envelope into a raw record.
fn parse_envelope(raw: String) -> Option<RawRecord> {
    let parsed = MessageParser::default().parse(raw.as_bytes())?;

    let id = parsed
        .message_id()
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let sender = call_sign(&parsed);
    let subject = parsed.subject().unwrap_or_default().to_string();
    let timestamp = parsed
        .date()
        .and_then(|d| Utc.timestamp_opt(d.to_timestamp(), 0).single())
        .unwrap_or(DateTime::UNIX_EPOCH);
    let body = parsed
        .body_text(0)
        .map(|t| t.to_string())
        .unwrap_or_default();

    let mut recipient_block = recipient_candidates(&body);
    if recipient_block.is_empty() {
        recipient_block = header_addresses(&parsed);
    }

    let attachments = parsed
        .attachments()
        .map(|part| {
            let name = part
                .attachment_name()
                .unwrap_or("unnamed")
                .to_string();
            (name, part.contents().to_vec())
        })
        .collect();

    Some(RawRecord {
        id,
        sender,
        recipient_block,
        subject,
        timestamp,
        body,
        attachments,
    })
}

/// Sender call sign: upper-cased local part of the From address.
fn call_sign(parsed: &mail_parser::Message) -> String {
    parsed
        .from()
        .and_then(|addr| addr.first())
        .and_then(|a| a.address())
        .map(|s| s.split('@').next().unwrap_or(s).to_ascii_uppercase())
        .unwrap_or_else(|| "UNKNOWN".into())
}

/// Candidate destination addresses from the forwarded header block in
/// the body: To lines first, then Cc lines, each cleaned (label
/// removed, trailing comma stripped, trimmed). `Message-ID:` ends the
/// block.
fn recipient_candidates(body: &str) -> Vec<String> {
    let mut tos = Vec::new();
    let mut ccs = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("Message-ID:") {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("To:") {
            push_cleaned(&mut tos, value);
        } else if let Some(value) = trimmed.strip_prefix("Cc:") {
            push_cleaned(&mut ccs, value);
        }
    }

    tos.extend(ccs);
    tos
}

fn push_cleaned(out: &mut Vec<String>, value: &str) {
    let cleaned = value.trim().trim_end_matches(',').trim();
    if !cleaned.is_empty() {
        out.push(cleaned.to_string());
    }
}

/// Fallback candidates from the real To/Cc headers when the body
/// carries no forwarded block.
fn header_addresses(parsed: &mail_parser::Message) -> Vec<String> {
    let mut out = Vec::new();
    for addr in [parsed.to(), parsed.cc()].into_iter().flatten() {
        match addr {
            mail_parser::Address::List(list) => {
                out.extend(list.iter().filter_map(|a| a.address().map(String::from)));
            }
            mail_parser::Address::Group(groups) => {
                out.extend(groups.iter().flat_map(|g| {
                    g.addresses.iter().filter_map(|a| a.address().map(String::from))
                }));
            }
        }
    }
    out
}
