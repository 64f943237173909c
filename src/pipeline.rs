//! Batch orchestration: read → sort → classify + extract → group →
//! dedup → smooth.
//!
//! One sequential pass, no shared mutable state between type groups.
//! Every input record ends up in exactly one place: a surviving
//! classified message or a rejection. `survivors + rejections ==
//! inputs` holds for every run.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::address::AddressResolver;
use crate::classify;
use crate::config::PipelineConfig;
use crate::dedup;
use crate::error::ReadError;
use crate::extract;
use crate::jitter::JitterQueue;
use crate::message::{ClassifiedMessage, MessageType, RawRecord, RejectReason, Rejection};
use crate::reader;

/// Field name the resolved destination is stored under.
const DESTINATION_FIELD: &str = "destination";

/// The collaborator-facing result of one batch.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// Deduplicated messages, grouped by type.
    pub messages: BTreeMap<MessageType, Vec<ClassifiedMessage>>,
    /// Everything that failed classification or extraction, plus
    /// dedup losers. Audit trail for downstream reporting.
    pub rejections: Vec<Rejection>,
}

impl PipelineOutput {
    /// Total surviving messages across all types.
    pub fn survivor_count(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }
}

/// Read a directory of exported files and run the batch over it.
pub fn run_dir(dir: &Path, config: &PipelineConfig) -> Result<PipelineOutput, ReadError> {
    let records = reader::read_dir(dir)?;
    Ok(run(records, config))
}

/// Run the pipeline over already-read records.
pub fn run(mut records: Vec<RawRecord>, config: &PipelineConfig) -> PipelineOutput {
    let total = records.len();

    // Dedup is later-wins and therefore order-sensitive; sorting by
    // composite timestamp (id as tie-break) makes the batch
    // independent of file-enumeration order.
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    let resolver = AddressResolver::new(config.address_preferences.clone());
    let mut grouped: BTreeMap<MessageType, Vec<ClassifiedMessage>> = BTreeMap::new();
    let mut rejections = Vec::new();

    for record in records {
        match process_record(&record, config, &resolver) {
            Ok(message) => grouped.entry(message.message_type).or_default().push(message),
            Err(rejection) => rejections.push(rejection),
        }
    }

    let mut messages = BTreeMap::new();
    let mut smoother = JitterQueue::new();
    for (ty, group) in grouped {
        let mut outcome = if ty.is_gis() {
            dedup::dedup_by_location(group, config.dedup_threshold_meters)
        } else if config.identity_dedup_types.contains(&ty) {
            dedup::dedup_by_sender(group)
        } else {
            dedup::DedupOutcome {
                survivors: group,
                rejections: Vec::new(),
            }
        };
        rejections.append(&mut outcome.rejections);

        if ty.is_gis() {
            smoother.smooth(&mut outcome.survivors);
        }
        messages.insert(ty, outcome.survivors);
    }

    let output = PipelineOutput {
        messages,
        rejections,
    };
    info!(
        inputs = total,
        survivors = output.survivor_count(),
        rejections = output.rejections.len(),
        "batch complete"
    );
    debug_assert_eq!(output.survivor_count() + output.rejections.len(), total);
    output
}

/// Classify and extract one record.
fn process_record(
    record: &RawRecord,
    config: &PipelineConfig,
    resolver: &AddressResolver,
) -> Result<ClassifiedMessage, Rejection> {
    let ty = classify::classify(record);

    if config.is_dump(&record.id, &record.sender) {
        debug!(
            id = %record.id,
            sender = %record.sender,
            subject = %record.subject,
            %ty,
            attachments = ?record.attachments.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            "dump record"
        );
    }

    if ty == MessageType::Unknown {
        return Err(Rejection::new(
            &record.id,
            RejectReason::UnsupportedType,
            format!("subject: {:?}", record.subject),
        ));
    }

    if let Some(required) = &config.required_types
        && !required.contains(&ty)
    {
        return Err(Rejection::new(
            &record.id,
            RejectReason::WrongMessageType,
            format!("classified as {ty}, not in operator filter"),
        ));
    }

    // The registry covers every non-Unknown type; Unknown returned above.
    let Some(extractor) = extract::extractor_for(ty) else {
        return Err(Rejection::new(
            &record.id,
            RejectReason::ProcessingError,
            format!("no extractor registered for {ty}"),
        ));
    };

    let mut message = extractor.extract(record)?;
    if let Some(destination) = resolver.resolve(&record.recipient_block) {
        message
            .fields
            .insert(DESTINATION_FIELD.to_string(), destination);
    }
    Ok(message)
}
