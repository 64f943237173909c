//! Duplicate-submission removal.
//!
//! Two policies, selected per message type:
//!
//! - **Location** (geolocated types): per-sender cluster lists. An
//!   incoming message within the distance threshold of any existing
//!   cluster point of the same sender is a duplicate; the
//!   chronologically later of the two survives. A sender far enough
//!   from all of their clusters starts a new one, so mobile operation
//!   legitimately keeps multiple points.
//! - **Identity** (non-geolocated types, opt-in): one survivor per
//!   sender, latest timestamp.
//!
//! Both scans are ordered and idempotent over their own output. The
//! pipeline sorts records by timestamp beforehand, so results don't
//! depend on file-enumeration order.

use std::collections::HashMap;

use tracing::debug;

use crate::geo;
use crate::message::{ClassifiedMessage, RejectReason, Rejection};

/// Default duplicate-location threshold in meters.
pub const DEFAULT_THRESHOLD_METERS: i64 = 100;

/// Survivors plus the rejections produced by one dedup pass.
#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub survivors: Vec<ClassifiedMessage>,
    pub rejections: Vec<Rejection>,
}

// ── Location policy ─────────────────────────────────────────────────

/// Location-based dedup over one type's messages, in input order.
///
/// Closeness is evaluated against the sender's *entire* cluster list
/// before a new cluster is added. A negative threshold disables the
/// pass entirely. Messages without a location pass through untouched.
pub fn dedup_by_location(messages: Vec<ClassifiedMessage>, threshold_meters: i64) -> DedupOutcome {
    if threshold_meters < 0 {
        return DedupOutcome {
            survivors: messages,
            rejections: Vec::new(),
        };
    }
    let threshold = threshold_meters as f64;

    // Slots keep input order; a slot is tombstoned to `None` when a
    // cascade removes its message. Per-sender cluster indices point
    // only at occupied slots.
    let mut slots: Vec<Option<ClassifiedMessage>> = Vec::new();
    let mut rejections = Vec::new();
    let mut clusters: HashMap<String, Vec<usize>> = HashMap::new();

    for incoming in messages {
        let Some(point) = incoming.location else {
            slots.push(Some(incoming));
            continue;
        };

        let indices = clusters.entry(incoming.sender.clone()).or_default();
        let close = indices.iter().copied().find(|&i| {
            slots[i]
                .as_ref()
                .and_then(|held| held.location)
                .is_some_and(|held| geo::distance_meters(held, point) <= threshold)
        });

        let Some(i) = close else {
            indices.push(slots.len());
            slots.push(Some(incoming));
            continue;
        };
        let Some(held) = slots[i].as_ref() else {
            continue; // indices never point at tombstoned slots
        };

        if incoming.timestamp > held.timestamp {
            debug!(
                loser = %held.record_id,
                survivor = %incoming.record_id,
                "same location, later message replaces cluster point"
            );
            rejections.push(Rejection::superseded(
                &held.record_id,
                RejectReason::SameLocation,
                format!("within {threshold_meters} m of a later report"),
                &incoming.record_id,
            ));
            slots[i] = Some(incoming);
            // The replacement moved this cluster's anchor; the sender's
            // other cluster points may now be within threshold of it
            // and must be resolved before the invariant holds again.
            cascade_from_anchor(&mut slots, indices, i, threshold_meters, &mut rejections);
        } else {
            debug!(
                loser = %incoming.record_id,
                survivor = %held.record_id,
                "same location, earlier message rejected"
            );
            rejections.push(Rejection::superseded(
                &incoming.record_id,
                RejectReason::SameLocation,
                format!("within {threshold_meters} m of a later report"),
                &held.record_id,
            ));
        }
    }

    DedupOutcome {
        survivors: slots.into_iter().flatten().collect(),
        rejections,
    }
}

/// Resolve collisions between a migrated cluster anchor and the
/// sender's other cluster points, later-wins, cascading until the
/// surviving set is pairwise beyond the threshold.
///
/// This keeps the pass idempotent: without it, a replacement could
/// move an anchor to within threshold of a neighboring cluster and
/// leave both standing, and a second run would find new duplicates.
fn cascade_from_anchor(
    slots: &mut [Option<ClassifiedMessage>],
    indices: &mut Vec<usize>,
    anchor: usize,
    threshold_meters: i64,
    rejections: &mut Vec<Rejection>,
) {
    let threshold = threshold_meters as f64;
    loop {
        let Some(anchor_msg) = slots[anchor].as_ref() else {
            return;
        };
        let Some(anchor_point) = anchor_msg.location else {
            return;
        };
        let anchor_ts = anchor_msg.timestamp;
        let anchor_id = anchor_msg.record_id.clone();

        let collision = indices.iter().copied().find(|&j| {
            j != anchor
                && slots[j]
                    .as_ref()
                    .and_then(|m| m.location)
                    .is_some_and(|p| geo::distance_meters(p, anchor_point) <= threshold)
        });
        let Some(j) = collision else {
            return;
        };
        let Some(other) = slots[j].as_ref() else {
            return;
        };

        if anchor_ts >= other.timestamp {
            debug!(
                loser = %other.record_id,
                survivor = %anchor_id,
                "migrated anchor absorbs neighboring cluster"
            );
            rejections.push(Rejection::superseded(
                &other.record_id,
                RejectReason::SameLocation,
                format!("within {threshold_meters} m of a later report"),
                &anchor_id,
            ));
            slots[j] = None;
            indices.retain(|&k| k != j);
        } else {
            rejections.push(Rejection::superseded(
                &anchor_id,
                RejectReason::SameLocation,
                format!("within {threshold_meters} m of a later report"),
                &other.record_id,
            ));
            slots[anchor] = None;
            indices.retain(|&k| k != anchor);
            // The neighbor kept its own point, so nothing migrated and
            // no further collisions are possible.
            return;
        }
    }
}

// ── Identity policy ─────────────────────────────────────────────────

/// Identity-based dedup: exactly one survivor per sender, the latest
/// by composite timestamp.
pub fn dedup_by_sender(messages: Vec<ClassifiedMessage>) -> DedupOutcome {
    let mut survivors: Vec<ClassifiedMessage> = Vec::new();
    let mut rejections = Vec::new();
    let mut held: HashMap<String, usize> = HashMap::new();

    for incoming in messages {
        match held.get(&incoming.sender) {
            Some(&i) => {
                if incoming.timestamp > survivors[i].timestamp {
                    rejections.push(Rejection::superseded(
                        &survivors[i].record_id,
                        RejectReason::SameCall,
                        "earlier submission from the same call sign",
                        &incoming.record_id,
                    ));
                    survivors[i] = incoming;
                } else {
                    rejections.push(Rejection::superseded(
                        &incoming.record_id,
                        RejectReason::SameCall,
                        "earlier submission from the same call sign",
                        &survivors[i].record_id,
                    ));
                }
            }
            None => {
                held.insert(incoming.sender.clone(), survivors.len());
                survivors.push(incoming);
            }
        }
    }

    DedupOutcome {
        survivors,
        rejections,
    }
}
