//! Output smoothing for co-located survivors.
//!
//! Several operators reporting from the same site (or one operator's
//! check-in and check-out) produce identical coordinates, which stack
//! into a single map pin downstream. The smoother nudges every message
//! after the first in a co-located group by a small offset drawn from a
//! per-run shuffled queue. Owning the queue per run keeps repeated
//! batches free of hidden shared state.

use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::geo::GeoPoint;
use crate::message::ClassifiedMessage;

/// One grid step of offset, in degrees (roughly 20 m of latitude).
const STEP_DEGREES: f64 = 0.0002;

/// A shuffled queue of small lat/lon offsets, refilled on exhaustion.
pub struct JitterQueue {
    offsets: VecDeque<(f64, f64)>,
    rng: StdRng,
}

impl JitterQueue {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut queue = Self {
            offsets: VecDeque::new(),
            rng,
        };
        queue.refill();
        queue
    }

    /// Regenerate the offset grid (a ring around the origin, origin
    /// excluded) and shuffle it onto the queue.
    fn refill(&mut self) {
        let steps = [-2.0, -1.0, 0.0, 1.0, 2.0];
        let mut grid: Vec<(f64, f64)> = steps
            .iter()
            .flat_map(|&dy| steps.iter().map(move |&dx| (dy * STEP_DEGREES, dx * STEP_DEGREES)))
            .filter(|&(dy, dx)| dy != 0.0 || dx != 0.0)
            .collect();
        grid.shuffle(&mut self.rng);
        self.offsets.extend(grid);
    }

    /// Next offset pair, refilling as needed.
    fn next_offset(&mut self) -> (f64, f64) {
        if self.offsets.is_empty() {
            self.refill();
        }
        // refill always produces a non-empty grid
        self.offsets.pop_front().unwrap_or((STEP_DEGREES, STEP_DEGREES))
    }

    /// Nudge every co-located message after the first in its group.
    ///
    /// Messages with distinct coordinates (and those without any) are
    /// left untouched. This is the one post-extraction mutation of a
    /// `ClassifiedMessage`.
    pub fn smooth(&mut self, messages: &mut [ClassifiedMessage]) {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for message in messages.iter_mut() {
            let Some(point) = message.location else {
                continue;
            };
            let key = format!("{:.5},{:.5}", point.latitude, point.longitude);
            let count = seen.entry(key).or_insert(0);
            if *count > 0 {
                let (dy, dx) = self.next_offset();
                if let Some(moved) = GeoPoint::new(point.latitude + dy, point.longitude + dx) {
                    message.location = Some(moved);
                }
            }
            *count += 1;
        }
    }
}

impl Default for JitterQueue {
    fn default() -> Self {
        Self::new()
    }
}
