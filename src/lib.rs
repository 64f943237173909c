//! Ingestion pipeline for exported Winlink exercise messages.
//!
//! Reads radio-relayed email exports, classifies each message by its
//! form attachment or subject, extracts typed fields (including
//! multi-notation geocoordinates), and removes duplicate submissions
//! before downstream validation and reporting run.

pub mod address;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod forms;
pub mod geo;
pub mod jitter;
pub mod message;
pub mod pipeline;
pub mod reader;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use geo::GeoPoint;
pub use message::{ClassifiedMessage, MessageType, RawRecord, RejectReason, Rejection};
pub use pipeline::{PipelineOutput, run, run_dir};
