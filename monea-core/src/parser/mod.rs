//! SMS parsing: classification and per-bank field extraction
//!
//! Everything here is a pure function of the input message; parsing never
//! touches the store and can run concurrently across messages.

pub mod amount;
pub mod banks;
pub mod classifier;
pub mod date;
pub mod merchant;

use chrono::{DateTime, Utc};

use crate::domain::{CandidateSource, FailedExtraction, FailureReason, TransactionCandidate};

pub use classifier::{Classified, MessageKind};

/// Classify a raw message and extract a transaction candidate.
///
/// This is the single entry point both ingestion paths (realtime push and
/// bulk historical scan) go through. Failure is a value, not an error: the
/// returned `FailedExtraction` is ready to be queued for reprocessing.
pub fn classify_and_extract(
    sender: &str,
    body: &str,
    received_at: DateTime<Utc>,
    source: CandidateSource,
) -> Result<TransactionCandidate, Box<FailedExtraction>> {
    let classified = match classifier::classify(sender, body) {
        Some(c) => c,
        None => {
            return Err(Box::new(FailedExtraction::new(
                sender,
                body,
                source,
                FailureReason::UnrecognizedBank,
                received_at,
            )))
        }
    };

    banks::extract(&classified, body, received_at, source).map_err(|reason| {
        Box::new(FailedExtraction::new(
            sender, body, source, reason, received_at,
        ))
    })
}
