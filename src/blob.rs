// Blob encoding for record collections

use crate::error::BlobError;
use crate::record::Record;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Serialize an entire collection to a single JSON array
pub fn encode_collection<T: Record>(records: &[T]) -> Result<String, BlobError> {
    Ok(serde_json::to_string(records)?)
}

/// Parse a JSON array back into records, keeping insertion order
///
/// A payload that is not a valid array of `T` is an error for the caller to
/// handle. Records repeating an earlier id are dropped so the collection stays
/// unique by id; the first occurrence wins.
pub fn decode_collection<T: Record>(raw: &str) -> Result<Vec<T>, BlobError> {
    let parsed: Vec<T> = serde_json::from_str(raw)?;
    let total = parsed.len();

    let mut seen = HashSet::new();
    let records: Vec<T> = parsed
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.id().to_string());
            if !fresh {
                warn!(key = T::storage_key(), id = record.id(), "Duplicate record id in blob, skipping");
            }
            fresh
        })
        .collect();

    debug!(
        key = T::storage_key(),
        count = records.len(),
        skipped = total - records.len(),
        "Decoded collection"
    );

    Ok(records)
}
