//! Record Merger
//!
//! Folds per-tier records into one canonical record.
//!
//! # Rule
//! For each field of the incoming record, the result takes the incoming
//! value only when the result has no value for that field yet, holds
//! `Unknown`, or got its value from a strictly lower-precedence tier.
//! Incoming `Unknown` never replaces a value. Provenance moves with the value.
//!
//! The merge is a fold: applying it zero, one or many times is well defined,
//! and reapplying an already-incorporated record changes nothing.

use crate::types::{AttributeValue, CanonicalRecord, SourceKind};
use tracing::debug;

pub struct RecordMerger;

impl RecordMerger {
    /// Merge `incoming`, supplied by tier `source`, into `existing`
    ///
    /// With no existing record the result starts empty under the incoming
    /// identifier.
    pub fn merge(
        existing: Option<CanonicalRecord>,
        incoming: &CanonicalRecord,
        source: SourceKind,
    ) -> CanonicalRecord {
        let mut result =
            existing.unwrap_or_else(|| CanonicalRecord::new(incoming.identifier()));

        let mut written = 0usize;
        for (field, value) in incoming.attributes() {
            if should_write(&result, field, value, source) {
                result.set(field.clone(), value.clone(), Some(source));
                written += 1;
            }
        }

        debug!(
            identifier = %result.identifier(),
            tier = %source,
            offered = incoming.attributes().len(),
            written = written,
            "Merged tier record"
        );

        result
    }

    /// Merge a sequence of `(record, tier)` pairs in order
    pub fn fold<'a, I>(records: I) -> Option<CanonicalRecord>
    where
        I: IntoIterator<Item = (&'a CanonicalRecord, SourceKind)>,
    {
        records.into_iter().fold(None, |acc, (record, source)| {
            Some(Self::merge(acc, record, source))
        })
    }
}

fn should_write(
    result: &CanonicalRecord,
    field: &str,
    incoming: &AttributeValue,
    source: SourceKind,
) -> bool {
    let Some(current) = result.get(field) else {
        return true;
    };

    if !incoming.is_known() {
        return false;
    }

    if !current.is_known() {
        return true;
    }

    match result.source_of(field) {
        Some(current_source) => source.outranks(current_source),
        None => true,
    }
}
