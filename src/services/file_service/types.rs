use serde::Serialize;

/// Result of a bulk move/delete: how many items were touched and which
/// ids were skipped (missing, not writable, or conflicting).
#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub processed: usize,
    pub skipped: Vec<String>,
}
