//! Traversal budgets applied while walking input trees.

/// Hard caps consumed by the target iterators.
///
/// Exceeding a cap silently truncates traversal; budgets are never an
/// error. Supplied at context construction and shared by every condition
/// evaluated within that context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum container nesting depth explored below a root value.
    pub max_container_depth: usize,
    /// Maximum number of elements visited per container; later siblings
    /// are skipped.
    pub max_container_size: usize,
    /// Maximum string length handed to match operators; longer strings are
    /// truncated.
    pub max_string_length: usize,
    /// Maximum leaves matched against per condition invocation.
    pub max_matched_leaves: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_container_depth: 20,
            max_container_size: 256,
            max_string_length: 4096,
            max_matched_leaves: 512,
        }
    }
}
