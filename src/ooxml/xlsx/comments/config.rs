//! Configuration types for comment projection and batch processing.
//!
//! This module defines the options used to control how out-of-range author
//! references are reported and when multiple parts are processed in parallel.

/// How [`to_public_view_with`](super::view::to_public_view_with) reacts to
/// an entry whose author index has no matching author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop at the first offending entry and return its error
    #[default]
    FailFast,
    /// Check every entry, then fail with all errors collected
    CollectAndFail,
    /// Skip offending entries, returning them next to the valid comments
    ReportAndSkip,
}

/// Configuration options for the forward projection.
///
/// # Examples
///
/// ```rust
/// use litchi_comments::ooxml::xlsx::comments::{ErrorPolicy, ProjectionOptions};
///
/// let options = ProjectionOptions::new().with_error_policy(ErrorPolicy::ReportAndSkip);
/// assert_eq!(options.error_policy, ErrorPolicy::ReportAndSkip);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Reaction to out-of-range author indices
    pub error_policy: ErrorPolicy,
}

impl ProjectionOptions {
    /// Create a new `ProjectionOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error policy.
    #[inline]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}

/// Minimum number of parts before batch operations go parallel.
pub const PARALLEL_THRESHOLD: usize = 4;

/// Configuration options for processing several comment parts at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Whether to use rayon for large batches
    pub use_parallel: bool,
    /// Batch size from which the parallel path is taken
    pub parallel_threshold: usize,
    /// Options applied to every projected part
    pub projection: ProjectionOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            use_parallel: true,
            parallel_threshold: PARALLEL_THRESHOLD,
            projection: ProjectionOptions::default(),
        }
    }
}

impl BatchOptions {
    /// Create a new `BatchOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel processing.
    #[inline]
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Set the batch size from which the parallel path is taken.
    #[inline]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Set the projection options used for each part.
    #[inline]
    pub fn with_projection(mut self, projection: ProjectionOptions) -> Self {
        self.projection = projection;
        self
    }

    /// Whether a batch of `len` parts should be processed in parallel.
    pub(crate) fn parallel_for(&self, len: usize) -> bool {
        self.use_parallel && len >= self.parallel_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(ProjectionOptions::default().error_policy, ErrorPolicy::FailFast);
        let batch = BatchOptions::default();
        assert!(batch.use_parallel);
        assert!(!batch.parallel_for(PARALLEL_THRESHOLD - 1));
        assert!(batch.parallel_for(PARALLEL_THRESHOLD));
    }

    #[test]
    fn test_builder() {
        let batch = BatchOptions::new()
            .with_parallel(false)
            .with_parallel_threshold(1)
            .with_projection(ProjectionOptions::new().with_error_policy(ErrorPolicy::CollectAndFail));
        assert!(!batch.parallel_for(100));
        assert_eq!(batch.projection.error_policy, ErrorPolicy::CollectAndFail);
    }
}
