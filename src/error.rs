//! Error types for path-corpus generation.

/// Error type for path-corpus generation.
///
/// Every variant is fatal for the whole run: the coordinator aborts on the
/// first error and no output file is written.
#[derive(Debug, thiserror::Error)]
pub enum PathGenError {
    /// Invalid run parameters (zero total, out-of-range proportion, bad
    /// date bounds, malformed mix file). Raised before any work starts.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A seed source holds fewer distinct values than the quota that will
    /// be drawn from it in one pass. Raised before any network call.
    #[error("seed source '{source_name}' has {available} values but {needed} are needed")]
    InsufficientSeedData {
        /// Name of the seed source (category or file)
        source_name: String,
        /// Distinct values available
        available: usize,
        /// Distinct values the run would draw in one pass
        needed: usize,
    },

    /// The record API call failed: transport error, non-success status, or
    /// a payload we could not interpret. Not retried.
    #[error("record API query failed: {0}")]
    ExternalQuery(String),

    /// The resolution loop hit its attempt cap before collecting enough
    /// identifiers (e.g. every sampled window returned an empty page).
    #[error(
        "gave up resolving identifiers for '{category}' after {attempts} queries \
         ({collected}/{needed} collected)"
    )]
    ExternalQueryExhausted {
        /// Category whose resolution was abandoned
        category: String,
        /// Queries issued before giving up
        attempts: u32,
        /// Identifiers collected so far
        collected: usize,
        /// Identifiers the quota required
        needed: usize,
    },
}
