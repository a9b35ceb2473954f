use thiserror::Error;

/// Result type alias for code construction and decoding.
pub type Result<T> = std::result::Result<T, DecodingError>;

/// Everything that can go wrong while building a code or decoding a
/// syndrome. All variants are fatal for the failing call; nothing is
/// retried inside the decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodingError {
    /// Structural defect in the parity-check matrix; fails construction.
    #[error("malformed parity-check matrix: {reason}")]
    MalformedCode { reason: String },

    /// The caller handed over a syndrome of the wrong length; fails that
    /// decode call only.
    #[error("syndrome has {found} entries but the code has {expected} checks")]
    SyndromeLengthMismatch { expected: usize, found: usize },

    /// The growth loop ran past its theoretical round bound. Should never
    /// happen for a well-formed code and a syndrome reachable from a
    /// physical error.
    #[error("cluster growth exceeded {bound} rounds without all clusters becoming valid")]
    ClusterGrowthOverflow { bound: usize },
}
