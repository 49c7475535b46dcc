//! Error types for catalog lookups.

/// Errors from ABI and API-level catalog lookups.
///
/// Both variants are user-input errors: they echo the offending value
/// and the valid alternatives so a build tool can surface them directly.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The requested architecture/ABI string matched no catalog row.
    #[error("unknown ABI '{requested}' (supported: {})", .known.join(", "))]
    UnknownAbi {
        /// The string the caller asked for, verbatim.
        requested: String,
        /// Names of all catalog rows, in table order.
        known: Vec<&'static str>,
    },

    /// The requested API level is below the architecture's minimum.
    #[error("API level {requested} is below the minimum supported level {minimum} for {abi}")]
    BelowMinimum {
        /// The level the caller asked for.
        requested: u32,
        /// The smallest supported level for this ABI.
        minimum: u32,
        /// The ABI whose table rejected the request.
        abi: &'static str,
    },
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
