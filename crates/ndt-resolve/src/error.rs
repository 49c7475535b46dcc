//! Error types for build request resolution.

use ndt_catalog::CatalogError;

use crate::stl::StlSelection;

/// Errors from resolving a build request.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A catalog lookup rejected the request (unknown ABI, level below
    /// minimum). User input error.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The selected STL is not available for the requested ABI.
    /// User input error.
    #[error("STL '{selection}' is not available for ABI '{abi}' (supported: {})", .supported.join(", "))]
    UnsupportedStl {
        /// The rejected selection.
        selection: StlSelection,
        /// The ABI it was requested for.
        abi: &'static str,
        /// STL selections that are valid for that ABI.
        supported: Vec<&'static str>,
    },

    /// The embedded catalog data contradicts itself (e.g. an effective
    /// API level with no versioned library directory). This is a defect
    /// in the catalogs, not in the request; callers should abort the
    /// build rather than continue toward a silently wrong binary.
    #[error("internal catalog inconsistency: {detail}")]
    CatalogInconsistency {
        /// What contradicted what.
        detail: String,
    },
}

impl ResolveError {
    /// Whether this error signals a defect in the embedded catalog
    /// data rather than bad user input. Fatal errors should abort the
    /// build; the others can be surfaced to the user and retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ResolveError::CatalogInconsistency { .. })
    }
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
