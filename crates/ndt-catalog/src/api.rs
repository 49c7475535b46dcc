//! API level catalog.
//!
//! Not every OS release ships new native platform content, so the
//! supported-level sequence is sparse relative to the full integer
//! range (levels 20 and 25 have no entries). Lookups use
//! floor semantics: the effective level is the largest supported level
//! at or below the request.

use serde::Serialize;

use crate::abi::Abi;
use crate::error::{CatalogError, Result};

/// Supported levels for 32-bit architectures, strictly increasing.
static LEVELS_32: &[u32] = &[14, 15, 16, 17, 18, 19, 21, 22, 23, 24, 26, 27, 28];

/// Supported levels for 64-bit architectures, strictly increasing.
/// 64-bit support starts at 21.
static LEVELS_64: &[u32] = &[21, 22, 23, 24, 26, 27, 28];

/// Outcome of an API level lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelResolution {
    /// The level the request resolved to.
    pub effective: u32,
    /// Set when the effective level differs from the request (floor
    /// lookup or preview clamp); carries the original request.
    pub clamped_from: Option<u32>,
    /// The request was above the newest known level. The caller must
    /// surface this; clamping to a preview level is never silent.
    pub preview: bool,
}

/// The process-wide API level table. Immutable after construction.
#[derive(Debug, Clone)]
pub struct ApiLevelCatalog {
    levels_32: &'static [u32],
    levels_64: &'static [u32],
}

impl ApiLevelCatalog {
    /// The built-in level tables.
    pub fn builtin() -> Self {
        Self {
            levels_32: LEVELS_32,
            levels_64: LEVELS_64,
        }
    }

    /// The supported levels for an ABI, strictly increasing.
    pub fn supported_levels(&self, abi: &Abi) -> &[u32] {
        if abi.arch.is_64bit() {
            self.levels_64
        } else {
            self.levels_32
        }
    }

    /// Smallest supported level for an ABI.
    pub fn min_level(&self, abi: &Abi) -> u32 {
        self.supported_levels(abi)[0]
    }

    /// Largest known level for an ABI.
    pub fn max_level(&self, abi: &Abi) -> u32 {
        *self.supported_levels(abi).last().expect("level table is never empty")
    }

    /// Whether a level is an exact member of the ABI's table.
    pub fn is_supported(&self, abi: &Abi, level: u32) -> bool {
        self.supported_levels(abi).binary_search(&level).is_ok()
    }

    /// Resolve a requested level to the effective level for an ABI.
    ///
    /// Exact matches win. Otherwise the largest supported level at or
    /// below the request is used and `clamped_from` records the
    /// original. Requests above the newest known level resolve to that
    /// newest level with `preview` set. Requests below the minimum fail
    /// with [`CatalogError::BelowMinimum`]; there is no silent clamp
    /// downward past the table.
    pub fn resolve(&self, abi: &Abi, requested: u32) -> Result<LevelResolution> {
        let levels = self.supported_levels(abi);
        let minimum = levels[0];
        if requested < minimum {
            return Err(CatalogError::BelowMinimum {
                requested,
                minimum,
                abi: abi.name,
            });
        }

        let maximum = *levels.last().expect("level table is never empty");
        if requested > maximum {
            return Ok(LevelResolution {
                effective: maximum,
                clamped_from: Some(requested),
                preview: true,
            });
        }

        let effective = match levels.binary_search(&requested) {
            Ok(_) => requested,
            Err(insert_at) => levels[insert_at - 1],
        };
        Ok(LevelResolution {
            effective,
            clamped_from: (effective != requested).then_some(requested),
            preview: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::AbiCatalog;

    fn catalogs() -> (AbiCatalog, ApiLevelCatalog) {
        (AbiCatalog::builtin(), ApiLevelCatalog::builtin())
    }

    #[test]
    fn exact_levels_resolve_to_themselves() {
        let (abis, api) = catalogs();
        for abi in abis.rows() {
            for &level in api.supported_levels(abi) {
                let res = api.resolve(abi, level).unwrap();
                assert_eq!(res.effective, level);
                assert_eq!(res.clamped_from, None);
                assert!(!res.preview);
            }
        }
    }

    #[test]
    fn gap_levels_floor_to_previous() {
        let (abis, api) = catalogs();
        let arm = abis.resolve("armeabi-v7a").unwrap();

        // 20 ships no native content; floor to 19.
        let res = api.resolve(arm, 20).unwrap();
        assert_eq!(res.effective, 19);
        assert_eq!(res.clamped_from, Some(20));
        assert!(!res.preview);

        // 25 ships no native content; floor to 24.
        let res = api.resolve(arm, 25).unwrap();
        assert_eq!(res.effective, 24);
        assert_eq!(res.clamped_from, Some(25));
    }

    #[test]
    fn below_minimum_fails_never_clamps() {
        let (abis, api) = catalogs();
        let arm = abis.resolve("armeabi-v7a").unwrap();
        let err = api.resolve(arm, 9).unwrap_err();
        match err {
            CatalogError::BelowMinimum {
                requested,
                minimum,
                abi,
            } => {
                assert_eq!(requested, 9);
                assert_eq!(minimum, 14);
                assert_eq!(abi, "armeabi-v7a");
            }
            other => panic!("unexpected error: {other}"),
        }

        let arm64 = abis.resolve("arm64-v8a").unwrap();
        assert!(api.resolve(arm64, 19).is_err());
    }

    #[test]
    fn above_maximum_clamps_with_preview_flag() {
        let (abis, api) = catalogs();
        let x86 = abis.resolve("x86").unwrap();
        let res = api.resolve(x86, 100).unwrap();
        assert_eq!(res.effective, 28);
        assert_eq!(res.clamped_from, Some(100));
        assert!(res.preview);
    }

    #[test]
    fn sixty_four_bit_minimum_is_21() {
        let (abis, api) = catalogs();
        let arm64 = abis.resolve("arm64-v8a").unwrap();
        let x86_64 = abis.resolve("x86_64").unwrap();
        assert_eq!(api.min_level(arm64), 21);
        assert_eq!(api.min_level(x86_64), 21);
        assert_eq!(api.min_level(abis.resolve("x86").unwrap()), 14);
    }

    #[test]
    fn tables_are_strictly_increasing() {
        let api = ApiLevelCatalog::builtin();
        for table in [api.levels_32, api.levels_64] {
            for pair in table.windows(2) {
                assert!(pair[0] < pair[1]);
            }
        }
    }
}
