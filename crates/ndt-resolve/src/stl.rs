//! STL policy.
//!
//! Maps an STL selection to header/library search paths and a link
//! strategy for a resolved ABI and effective API level. Paths are
//! NDK-root-relative subpaths; checking that they exist on disk is the
//! invoker's job.

use serde::{Deserialize, Serialize};

use ndt_catalog::{Abi, ApiLevelCatalog, ArmVariant};

use crate::error::{ResolveError, Result};

/// Legacy system STL headers. Their placement (sysroot vs toolchain
/// tree) is a known inconsistency upstream; the path lives here so a
/// relocation touches one constant.
const SYSTEM_INCLUDE_DIR: &str = "sources/cxx-stl/system/include";

/// libc++ headers under the unified sysroot.
const LIBCXX_INCLUDE_DIR: &str = "sysroot/usr/include/c++/v1";

/// Per-triple library root under the unified sysroot.
const SYSROOT_LIB_DIR: &str = "sysroot/usr/lib";

/// First API level with a complete native libc; below this, libc++
/// needs the android_support compatibility shim.
const ANDROID_SUPPORT_LAST_NEEDED_BELOW: u32 = 21;

/// Which C++ standard library a build requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StlSelection {
    /// No C++ standard library.
    None,
    /// The legacy system STL: new/delete and little else, provided by
    /// the platform.
    System,
    /// libc++ linked as a shared library.
    LibcxxShared,
    /// libc++ linked statically.
    LibcxxStatic,
}

impl StlSelection {
    /// Request-facing name, matching the serde encoding.
    pub fn name(self) -> &'static str {
        match self {
            StlSelection::None => "none",
            StlSelection::System => "system",
            StlSelection::LibcxxShared => "libcxx-shared",
            StlSelection::LibcxxStatic => "libcxx-static",
        }
    }
}

impl std::fmt::Display for StlSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the resolved STL is linked into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StlLinkMode {
    /// No STL linkage at all.
    None,
    /// Shared library that provides interface only; the platform owns
    /// the implementation and the library must not be bundled into
    /// distributable output.
    SharedStub,
    /// Ordinary shared library, bundled with the app.
    Shared,
    /// Static archive.
    Static,
}

/// What kind of artifact a library name resolves to on disk.
///
/// The linker-script case is informational: the invoker links the same
/// name either way, but debugging output wants to know when a "library"
/// is really an indirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LibraryKind {
    Archive,
    SharedObject,
    LinkerScript,
}

/// A library the STL plan asks the invoker to link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StlLibrary {
    /// Name passed to the linker (`-l` form, no prefix/suffix).
    pub link_name: &'static str,
    /// File name in the library directory.
    pub file_name: &'static str,
    /// What the file actually is.
    pub kind: LibraryKind,
}

impl StlLibrary {
    fn archive(link_name: &'static str, file_name: &'static str) -> Self {
        Self {
            link_name,
            file_name,
            kind: LibraryKind::Archive,
        }
    }
}

/// Resolved STL strategy: search paths plus the libraries to link, in
/// link order within each category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StlPlan {
    /// The selection this plan was resolved from.
    pub selection: StlSelection,
    /// How the STL is linked.
    pub link_mode: StlLinkMode,
    /// Header search paths, NDK-root-relative.
    pub include_dirs: Vec<String>,
    /// Library search path, NDK-root-relative.
    pub library_dir: Option<String>,
    /// Archives to place in the static-library link stage, in order.
    pub static_libraries: Vec<StlLibrary>,
    /// Shared objects (or their linker-script indirections) for the
    /// shared-library link stage, in order.
    pub shared_libraries: Vec<StlLibrary>,
    /// Whether the android_support compatibility shim is required
    /// (effective level predates the complete native libc).
    pub uses_android_support: bool,
}

impl StlPlan {
    /// A plan that links no STL.
    pub fn none() -> Self {
        Self {
            selection: StlSelection::None,
            link_mode: StlLinkMode::None,
            include_dirs: Vec::new(),
            library_dir: None,
            static_libraries: Vec::new(),
            shared_libraries: Vec::new(),
            uses_android_support: false,
        }
    }
}

/// STL selections valid for an ABI. libc++ prebuilts are not shipped
/// for the deprecated ARMv5 row.
pub fn supported_selections(abi: &Abi) -> Vec<&'static str> {
    if abi.arm_variant == Some(ArmVariant::Armv5) {
        vec!["none", "system"]
    } else {
        vec!["none", "system", "libcxx-shared", "libcxx-static"]
    }
}

/// Resolve an STL selection for an ABI at an effective API level.
///
/// The effective level must come from the API level catalog; passing a
/// level outside the catalog's supported set is reported as an internal
/// inconsistency, not a user error — the level catalog guarantees every
/// effective level has a versioned library directory.
pub fn resolve_stl(
    selection: StlSelection,
    abi: &Abi,
    effective_level: u32,
    api: &ApiLevelCatalog,
) -> Result<StlPlan> {
    match selection {
        StlSelection::None => Ok(StlPlan::none()),
        StlSelection::System => Ok(StlPlan {
            selection,
            link_mode: StlLinkMode::SharedStub,
            include_dirs: vec![SYSTEM_INCLUDE_DIR.to_string()],
            library_dir: Some(format!("{}/{}", SYSROOT_LIB_DIR, abi.triple)),
            static_libraries: Vec::new(),
            shared_libraries: vec![StlLibrary {
                link_name: "stdc++",
                file_name: "libstdc++.so",
                kind: LibraryKind::SharedObject,
            }],
            uses_android_support: false,
        }),
        StlSelection::LibcxxShared | StlSelection::LibcxxStatic => {
            if abi.arm_variant == Some(ArmVariant::Armv5) {
                return Err(ResolveError::UnsupportedStl {
                    selection,
                    abi: abi.name,
                    supported: supported_selections(abi),
                });
            }
            if !api.is_supported(abi, effective_level) {
                return Err(ResolveError::CatalogInconsistency {
                    detail: format!(
                        "effective API level {} for {} has no versioned library directory \
                         (supported levels: {:?})",
                        effective_level,
                        abi.name,
                        api.supported_levels(abi)
                    ),
                });
            }

            let library_dir = format!("{}/{}/{}", SYSROOT_LIB_DIR, abi.triple, effective_level);
            let uses_android_support = effective_level < ANDROID_SUPPORT_LAST_NEEDED_BELOW;

            let mut static_libraries = Vec::new();
            if uses_android_support {
                // Shim goes ahead of the STL archives so its symbols
                // win during the left-to-right archive scan.
                static_libraries.push(StlLibrary::archive("android_support", "libandroid_support.a"));
            }

            let mut shared_libraries = Vec::new();
            match selection {
                StlSelection::LibcxxShared => {
                    // libc++.so at the versioned path is a linker
                    // script that pulls in the real libc++_shared.so;
                    // the invoker links the script name.
                    shared_libraries.push(StlLibrary {
                        link_name: "c++",
                        file_name: "libc++.so",
                        kind: LibraryKind::LinkerScript,
                    });
                }
                StlSelection::LibcxxStatic => {
                    static_libraries.push(StlLibrary::archive("c++_static", "libc++_static.a"));
                    static_libraries.push(StlLibrary::archive("c++abi", "libc++abi.a"));
                }
                _ => unreachable!(),
            }

            Ok(StlPlan {
                selection,
                link_mode: if selection == StlSelection::LibcxxShared {
                    StlLinkMode::Shared
                } else {
                    StlLinkMode::Static
                },
                include_dirs: vec![LIBCXX_INCLUDE_DIR.to_string()],
                library_dir: Some(library_dir),
                static_libraries,
                shared_libraries,
                uses_android_support,
            })
        }
    }
}
