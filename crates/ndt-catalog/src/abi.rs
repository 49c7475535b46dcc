//! ABI catalog.
//!
//! One row per shipping ABI: canonical name, GNU triple (used for
//! sysroot subdirectories), Clang target triple (used for `--target=`),
//! FPU defaults, and deprecation state. The table is fixed at build
//! time; lookups are exact-match only.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Target CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Arm,
    Arm64,
    X86,
    X86_64,
}

impl Arch {
    /// Whether this is a 64-bit architecture.
    pub fn is_64bit(self) -> bool {
        matches!(self, Arch::Arm64 | Arch::X86_64)
    }

    /// Pointer width in bits.
    pub fn pointer_width(self) -> u32 {
        if self.is_64bit() {
            64
        } else {
            32
        }
    }

    /// Architecture component of sanitizer runtime library names
    /// (e.g. `libclang_rt.asan-aarch64-android.so`).
    pub fn runtime_component(self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "aarch64",
            Arch::X86 => "i686",
            Arch::X86_64 => "x86_64",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
        };
        f.pad(name)
    }
}

/// Instruction set mode for 32-bit ARM code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstructionMode {
    Arm,
    Thumb,
}

/// Which ARM generation a 32-bit ARM row targets.
///
/// `Armv5` is the legacy soft-float ABI kept only for old projects;
/// it is marked deprecated in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArmVariant {
    Armv5,
    Armv7,
}

/// A single ABI catalog row. All fields are static data; rows are
/// never constructed outside the built-in table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Abi {
    /// ABI name as it appears in build requests (e.g. "armeabi-v7a").
    pub name: &'static str,
    /// Architecture this ABI targets.
    pub arch: Arch,
    /// GNU-style triple, used for sysroot library subdirectories.
    pub triple: &'static str,
    /// Clang target triple base; the effective API level is appended
    /// when forming the `--target=` flag.
    pub clang_triple: &'static str,
    /// Default FPU for this ABI, if it has hardware floating point.
    pub default_fpu: Option<&'static str>,
    /// Whether the ABI is deprecated and scheduled for removal.
    pub deprecated: bool,
    /// ARM generation, for 32-bit ARM rows only.
    pub arm_variant: Option<ArmVariant>,
}

impl Abi {
    /// Whether this ABI ships a split unwinder (a compiler runtime
    /// unwinder distinct from the one in the platform libraries).
    /// Historically true exactly for 32-bit ARM.
    pub fn has_split_unwinder(&self) -> bool {
        self.arch == Arch::Arm
    }
}

static ABIS: &[Abi] = &[
    Abi {
        name: "armeabi",
        arch: Arch::Arm,
        triple: "arm-linux-androideabi",
        clang_triple: "armv5te-linux-androideabi",
        default_fpu: None,
        deprecated: true,
        arm_variant: Some(ArmVariant::Armv5),
    },
    Abi {
        name: "armeabi-v7a",
        arch: Arch::Arm,
        triple: "arm-linux-androideabi",
        clang_triple: "armv7a-linux-androideabi",
        default_fpu: Some("vfpv3-d16"),
        deprecated: false,
        arm_variant: Some(ArmVariant::Armv7),
    },
    Abi {
        name: "arm64-v8a",
        arch: Arch::Arm64,
        triple: "aarch64-linux-android",
        clang_triple: "aarch64-linux-android",
        default_fpu: None,
        deprecated: false,
        arm_variant: None,
    },
    Abi {
        name: "x86",
        arch: Arch::X86,
        triple: "i686-linux-android",
        clang_triple: "i686-linux-android",
        default_fpu: None,
        deprecated: false,
        arm_variant: None,
    },
    Abi {
        name: "x86_64",
        arch: Arch::X86_64,
        triple: "x86_64-linux-android",
        clang_triple: "x86_64-linux-android",
        default_fpu: None,
        deprecated: false,
        arm_variant: None,
    },
];

/// The process-wide ABI table.
///
/// Construct once with [`AbiCatalog::builtin`] and share by reference;
/// the catalog is immutable after construction.
#[derive(Debug, Clone)]
pub struct AbiCatalog {
    rows: &'static [Abi],
}

impl AbiCatalog {
    /// The built-in catalog of shipping ABIs.
    pub fn builtin() -> Self {
        Self { rows: ABIS }
    }

    /// All catalog rows, in table order.
    pub fn rows(&self) -> &[Abi] {
        self.rows
    }

    /// Names of all catalog rows, in table order.
    pub fn known_names(&self) -> Vec<&'static str> {
        self.rows.iter().map(|abi| abi.name).collect()
    }

    /// Resolve a free-form architecture, ABI, or triple string to a
    /// catalog row. Matching is exact; there is no fuzzy lookup.
    ///
    /// Architecture aliases ("arm", "arm32", "arm64", "x86",
    /// "x86_64") resolve to the current (non-deprecated) ABI for that
    /// architecture. A triple resolves to the current ABI that uses it.
    pub fn resolve(&self, name: &str) -> Result<&Abi> {
        let canonical = match name {
            "arm" | "arm32" => "armeabi-v7a",
            "arm64" | "aarch64" => "arm64-v8a",
            other => other,
        };

        if let Some(abi) = self.rows.iter().find(|abi| abi.name == canonical) {
            return Ok(abi);
        }
        // Triple match: prefer the non-deprecated row (armeabi and
        // armeabi-v7a share a GNU triple).
        if let Some(abi) = self
            .rows
            .iter()
            .find(|abi| !abi.deprecated && (abi.triple == name || abi.clang_triple == name))
        {
            return Ok(abi);
        }

        Err(CatalogError::UnknownAbi {
            requested: name.to_string(),
            known: self.known_names(),
        })
    }

    /// Default instruction set mode for an ABI. 32-bit ARM defaults to
    /// thumb; other architectures have no mode concept.
    pub fn default_instruction_mode(&self, abi: &Abi) -> Option<InstructionMode> {
        if abi.arch == Arch::Arm {
            Some(InstructionMode::Thumb)
        } else {
            None
        }
    }
}
