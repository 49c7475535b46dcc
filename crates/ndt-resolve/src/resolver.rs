//! Resolver façade.
//!
//! Turns a [`BuildRequest`] into a [`TargetDescriptor`] by consulting
//! the catalogs and policies in a fixed sequence: ABI → API level →
//! STL + link order → flags. Resolution is pure and synchronous; the
//! catalogs are shared immutable state and every output value is
//! freshly constructed per call, so any number of resolutions may run
//! concurrently.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ndt_catalog::{AbiCatalog, ApiLevelCatalog, Arch, ArmVariant, InstructionMode};

use crate::error::Result;
use crate::flags::{resolve_flags, CodegenOptions, FlagSet, HostPlatform, Sanitizer};
use crate::linkorder::{resolve_link_order, LinkInputs, LinkOrderPlan};
use crate::stl::{resolve_stl, StlPlan, StlSelection};

/// An abstract build request, as supplied by the external build layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildRequest {
    /// Architecture, ABI name, or triple (exact match).
    pub abi: String,
    /// Minimum OS API level the output should run on.
    pub api_level: u32,
    /// C++ standard library selection.
    #[serde(default = "default_stl")]
    pub stl: StlSelection,
    /// Sanitizer mode.
    #[serde(default)]
    pub sanitizer: Sanitizer,
    /// Platform the build tool runs on.
    #[serde(default)]
    pub host: HostPlatform,
    /// Override the default instruction mode (32-bit ARM only).
    #[serde(default)]
    pub instruction_mode: Option<InstructionMode>,
    /// Turn NEON off even where it would default on.
    #[serde(default)]
    pub disable_neon: bool,
    /// Static libraries whose symbols should be re-exported wholesale.
    #[serde(default)]
    pub whole_archive_libraries: BTreeSet<String>,
    /// Object files to link, in order.
    #[serde(default)]
    pub objects: Vec<String>,
    /// Static libraries to link, in order.
    #[serde(default)]
    pub static_libraries: Vec<String>,
    /// Shared libraries to link, in order.
    #[serde(default)]
    pub shared_libraries: Vec<String>,
}

fn default_stl() -> StlSelection {
    StlSelection::LibcxxShared
}

impl BuildRequest {
    /// A request with everything defaulted except ABI and API level.
    pub fn new(abi: impl Into<String>, api_level: u32) -> Self {
        Self {
            abi: abi.into(),
            api_level,
            stl: default_stl(),
            sanitizer: Sanitizer::Off,
            host: HostPlatform::default(),
            instruction_mode: None,
            disable_neon: false,
            whole_archive_libraries: BTreeSet::new(),
            objects: Vec::new(),
            static_libraries: Vec::new(),
            shared_libraries: Vec::new(),
        }
    }
}

/// A non-fatal condition the invoker may want to surface to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Advisory {
    /// The requested level is newer than anything in the catalog; the
    /// build targets the newest known level instead.
    PreviewApiLevel { requested: u32, effective: u32 },
    /// The requested level fell in a gap of the supported set and was
    /// floored.
    ApiLevelClamped { requested: u32, effective: u32 },
    /// The selected ABI is deprecated and scheduled for removal.
    DeprecatedAbi { abi: String },
    /// Thumb code on ARMv5 silently downgrades code generation
    /// quality.
    ThumbOnArmv5,
    /// NEON was explicitly disabled at a level where it defaults on.
    NeonDisabled,
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::PreviewApiLevel {
                requested,
                effective,
            } => write!(
                f,
                "API level {requested} is newer than this catalog; \
                 building against level {effective} instead"
            ),
            Advisory::ApiLevelClamped {
                requested,
                effective,
            } => write!(
                f,
                "API level {requested} ships no native platform content; \
                 using level {effective}"
            ),
            Advisory::DeprecatedAbi { abi } => {
                write!(f, "ABI '{abi}' is deprecated and will be removed")
            }
            Advisory::ThumbOnArmv5 => write!(
                f,
                "thumb mode on ARMv5 downgrades code generation quality; \
                 consider instruction-mode = \"arm\""
            ),
            Advisory::NeonDisabled => write!(
                f,
                "NEON is disabled but defaults on at this API level"
            ),
        }
    }
}

/// The resolver's output: everything a downstream invoker needs to
/// build compile and link command lines. Immutable once constructed;
/// owned by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct TargetDescriptor {
    /// Resolved ABI name.
    pub abi: String,
    /// Architecture of the resolved ABI.
    pub arch: Arch,
    /// GNU triple, for sysroot subdirectories.
    pub triple: String,
    /// Full Clang target (triple plus effective level).
    pub clang_target: String,
    /// The level the request asked for.
    pub requested_api_level: u32,
    /// The level the build actually targets.
    pub effective_api_level: u32,
    /// Resolved instruction mode (32-bit ARM only).
    pub instruction_mode: Option<InstructionMode>,
    /// Resolved STL strategy.
    pub stl: StlPlan,
    /// Canonical link order.
    pub link_order: LinkOrderPlan,
    /// Ordered compile/link/shared flag lists.
    pub flags: FlagSet,
    /// A sanitizer wrapper artifact must accompany the output. The
    /// wrapper itself is produced by the invoker.
    pub needs_sanitizer_wrapper: bool,
    /// Non-fatal conditions worth printing.
    pub advisories: Vec<Advisory>,
}

/// The immutable catalog bundle a resolver reads from.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub abi: AbiCatalog,
    pub api: ApiLevelCatalog,
}

impl Catalogs {
    /// The built-in catalogs.
    pub fn builtin() -> Self {
        Self {
            abi: AbiCatalog::builtin(),
            api: ApiLevelCatalog::builtin(),
        }
    }
}

/// Stateless resolver over borrowed catalogs.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    catalogs: &'a Catalogs,
}

impl<'a> Resolver<'a> {
    pub fn new(catalogs: &'a Catalogs) -> Self {
        Self { catalogs }
    }

    /// Resolve a build request into a target descriptor.
    pub fn resolve(&self, request: &BuildRequest) -> Result<TargetDescriptor> {
        let mut advisories = Vec::new();

        let abi = self.catalogs.abi.resolve(&request.abi)?;
        if abi.deprecated {
            advisories.push(Advisory::DeprecatedAbi {
                abi: abi.name.to_string(),
            });
        }

        let level = self.catalogs.api.resolve(abi, request.api_level)?;
        if level.preview {
            advisories.push(Advisory::PreviewApiLevel {
                requested: request.api_level,
                effective: level.effective,
            });
        } else if let Some(requested) = level.clamped_from {
            advisories.push(Advisory::ApiLevelClamped {
                requested,
                effective: level.effective,
            });
        }

        let instruction_mode = match request.instruction_mode {
            Some(mode) if abi.arch == Arch::Arm => Some(mode),
            Some(_) | None => self.catalogs.abi.default_instruction_mode(abi),
        };
        if abi.arm_variant == Some(ArmVariant::Armv5)
            && instruction_mode == Some(InstructionMode::Thumb)
        {
            advisories.push(Advisory::ThumbOnArmv5);
        }
        if abi.arch == Arch::Arm
            && abi.default_fpu.is_some()
            && request.disable_neon
            && level.effective >= crate::flags::NEON_DEFAULT_LEVEL
        {
            advisories.push(Advisory::NeonDisabled);
        }

        let stl = resolve_stl(request.stl, abi, level.effective, &self.catalogs.api)?;

        let inputs = LinkInputs {
            objects: request.objects.clone(),
            static_libraries: request.static_libraries.clone(),
            shared_libraries: request.shared_libraries.clone(),
        };
        let link_order = resolve_link_order(abi, &stl, &inputs);

        let opts = CodegenOptions {
            instruction_mode,
            disable_neon: request.disable_neon,
            whole_archive_libraries: request.whole_archive_libraries.clone(),
        };
        let flags = resolve_flags(
            abi,
            level.effective,
            &stl,
            request.sanitizer,
            &link_order,
            request.host,
            &opts,
        );

        Ok(TargetDescriptor {
            abi: abi.name.to_string(),
            arch: abi.arch,
            triple: abi.triple.to_string(),
            clang_target: format!("{}{}", abi.clang_triple, level.effective),
            requested_api_level: request.api_level,
            effective_api_level: level.effective,
            instruction_mode,
            stl,
            link_order,
            flags,
            needs_sanitizer_wrapper: request.sanitizer == Sanitizer::Address,
            advisories,
        })
    }
}

/// One-shot convenience over the built-in catalogs.
pub fn resolve(request: &BuildRequest) -> Result<TargetDescriptor> {
    let catalogs = Catalogs::builtin();
    Resolver::new(&catalogs).resolve(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::stl::StlLinkMode;
    use ndt_catalog::CatalogError;

    #[test]
    fn arm32_level_20_scenario() {
        // spec scenario: arm32 / 20 / libcxx-shared / sanitizer off.
        let mut request = BuildRequest::new("arm32", 20);
        request.stl = StlSelection::LibcxxShared;
        let desc = resolve(&request).unwrap();

        assert_eq!(desc.abi, "armeabi-v7a");
        assert_eq!(desc.effective_api_level, 19);
        assert_eq!(desc.stl.link_mode, StlLinkMode::Shared);
        // 19 < 23: NEON stays off, the default FPU applies.
        assert!(!desc.flags.compile.contains(&"-mfpu=neon".to_string()));
        // 19 < 21: no PIE, shim required.
        assert!(!desc.flags.compile.contains(&"-fPIE".to_string()));
        assert!(desc.stl.uses_android_support);
        assert!(desc
            .advisories
            .contains(&Advisory::ApiLevelClamped {
                requested: 20,
                effective: 19
            }));
    }

    #[test]
    fn arm64_level_21_scenario() {
        // spec scenario: arm64 / 21 / none.
        let mut request = BuildRequest::new("arm64", 21);
        request.stl = StlSelection::None;
        let desc = resolve(&request).unwrap();

        assert_eq!(desc.abi, "arm64-v8a");
        assert_eq!(desc.effective_api_level, 21);
        assert_eq!(desc.stl.link_mode, StlLinkMode::None);
        assert!(desc.stl.include_dirs.is_empty());
        assert!(desc.flags.compile.contains(&"-fPIE".to_string()));
        assert!(desc.link_order.unwinder_units().is_empty());
        assert!(desc.advisories.is_empty());
    }

    #[test]
    fn preview_level_is_advised_not_silent() {
        let request = BuildRequest::new("x86_64", 99);
        let desc = resolve(&request).unwrap();
        assert_eq!(desc.effective_api_level, 28);
        assert!(desc.advisories.contains(&Advisory::PreviewApiLevel {
            requested: 99,
            effective: 28
        }));
    }

    #[test]
    fn unknown_abi_is_a_user_error() {
        let request = BuildRequest::new("mips64", 21);
        let err = resolve(&request).unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(
            err,
            ResolveError::Catalog(CatalogError::UnknownAbi { .. })
        ));
    }

    #[test]
    fn below_minimum_is_a_user_error() {
        let request = BuildRequest::new("arm64-v8a", 16);
        let err = resolve(&request).unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(
            err,
            ResolveError::Catalog(CatalogError::BelowMinimum {
                requested: 16,
                minimum: 21,
                ..
            })
        ));
    }

    #[test]
    fn deprecated_abi_with_thumb_collects_both_advisories() {
        let mut request = BuildRequest::new("armeabi", 14);
        request.stl = StlSelection::System;
        let desc = resolve(&request).unwrap();
        assert!(desc.advisories.iter().any(|a| matches!(
            a,
            Advisory::DeprecatedAbi { abi } if abi == "armeabi"
        )));
        assert!(desc.advisories.contains(&Advisory::ThumbOnArmv5));
    }

    #[test]
    fn armv5_with_explicit_arm_mode_skips_thumb_advisory() {
        let mut request = BuildRequest::new("armeabi", 14);
        request.stl = StlSelection::None;
        request.instruction_mode = Some(InstructionMode::Arm);
        let desc = resolve(&request).unwrap();
        assert!(!desc.advisories.contains(&Advisory::ThumbOnArmv5));
        assert!(desc.flags.compile.contains(&"-marm".to_string()));
    }

    #[test]
    fn neon_disable_advisory_only_where_default_on() {
        let mut request = BuildRequest::new("armeabi-v7a", 24);
        request.disable_neon = true;
        let desc = resolve(&request).unwrap();
        assert!(desc.advisories.contains(&Advisory::NeonDisabled));

        let mut request = BuildRequest::new("armeabi-v7a", 19);
        request.disable_neon = true;
        let desc = resolve(&request).unwrap();
        assert!(!desc.advisories.contains(&Advisory::NeonDisabled));
    }

    #[test]
    fn instruction_mode_ignored_off_arm() {
        let mut request = BuildRequest::new("x86_64", 21);
        request.instruction_mode = Some(InstructionMode::Arm);
        let desc = resolve(&request).unwrap();
        assert_eq!(desc.instruction_mode, None);
    }

    #[test]
    fn descriptor_carries_sanitizer_wrapper_requirement() {
        let mut request = BuildRequest::new("arm64", 27);
        request.sanitizer = Sanitizer::Address;
        let desc = resolve(&request).unwrap();
        assert!(desc.needs_sanitizer_wrapper);

        let request = BuildRequest::new("arm64", 27);
        let desc = resolve(&request).unwrap();
        assert!(!desc.needs_sanitizer_wrapper);
    }

    #[test]
    fn clang_target_embeds_effective_level() {
        let request = BuildRequest::new("armeabi-v7a", 25);
        let desc = resolve(&request).unwrap();
        assert_eq!(desc.effective_api_level, 24);
        assert_eq!(desc.clang_target, "armv7a-linux-androideabi24");
    }

    #[test]
    fn resolution_is_repeatable() {
        // Pure computation over immutable catalogs: two calls, same
        // catalogs, same answer.
        let catalogs = Catalogs::builtin();
        let resolver = Resolver::new(&catalogs);
        let mut request = BuildRequest::new("armeabi-v7a", 20);
        request.stl = StlSelection::LibcxxStatic;
        request.static_libraries = vec!["libfoo.a".into()];

        let a = resolver.resolve(&request).unwrap();
        let b = resolver.resolve(&request).unwrap();
        assert_eq!(a.flags, b.flags);
        assert_eq!(a.link_order, b.link_order);
        assert_eq!(a.advisories, b.advisories);
    }
}
