//! Flag policy.
//!
//! Combines architecture, effective API level, STL plan, sanitizer,
//! and the link-order plan into three ordered flag sequences: compile,
//! link, and shared-library. The sequences are kept separate because
//! several flags are valid at only one stage.
//!
//! Fixed per-(architecture, level) flags live in a declarative rule
//! table so each row can be audited and tested on its own; flags that
//! need templating (target triple, FPU, sanitizer runtime, visibility)
//! are computed in separate, clearly bounded steps afterwards.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ndt_catalog::{Abi, Arch, InstructionMode};

use crate::linkorder::{LinkOrderPlan, LinkUnitKind};
use crate::stl::{StlPlan, StlSelection};

/// First API level whose loader requires PIE executables. Older
/// loaders reject PIE, so the flag tracks the level exactly.
const PIE_REQUIRED_LEVEL: u32 = 21;

/// First API level where 32-bit ARM defaults to NEON.
pub(crate) const NEON_DEFAULT_LEVEL: u32 = 23;

/// cmd.exe command-line length limit.
const WINDOWS_COMMAND_LINE_LIMIT: usize = 8191;

/// The platform the build tool itself runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostPlatform {
    Linux,
    Darwin,
    Windows,
}

impl HostPlatform {
    /// Maximum command-line length the host can pass to a subprocess,
    /// if the host imposes one.
    pub fn command_line_limit(self) -> Option<usize> {
        match self {
            HostPlatform::Windows => Some(WINDOWS_COMMAND_LINE_LIMIT),
            HostPlatform::Linux | HostPlatform::Darwin => None,
        }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        HostPlatform::Linux
    }
}

/// Sanitizer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sanitizer {
    Off,
    Address,
}

impl Sanitizer {
    /// The architecture-templated runtime library accompanying this
    /// sanitizer, if any.
    pub fn runtime_library(self, abi: &Abi) -> Option<String> {
        match self {
            Sanitizer::Off => None,
            Sanitizer::Address => Some(format!(
                "libclang_rt.asan-{}-android.so",
                abi.arch.runtime_component()
            )),
        }
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Sanitizer::Off
    }
}

/// Code generation knobs carried over from the build request.
#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    /// Resolved instruction mode (32-bit ARM only).
    pub instruction_mode: Option<InstructionMode>,
    /// The request explicitly turned NEON off.
    pub disable_neon: bool,
    /// Static libraries whose symbols the caller wants re-exported
    /// wholesale instead of hidden.
    pub whole_archive_libraries: BTreeSet<String>,
}

/// The resolved flag lists, ordered and stage-separated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagSet {
    /// Compile-stage flags.
    pub compile: Vec<String>,
    /// Link-stage flags.
    pub link: Vec<String>,
    /// Flags specific to producing a shared library.
    pub shared: Vec<String>,
    /// The link command exceeds the host's command-line limit; the
    /// invoker must write a response file and pass its name instead.
    pub needs_response_file: bool,
}

/// Which flag list a rule contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Compile,
    Link,
}

/// One row of the fixed-flag rule table.
struct FlagRule {
    /// Row name, for auditing and tests.
    name: &'static str,
    stage: Stage,
    /// Restrict to these architectures; `None` = all.
    arches: Option<&'static [Arch]>,
    /// Applies only at or above this effective level.
    min_level: Option<u32>,
    /// Applies only strictly below this effective level.
    below_level: Option<u32>,
    flags: &'static [&'static str],
}

impl FlagRule {
    fn applies(&self, arch: Arch, level: u32) -> bool {
        if let Some(arches) = self.arches {
            if !arches.contains(&arch) {
                return false;
            }
        }
        if let Some(min) = self.min_level {
            if level < min {
                return false;
            }
        }
        if let Some(below) = self.below_level {
            if level >= below {
                return false;
            }
        }
        true
    }
}

static RULES: &[FlagRule] = &[
    FlagRule {
        name: "pie-compile",
        stage: Stage::Compile,
        arches: None,
        min_level: Some(PIE_REQUIRED_LEVEL),
        below_level: None,
        flags: &["-fPIE"],
    },
    FlagRule {
        name: "pie-link",
        stage: Stage::Link,
        arches: None,
        min_level: Some(PIE_REQUIRED_LEVEL),
        below_level: None,
        flags: &["-pie"],
    },
    FlagRule {
        name: "relro",
        stage: Stage::Link,
        arches: None,
        min_level: None,
        below_level: None,
        flags: &["-Wl,-z,relro", "-Wl,-z,now"],
    },
    FlagRule {
        name: "noexecstack",
        stage: Stage::Link,
        arches: None,
        min_level: None,
        below_level: None,
        flags: &["-Wl,-z,noexecstack"],
    },
    // Pre-24 x86 needs stack realignment for code called from the
    // platform; after 24 it wastes a register and breaks inline asm.
    FlagRule {
        name: "x86-stackrealign",
        stage: Stage::Compile,
        arches: Some(&[Arch::X86]),
        min_level: None,
        below_level: Some(24),
        flags: &["-mstackrealign"],
    },
];

/// Resolve the flag lists for a fully resolved target.
pub fn resolve_flags(
    abi: &Abi,
    effective_level: u32,
    stl: &StlPlan,
    sanitizer: Sanitizer,
    plan: &LinkOrderPlan,
    host: HostPlatform,
    opts: &CodegenOptions,
) -> FlagSet {
    let mut compile = Vec::new();
    let mut link = Vec::new();
    let mut shared = Vec::new();

    let target = format!("--target={}{}", abi.clang_triple, effective_level);
    compile.push(target.clone());
    link.push(target);

    for rule in RULES {
        if !rule.applies(abi.arch, effective_level) {
            continue;
        }
        let out = match rule.stage {
            Stage::Compile => &mut compile,
            Stage::Link => &mut link,
        };
        out.extend(rule.flags.iter().map(|f| f.to_string()));
    }

    // 32-bit ARM instruction set and FPU selection.
    if abi.arch == Arch::Arm {
        match opts.instruction_mode {
            Some(InstructionMode::Arm) => compile.push("-marm".to_string()),
            Some(InstructionMode::Thumb) | None => compile.push("-mthumb".to_string()),
        }
        if neon_enabled(abi, effective_level, opts) {
            compile.push("-mfpu=neon".to_string());
        } else if let Some(fpu) = abi.default_fpu {
            compile.push(format!("-mfpu={fpu}"));
        }
    }

    // STL selection leaves paths on the plan; the driver still needs
    // to know which standard library is in play.
    match stl.selection {
        StlSelection::LibcxxShared | StlSelection::LibcxxStatic => {
            compile.push("-stdlib=libc++".to_string());
        }
        StlSelection::None => link.push("-nostdlib++".to_string()),
        StlSelection::System => {}
    }

    // Sanitizer instrumentation and runtime.
    if sanitizer == Sanitizer::Address {
        compile.push("-fsanitize=address".to_string());
        compile.push("-fno-omit-frame-pointer".to_string());
        link.push("-fsanitize=address".to_string());
    }
    if let Some(runtime) = sanitizer.runtime_library(abi) {
        link.push(runtime);
    }

    // Static-library visibility: hide everything the caller did not
    // explicitly ask to re-export; whole-archive the rest. Never both
    // for one library.
    for unit in plan.units_of(LinkUnitKind::StaticLibrary) {
        if opts.whole_archive_libraries.contains(&unit.name) {
            link.push("-Wl,--whole-archive".to_string());
            link.push(unit.name.clone());
            link.push("-Wl,--no-whole-archive".to_string());
        } else {
            link.push(format!("-Wl,--exclude-libs,{}", unit.name));
        }
    }

    // A shared output must not re-export unwind symbols from the
    // compiler runtime; a differently built copy may already be loaded.
    shared.push("-shared".to_string());
    for unit in plan.unwinder_units() {
        shared.push(format!("-Wl,--exclude-libs,{}", unit.name));
    }

    let needs_response_file = match host.command_line_limit() {
        Some(limit) => estimated_link_command_len(&link, plan) > limit,
        None => false,
    };

    FlagSet {
        compile,
        link,
        shared,
        needs_response_file,
    }
}

/// Whether NEON code generation is in effect for a 32-bit ARM target.
fn neon_enabled(abi: &Abi, effective_level: u32, opts: &CodegenOptions) -> bool {
    abi.arch == Arch::Arm
        && abi.default_fpu.is_some()
        && effective_level >= NEON_DEFAULT_LEVEL
        && !opts.disable_neon
}

/// Space-separated length of the link command: flags plus every link
/// unit the invoker will enumerate.
fn estimated_link_command_len(link: &[String], plan: &LinkOrderPlan) -> usize {
    let flags_len: usize = link.iter().map(|f| f.len() + 1).sum();
    let units_len: usize = plan.units().iter().map(|u| u.name.len() + 1).sum();
    flags_len + units_len
}
