//! `ndt resolve` — resolve a build request and print the descriptor.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use ndt_catalog::InstructionMode;
use ndt_resolve::{
    BuildRequest, Catalogs, HostPlatform, Resolver, Sanitizer, StlSelection, TargetDescriptor,
};

use crate::request;

/// Flattened `ndt resolve` arguments.
pub struct Args {
    pub request_file: Option<PathBuf>,
    pub abi: Option<String>,
    pub api: Option<u32>,
    pub stl: Option<String>,
    pub sanitizer: Option<String>,
    pub host: Option<String>,
    pub arm_mode: Option<String>,
    pub no_neon: bool,
    pub whole_archive: Vec<String>,
    pub objects: Vec<String>,
    pub static_libs: Vec<String>,
    pub shared_libs: Vec<String>,
    pub json: bool,
}

pub fn run(args: Args) -> Result<()> {
    let request = build_request(&args)?;

    let catalogs = Catalogs::builtin();
    let descriptor = Resolver::new(&catalogs)
        .resolve(&request)
        .with_context(|| format!("resolving {} api {}", request.abi, request.api_level))?;

    for advisory in &descriptor.advisories {
        eprintln!("warning: {advisory}");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        print_report(&descriptor);
    }
    Ok(())
}

fn build_request(args: &Args) -> Result<BuildRequest> {
    let mut request = match &args.request_file {
        Some(path) => request::load(path)?,
        None => {
            let abi = args
                .abi
                .as_deref()
                .context("--abi is required (or use --request)")?;
            let api = args.api.context("--api is required (or use --request)")?;
            BuildRequest::new(abi, api)
        }
    };

    // Flags refine a file-based request.
    if let Some(stl) = &args.stl {
        request.stl = parse_stl(stl)?;
    }
    if let Some(sanitizer) = &args.sanitizer {
        request.sanitizer = parse_sanitizer(sanitizer)?;
    }
    request.host = match &args.host {
        Some(host) => parse_host(host)?,
        None if args.request_file.is_some() => request.host,
        None => detect_host(),
    };
    if let Some(mode) = &args.arm_mode {
        request.instruction_mode = Some(parse_arm_mode(mode)?);
    }
    if args.no_neon {
        request.disable_neon = true;
    }
    if !args.whole_archive.is_empty() {
        request.whole_archive_libraries =
            args.whole_archive.iter().cloned().collect::<BTreeSet<_>>();
    }
    if !args.objects.is_empty() {
        request.objects = args.objects.clone();
    }
    if !args.static_libs.is_empty() {
        request.static_libraries = args.static_libs.clone();
    }
    if !args.shared_libs.is_empty() {
        request.shared_libraries = args.shared_libs.clone();
    }

    Ok(request)
}

fn parse_stl(s: &str) -> Result<StlSelection> {
    Ok(match s {
        "none" => StlSelection::None,
        "system" => StlSelection::System,
        "libcxx-shared" | "c++_shared" => StlSelection::LibcxxShared,
        "libcxx-static" | "c++_static" => StlSelection::LibcxxStatic,
        other => bail!("unknown STL '{other}' (none, system, libcxx-shared, libcxx-static)"),
    })
}

fn parse_sanitizer(s: &str) -> Result<Sanitizer> {
    Ok(match s {
        "off" => Sanitizer::Off,
        "address" | "asan" => Sanitizer::Address,
        other => bail!("unknown sanitizer '{other}' (off, address)"),
    })
}

fn parse_host(s: &str) -> Result<HostPlatform> {
    Ok(match s {
        "linux" => HostPlatform::Linux,
        "darwin" | "macos" => HostPlatform::Darwin,
        "windows" => HostPlatform::Windows,
        other => bail!("unknown host '{other}' (linux, darwin, windows)"),
    })
}

fn parse_arm_mode(s: &str) -> Result<InstructionMode> {
    Ok(match s {
        "arm" => InstructionMode::Arm,
        "thumb" => InstructionMode::Thumb,
        other => bail!("unknown ARM mode '{other}' (arm, thumb)"),
    })
}

/// The platform this tool is running on.
fn detect_host() -> HostPlatform {
    if cfg!(target_os = "windows") {
        HostPlatform::Windows
    } else if cfg!(target_os = "macos") {
        HostPlatform::Darwin
    } else {
        HostPlatform::Linux
    }
}

fn print_report(desc: &TargetDescriptor) {
    println!("Target:          {} ({})", desc.abi, desc.triple);
    println!("Clang target:    {}", desc.clang_target);
    if desc.effective_api_level == desc.requested_api_level {
        println!("API level:       {}", desc.effective_api_level);
    } else {
        println!(
            "API level:       {} (requested {})",
            desc.effective_api_level, desc.requested_api_level
        );
    }
    if let Some(mode) = desc.instruction_mode {
        println!("ARM mode:        {mode:?}");
    }

    println!("STL:             {} ({:?})", desc.stl.selection, desc.stl.link_mode);
    for dir in &desc.stl.include_dirs {
        println!("  include:       {dir}");
    }
    if let Some(dir) = &desc.stl.library_dir {
        println!("  libraries:     {dir}");
    }
    if desc.stl.uses_android_support {
        println!("  compat shim:   libandroid_support.a");
    }

    println!("Compile flags:   {}", desc.flags.compile.join(" "));
    println!("Link flags:      {}", desc.flags.link.join(" "));
    println!("Shared flags:    {}", desc.flags.shared.join(" "));
    if desc.flags.needs_response_file {
        println!("Response file:   required (host command-line limit exceeded)");
    }
    if desc.needs_sanitizer_wrapper {
        println!("Sanitizer:       wrapper artifact required alongside output");
    }

    println!("Link order:");
    for unit in desc.link_order.units() {
        let visibility = if unit.exclude_from_export {
            "  (hidden from export)"
        } else {
            ""
        };
        println!("  {:<18} {}{}", format!("[{:?}]", unit.kind), unit.name, visibility);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> Args {
        Args {
            request_file: None,
            abi: Some("arm64".into()),
            api: Some(24),
            stl: None,
            sanitizer: None,
            host: None,
            arm_mode: None,
            no_neon: false,
            whole_archive: Vec::new(),
            objects: Vec::new(),
            static_libs: Vec::new(),
            shared_libs: Vec::new(),
            json: false,
        }
    }

    #[test]
    fn flags_build_a_request() {
        let mut args = bare_args();
        args.stl = Some("libcxx-static".into());
        args.sanitizer = Some("address".into());
        args.static_libs = vec!["libfoo.a".into()];
        args.whole_archive = vec!["libfoo.a".into()];

        let request = build_request(&args).unwrap();
        assert_eq!(request.abi, "arm64");
        assert_eq!(request.api_level, 24);
        assert_eq!(request.stl, StlSelection::LibcxxStatic);
        assert_eq!(request.sanitizer, Sanitizer::Address);
        assert!(request.whole_archive_libraries.contains("libfoo.a"));
    }

    #[test]
    fn abi_and_api_required_without_request_file() {
        let mut args = bare_args();
        args.abi = None;
        assert!(build_request(&args).is_err());

        let mut args = bare_args();
        args.api = None;
        assert!(build_request(&args).is_err());
    }

    #[test]
    fn flags_override_request_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.toml");
        std::fs::write(
            &path,
            "abi = \"armeabi-v7a\"\napi-level = 21\nstl = \"system\"\nhost = \"windows\"\n",
        )
        .unwrap();

        let mut args = bare_args();
        args.request_file = Some(path);
        args.abi = None;
        args.api = None;
        args.stl = Some("none".into());

        let request = build_request(&args).unwrap();
        assert_eq!(request.abi, "armeabi-v7a");
        assert_eq!(request.stl, StlSelection::None);
        // Host from the file survives when no flag overrides it.
        assert_eq!(request.host, HostPlatform::Windows);
    }

    #[test]
    fn parsers_reject_unknown_values() {
        assert!(parse_stl("stlport").is_err());
        assert!(parse_sanitizer("thread").is_err());
        assert!(parse_host("beos").is_err());
        assert!(parse_arm_mode("thumb2").is_err());
    }

    #[test]
    fn stl_accepts_ndk_style_aliases() {
        assert_eq!(parse_stl("c++_shared").unwrap(), StlSelection::LibcxxShared);
        assert_eq!(parse_stl("c++_static").unwrap(), StlSelection::LibcxxStatic);
    }
}
