//! ndt CLI — resolve abstract Android build requests into concrete
//! compiler and linker invocation parameters.

mod commands;
mod request;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use ndt_resolve::ResolveError;

#[derive(Parser)]
#[command(name = "ndt", version, about = "Android NDK target resolution")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a build request into a target descriptor
    Resolve {
        /// Read the request from a TOML file instead of flags
        #[arg(long)]
        request: Option<PathBuf>,
        /// Architecture, ABI name, or triple (e.g. arm64, armeabi-v7a)
        #[arg(long)]
        abi: Option<String>,
        /// Minimum OS API level
        #[arg(long)]
        api: Option<u32>,
        /// STL selection (none, system, libcxx-shared, libcxx-static)
        #[arg(long)]
        stl: Option<String>,
        /// Sanitizer mode (off, address)
        #[arg(long)]
        sanitizer: Option<String>,
        /// Host platform (linux, darwin, windows; default: detected)
        #[arg(long)]
        host: Option<String>,
        /// 32-bit ARM instruction mode (arm, thumb)
        #[arg(long)]
        arm_mode: Option<String>,
        /// Disable NEON even where it defaults on
        #[arg(long)]
        no_neon: bool,
        /// Static library to re-export wholesale (repeatable)
        #[arg(long = "whole-archive")]
        whole_archive: Vec<String>,
        /// Object file to link (repeatable, in order)
        #[arg(long = "object")]
        objects: Vec<String>,
        /// Static library to link (repeatable, in order)
        #[arg(long = "static-lib")]
        static_libs: Vec<String>,
        /// Shared library to link (repeatable, in order)
        #[arg(long = "shared-lib")]
        shared_libs: Vec<String>,
        /// Emit the descriptor as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the ABI catalog
    Abis,
    /// List supported API levels
    Platforms {
        /// Restrict to one ABI
        #[arg(long)]
        abi: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // Catalog inconsistencies mean the embedded data is wrong;
        // exit distinctly so wrappers can tell defect from bad input.
        let code = match e.downcast_ref::<ResolveError>() {
            Some(re) if re.is_fatal() => {
                eprintln!("fatal: {e:#}");
                2
            }
            _ => {
                eprintln!("error: {e:#}");
                1
            }
        };
        process::exit(code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Resolve {
            request,
            abi,
            api,
            stl,
            sanitizer,
            host,
            arm_mode,
            no_neon,
            whole_archive,
            objects,
            static_libs,
            shared_libs,
            json,
        } => {
            let args = commands::resolve::Args {
                request_file: request,
                abi,
                api,
                stl,
                sanitizer,
                host,
                arm_mode,
                no_neon,
                whole_archive,
                objects,
                static_libs,
                shared_libs,
                json,
            };
            commands::resolve::run(args)
        }
        Commands::Abis => commands::list::abis(),
        Commands::Platforms { abi } => commands::list::platforms(abi.as_deref()),
    }
}
