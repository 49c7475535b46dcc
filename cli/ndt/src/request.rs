//! Build request files.
//!
//! A request can be written as a TOML file and passed to
//! `ndt resolve --request`; the shape matches [`BuildRequest`]'s serde
//! model (kebab-case keys, unknown keys rejected).

use std::path::Path;

use anyhow::{Context, Result};

use ndt_resolve::BuildRequest;

/// Load a build request from a TOML file.
pub fn load(path: &Path) -> Result<BuildRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let request: BuildRequest =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(request)
}
