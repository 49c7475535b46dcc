//! `ndt abis` and `ndt platforms` — catalog listings.

use anyhow::Result;

use ndt_catalog::{AbiCatalog, ApiLevelCatalog};

/// Print the ABI catalog.
pub fn abis() -> Result<()> {
    let catalog = AbiCatalog::builtin();
    println!("{:<14} {:<26} {:<8} {}", "ABI", "TRIPLE", "ARCH", "STATUS");
    for abi in catalog.rows() {
        let status = if abi.deprecated { "deprecated" } else { "" };
        println!(
            "{:<14} {:<26} {:<8} {}",
            abi.name, abi.triple, abi.arch, status
        );
    }
    Ok(())
}

/// Print supported API levels, for one ABI or all of them.
pub fn platforms(abi: Option<&str>) -> Result<()> {
    let abis = AbiCatalog::builtin();
    let api = ApiLevelCatalog::builtin();

    let rows: Vec<_> = match abi {
        Some(name) => vec![abis.resolve(name)?],
        None => abis.rows().iter().collect(),
    };

    for abi in rows {
        let levels: Vec<String> = api
            .supported_levels(abi)
            .iter()
            .map(|l| l.to_string())
            .collect();
        println!("{:<14} {}", abi.name, levels.join(" "));
    }
    Ok(())
}
