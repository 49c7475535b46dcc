//! Static target catalogs for Android NDK build resolution.
//!
//! Two process-wide, read-only tables live here:
//! - **ABI catalog:** architecture → ABI name, triples, FPU defaults,
//!   deprecation state.
//! - **API level catalog:** the sparse set of OS API levels that ship
//!   native content for each architecture, with floor-lookup semantics.
//!
//! Both catalogs are constructed once at startup and never mutated.
//! Resolution over them is pure; any number of threads may share a
//! catalog by reference.

pub mod abi;
pub mod api;
pub mod error;

pub use abi::{Abi, AbiCatalog, Arch, ArmVariant, InstructionMode};
pub use api::{ApiLevelCatalog, LevelResolution};
pub use error::CatalogError;
