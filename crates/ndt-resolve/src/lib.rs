//! Build request resolution for Android NDK targets.
//!
//! Takes an abstract build request (ABI, minimum API level, STL
//! selection, sanitizer, link inputs, host platform) and produces a
//! concrete [`resolver::TargetDescriptor`]: triple, effective API
//! level, STL search paths and link strategy, a canonical link-order
//! plan that keeps incompatible unwinders apart, and three ordered
//! flag lists (compile, link, shared-library).
//!
//! Nothing here runs a compiler or touches the filesystem. The
//! resolver decides *what* an invoker must pass; invoking processes
//! and checking that sysroot paths exist are the invoker's job.
//!
//! Module layout mirrors the policy pipeline:
//! - `stl`: STL selection → search paths + link strategy.
//! - `linkorder`: link inputs → canonical category-ordered plan.
//! - `flags`: everything above → compile/link/shared flag lists.
//! - `resolver`: the façade tying the policies together.

pub mod error;
pub mod flags;
pub mod linkorder;
pub mod resolver;
pub mod stl;

pub use error::ResolveError;
pub use flags::{FlagSet, HostPlatform, Sanitizer};
pub use linkorder::{LinkInputs, LinkOrderPlan, LinkUnit, LinkUnitKind};
pub use resolver::{resolve, Advisory, BuildRequest, Catalogs, Resolver, TargetDescriptor};
pub use stl::{LibraryKind, StlLibrary, StlLinkMode, StlPlan, StlSelection};
