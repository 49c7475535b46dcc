//! Unwinder policy and link ordering.
//!
//! 32-bit ARM historically ships two incompatible unwinders: the one
//! inside the compiler runtime and the one platform libraries were
//! built against. If both end up visible in one process the result
//! builds fine and crashes at unwind time. The fix is purely about
//! ordering and symbol visibility: the compiler-runtime unwinder must
//! be linked after every static library and before any shared library,
//! and must never re-export its symbols from a shared output.
//!
//! This module produces that ordering as data. The plan is canonical:
//! caller ordering is honored only *within* a category, never across
//! categories.

use serde::Serialize;

use ndt_catalog::Abi;

use crate::stl::StlPlan;

/// Category of a link unit. Variants are declared in canonical link
/// order; the discriminant is the sort rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkUnitKind {
    /// CRT begin object.
    StartObject,
    /// Caller object files.
    Object,
    /// Static archives (caller's, then the STL's).
    StaticLibrary,
    /// The compiler-runtime unwinder stage. Present only for ABIs with
    /// a split unwinder.
    CompilerRuntime,
    /// Shared libraries (caller's, then the STL's).
    SharedLibrary,
    /// CRT end object.
    EndObject,
}

/// One entry in the link line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkUnit {
    pub kind: LinkUnitKind,
    /// File name as the invoker should reference it.
    pub name: String,
    /// The unit's exported symbols must be hidden when the output is a
    /// shared library (unwind symbols must not leak).
    pub exclude_from_export: bool,
}

impl LinkUnit {
    fn new(kind: LinkUnitKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            exclude_from_export: false,
        }
    }
}

/// Caller-supplied link inputs, in the caller's own order.
#[derive(Debug, Clone, Default)]
pub struct LinkInputs {
    pub objects: Vec<String>,
    pub static_libraries: Vec<String>,
    pub shared_libraries: Vec<String>,
}

/// The canonical, category-ordered link line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkOrderPlan {
    units: Vec<LinkUnit>,
}

impl LinkOrderPlan {
    /// All units in final link order.
    pub fn units(&self) -> &[LinkUnit] {
        &self.units
    }

    /// Units of one category, in order.
    pub fn units_of(&self, kind: LinkUnitKind) -> impl Iterator<Item = &LinkUnit> {
        self.units.iter().filter(move |u| u.kind == kind)
    }

    /// Names of the static archives in the plan, in order.
    pub fn static_library_names(&self) -> Vec<&str> {
        self.units_of(LinkUnitKind::StaticLibrary)
            .map(|u| u.name.as_str())
            .collect()
    }

    /// The compiler-runtime unwinder units, if any.
    pub fn unwinder_units(&self) -> Vec<&LinkUnit> {
        self.units_of(LinkUnitKind::CompilerRuntime).collect()
    }

    /// Whether the units are in canonical category order. Holds by
    /// construction; exposed for tests and debugging.
    pub fn is_canonical(&self) -> bool {
        self.units.windows(2).all(|w| w[0].kind <= w[1].kind)
    }
}

/// Compute the canonical link order for an ABI.
///
/// Objects and libraries keep their relative order within a category
/// (the sort is stable), but the emitted plan never lets a shared
/// library precede a static library or the unwinder stage, regardless
/// of how the caller interleaved its inputs.
pub fn resolve_link_order(abi: &Abi, stl: &StlPlan, inputs: &LinkInputs) -> LinkOrderPlan {
    let mut units = Vec::new();

    units.push(LinkUnit::new(LinkUnitKind::StartObject, "crtbegin_dynamic.o"));
    units.push(LinkUnit::new(LinkUnitKind::EndObject, "crtend_android.o"));

    for obj in &inputs.objects {
        units.push(LinkUnit::new(LinkUnitKind::Object, obj));
    }
    for lib in &inputs.static_libraries {
        units.push(LinkUnit::new(LinkUnitKind::StaticLibrary, lib));
    }
    for lib in &stl.static_libraries {
        units.push(LinkUnit::new(LinkUnitKind::StaticLibrary, lib.file_name));
    }

    if abi.has_split_unwinder() {
        for name in ["libunwind.a", "libgcc.a"] {
            let mut unit = LinkUnit::new(LinkUnitKind::CompilerRuntime, name);
            unit.exclude_from_export = true;
            units.push(unit);
        }
    }

    for lib in &inputs.shared_libraries {
        units.push(LinkUnit::new(LinkUnitKind::SharedLibrary, lib));
    }
    for lib in &stl.shared_libraries {
        units.push(LinkUnit::new(LinkUnitKind::SharedLibrary, lib.file_name));
    }

    // Stable sort: canonical category order, caller order within.
    units.sort_by_key(|u| u.kind);

    LinkOrderPlan { units }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stl::{resolve_stl, StlSelection};
    use ndt_catalog::{AbiCatalog, ApiLevelCatalog};

    fn plan_for(abi_name: &str, stl: StlSelection, level: u32, inputs: &LinkInputs) -> LinkOrderPlan {
        let abis = AbiCatalog::builtin();
        let api = ApiLevelCatalog::builtin();
        let abi = abis.resolve(abi_name).unwrap();
        let stl = resolve_stl(stl, abi, level, &api).unwrap();
        resolve_link_order(abi, &stl, inputs)
    }

    fn sample_inputs() -> LinkInputs {
        LinkInputs {
            objects: vec!["main.o".into(), "util.o".into()],
            static_libraries: vec!["libfoo.a".into(), "libbar.a".into()],
            shared_libraries: vec!["liblog.so".into()],
        }
    }

    #[test]
    fn arm32_gets_unwinder_stage_between_static_and_shared() {
        let plan = plan_for("armeabi-v7a", StlSelection::LibcxxShared, 21, &sample_inputs());
        assert!(plan.is_canonical());

        let kinds: Vec<_> = plan.units().iter().map(|u| u.kind).collect();
        let last_static = kinds
            .iter()
            .rposition(|k| *k == LinkUnitKind::StaticLibrary)
            .unwrap();
        let unwinder = kinds
            .iter()
            .position(|k| *k == LinkUnitKind::CompilerRuntime)
            .unwrap();
        let first_shared = kinds
            .iter()
            .position(|k| *k == LinkUnitKind::SharedLibrary)
            .unwrap();
        assert!(last_static < unwinder);
        assert!(unwinder < first_shared);
    }

    #[test]
    fn unwinder_units_are_export_excluded() {
        let plan = plan_for("armeabi-v7a", StlSelection::None, 21, &LinkInputs::default());
        let unwinders = plan.unwinder_units();
        let names: Vec<_> = unwinders.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["libunwind.a", "libgcc.a"]);
        assert!(unwinders.iter().all(|u| u.exclude_from_export));
    }

    #[test]
    fn unified_unwinder_abis_have_no_runtime_stage() {
        for abi in ["arm64-v8a", "x86", "x86_64"] {
            let plan = plan_for(abi, StlSelection::LibcxxShared, 21, &sample_inputs());
            assert!(plan.unwinder_units().is_empty(), "{abi}");
            assert!(plan.is_canonical());
        }
    }

    #[test]
    fn caller_order_preserved_within_category() {
        let plan = plan_for("arm64-v8a", StlSelection::None, 21, &sample_inputs());
        let objects: Vec<_> = plan
            .units_of(LinkUnitKind::Object)
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(objects, vec!["main.o", "util.o"]);
        assert_eq!(plan.static_library_names(), vec!["libfoo.a", "libbar.a"]);
    }

    #[test]
    fn shared_never_precedes_static_for_any_input_permutation() {
        // Permuting same-category items only permutes them within the
        // category; the category boundaries never move.
        let a = LinkInputs {
            objects: vec!["a.o".into()],
            static_libraries: vec!["libx.a".into(), "liby.a".into()],
            shared_libraries: vec!["libz.so".into(), "libw.so".into()],
        };
        let mut b = a.clone();
        b.static_libraries.reverse();
        b.shared_libraries.reverse();

        let plan_a = plan_for("armeabi-v7a", StlSelection::LibcxxStatic, 23, &a);
        let plan_b = plan_for("armeabi-v7a", StlSelection::LibcxxStatic, 23, &b);
        let kinds_a: Vec<_> = plan_a.units().iter().map(|u| u.kind).collect();
        let kinds_b: Vec<_> = plan_b.units().iter().map(|u| u.kind).collect();
        assert_eq!(kinds_a, kinds_b);

        let kinds = kinds_a;
        let first_shared = kinds
            .iter()
            .position(|k| *k == LinkUnitKind::SharedLibrary)
            .unwrap();
        assert!(kinds[..first_shared]
            .iter()
            .all(|k| *k != LinkUnitKind::SharedLibrary));
        assert!(kinds[first_shared..]
            .iter()
            .all(|k| *k != LinkUnitKind::StaticLibrary && *k != LinkUnitKind::CompilerRuntime));
    }

    #[test]
    fn stl_archives_follow_caller_archives() {
        let plan = plan_for("armeabi-v7a", StlSelection::LibcxxStatic, 19, &sample_inputs());
        assert_eq!(
            plan.static_library_names(),
            vec![
                "libfoo.a",
                "libbar.a",
                "libandroid_support.a",
                "libc++_static.a",
                "libc++abi.a"
            ]
        );
    }

    #[test]
    fn crt_objects_bracket_the_plan() {
        let plan = plan_for("x86", StlSelection::None, 16, &sample_inputs());
        let units = plan.units();
        assert_eq!(units.first().unwrap().name, "crtbegin_dynamic.o");
        assert_eq!(units.last().unwrap().name, "crtend_android.o");
    }
}
