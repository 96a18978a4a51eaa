//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::{Arc, Once};
pub use trellis::{
    AtomType, Attribute, Design, DesignExtractor, DesignLoader, DesignLoaderError, FrameId,
    FrameView, IdentityStrategy, ItemError, LoaderConfig, Metamodel, MetamodelView, ObjectId,
    ObjectType, RawCollection, RawDesign, RawFrame, RawId, RawNamedList, RawNamedReference,
    RawSnapshot, RawStructure, StructuralType, Structure, ValueType, Variant,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness (once per binary).
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Metamodel
// ============================================================================

/// Metamodel used by every suite.
///
/// - `Node`: node with `name` (string) and `weight` (float, default 1.0)
/// - `Edge`: edge with `label` (string, no default)
/// - `Group`: unstructured container for hierarchies
/// - `List`: ordered set
pub fn metamodel() -> Metamodel {
    Metamodel::new("diagrams")
        .with_version("1.0")
        .with_type(
            ObjectType::new("Node", StructuralType::Node)
                .with_attribute(Attribute::new("name", ValueType::Atom(AtomType::String)))
                .with_attribute(
                    Attribute::new("weight", ValueType::Atom(AtomType::Float)).with_default(1.0),
                ),
        )
        .with_type(
            ObjectType::new("Edge", StructuralType::Edge)
                .with_attribute(Attribute::new("label", ValueType::Atom(AtomType::String))),
        )
        .with_type(ObjectType::new("Group", StructuralType::Unstructured))
        .with_type(ObjectType::new("List", StructuralType::OrderedSet))
}

/// Loader over [`metamodel`] with tracing installed.
pub fn loader() -> DesignLoader {
    init_tracing();
    DesignLoader::new(Arc::new(metamodel()))
}

/// Object type from [`metamodel`].
pub fn object_type(name: &str) -> Arc<ObjectType> {
    metamodel()
        .object_type(name)
        .unwrap_or_else(|| panic!("test metamodel has no type {name}"))
}

// ============================================================================
// Raw builders
// ============================================================================

/// Raw node with an integer object id.
pub fn raw_node(id: u64) -> RawSnapshot {
    RawSnapshot::new("Node")
        .with_id(id)
        .with_structure(RawStructure::node())
}

/// Raw edge without identities.
pub fn raw_edge(from: impl Into<RawId>, to: impl Into<RawId>) -> RawSnapshot {
    RawSnapshot::new("Edge").with_structure(RawStructure::edge(from, to))
}

/// Document with the given snapshots and one frame listing `entries`.
pub fn single_frame(snapshots: Vec<RawSnapshot>, entries: Vec<RawId>) -> RawDesign {
    let mut raw = RawDesign::new();
    raw.snapshots = snapshots;
    raw.frames = vec![RawFrame::new(None, entries)];
    raw
}

/// Identity counts of a design: (used, reserved).
pub fn identity_counts(design: &Design) -> (usize, usize) {
    (
        design.identities().used_count(),
        design.identities().reserved_count(),
    )
}

// ============================================================================
// Design fixtures
// ============================================================================

/// Handles into [`sample_design`].
pub struct Sample {
    pub design: Design,
    pub first: FrameId,
    pub second: FrameId,
    pub group: ObjectId,
    pub a: ObjectId,
    pub b: ObjectId,
    pub c: ObjectId,
    pub ab: ObjectId,
    pub list: ObjectId,
}

/// Two-frame design with hierarchy, edges, an ordered set and history.
///
/// Frame one: group {a, b}, c, edge a->b, list owned by a with [b, c].
/// Frame two: a renamed, c moved into the group, edge b->c added.
/// Current frame is two, frame one is on the undo list and named "start".
pub fn sample_design() -> Sample {
    let mut design = Design::new();
    design.set_metamodel_info("diagrams", Some("1.0".to_string()));

    let mut frame = design.create_frame();
    let group = frame.create(object_type("Group"), Structure::Unstructured).unwrap();
    let a = frame.create(object_type("Node"), Structure::Node).unwrap();
    let b = frame.create(object_type("Node"), Structure::Node).unwrap();
    let c = frame.create(object_type("Node"), Structure::Node).unwrap();
    let ab = frame
        .create(object_type("Edge"), Structure::Edge { origin: a, target: b })
        .unwrap();
    let list = frame
        .create(
            object_type("List"),
            Structure::OrderedSet {
                owner: a,
                items: vec![b, c],
            },
        )
        .unwrap();
    frame.set_parent(b, group).unwrap();
    frame.set_parent(a, group).unwrap();
    frame.set_attribute(a, "name", Variant::from("alpha")).unwrap();
    frame.set_attribute(ab, "label", Variant::from("feeds")).unwrap();
    let first = frame.accept().unwrap();

    let mut frame = design.derive_frame(first).unwrap();
    frame.set_attribute(a, "name", Variant::from("alpha-2")).unwrap();
    frame.set_parent(c, group).unwrap();
    frame
        .create(object_type("Edge"), Structure::Edge { origin: b, target: c })
        .unwrap();
    let second = frame.accept().unwrap();

    design.set_history(Some(second), vec![first], vec![]).unwrap();
    design.set_named_frame("start", first).unwrap();
    design.set_named_list("milestones", vec![first, second]).unwrap();

    Sample {
        design,
        first,
        second,
        group,
        a,
        b,
        c,
        ab,
        list,
    }
}
