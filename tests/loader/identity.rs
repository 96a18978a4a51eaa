//! Identity Strategy Tests
//!
//! - RequireProvided keeps every concrete identity or fails
//! - PreserveOrCreate keeps free identities and replaces taken ones
//! - CreateNew replaces everything
//! - Names never become permanent identities

use crate::common::*;
use std::collections::HashSet;
use trellis::{EntityId, IdKind};

/// Two numbered nodes joined by an unnumbered edge, all in one frame
fn two_nodes() -> RawDesign {
    single_frame(
        vec![raw_node(1), raw_node(2), raw_edge(1u64, 2u64).with_id("e")],
        vec![RawId::Int(1), RawId::Int(2), RawId::from("e")],
    )
}

/// Two numbered nodes and nothing else
fn pair() -> RawDesign {
    single_frame(
        vec![raw_node(1), raw_node(2)],
        vec![RawId::Int(1), RawId::Int(2)],
    )
}

fn all_objects(design: &Design) -> HashSet<ObjectId> {
    design.frames().flat_map(|f| f.object_ids()).collect()
}

// ============================================================================
// RequireProvided
// ============================================================================

#[test]
fn require_provided_keeps_concrete_identities() {
    let design = loader().load(&two_nodes()).unwrap();
    let frame = design.frames().next().unwrap();

    assert_eq!(frame.len(), 3);
    assert!(frame.contains(ObjectId::from_u64(1)));
    assert!(frame.contains(ObjectId::from_u64(2)));
    let edge = frame.edges()[0];
    assert_eq!(
        edge.structure(),
        &Structure::Edge {
            origin: ObjectId::from_u64(1),
            target: ObjectId::from_u64(2),
        }
    );
    assert_eq!(
        design.identities().kind(edge.id().entity()),
        Some(IdKind::Object)
    );
}

#[test]
fn require_provided_rejects_second_load() {
    let loader = loader();
    let mut design = loader.load(&two_nodes()).unwrap();
    let before = identity_counts(&design);

    let err = loader
        .load_into(&two_nodes(), &mut design, IdentityStrategy::RequireProvided)
        .unwrap_err();
    assert_eq!(err.location(), Some((RawCollection::Snapshots, 0)));
    assert_eq!(
        err.item_error(),
        Some(&ItemError::DuplicateId(EntityId::new(1)))
    );
    assert_eq!(identity_counts(&design), before);
    assert_eq!(design.frame_count(), 1);
}

#[test]
fn require_provided_reports_outstanding_reservation() {
    let mut design = Design::new();
    assert!(design
        .identities_mut()
        .reserve(EntityId::new(2), IdKind::Object));

    let err = loader()
        .load_into(&two_nodes(), &mut design, IdentityStrategy::RequireProvided)
        .unwrap_err();
    assert_eq!(err.location(), Some((RawCollection::Snapshots, 1)));
    assert_eq!(
        err.item_error(),
        Some(&ItemError::ReservationConflict(EntityId::new(2)))
    );
    // Only the outside reservation is left
    assert_eq!(identity_counts(&design), (0, 1));
}

#[test]
fn require_provided_reports_kind_mismatch() {
    let mut raw = two_nodes();
    raw.frames[0].id = Some(RawId::Int(2));
    let err = loader().load(&raw).unwrap_err();
    assert_eq!(err.location(), Some((RawCollection::Frames, 0)));
    assert_eq!(
        err.item_error(),
        Some(&ItemError::IdTypeMismatch {
            id: RawId::Int(2),
            expected: IdKind::Frame,
            found: IdKind::Object,
        })
    );
}

// ============================================================================
// PreserveOrCreate / CreateNew
// ============================================================================

#[test]
fn preserve_or_create_twice_yields_distinct_objects() {
    let loader = loader();
    let mut design = Design::new();
    for _ in 0..2 {
        loader
            .load_into(&pair(), &mut design, IdentityStrategy::PreserveOrCreate)
            .unwrap();
    }
    assert_eq!(design.frame_count(), 2);
    assert_eq!(all_objects(&design).len(), 4);

    let err = loader
        .load_into(&pair(), &mut design, IdentityStrategy::RequireProvided)
        .unwrap_err();
    assert!(matches!(err.item_error(), Some(ItemError::DuplicateId(_))));
    assert_eq!(design.frame_count(), 2);
}

#[test]
fn preserve_or_create_rewires_references() {
    let loader = loader();
    let mut design = loader.load(&two_nodes()).unwrap();
    loader
        .load_into(&two_nodes(), &mut design, IdentityStrategy::PreserveOrCreate)
        .unwrap();

    assert_eq!(all_objects(&design).len(), 6);
    let nodes: usize = design.frames().map(|f| f.nodes().len()).sum();
    assert_eq!(nodes, 4);
    assert!(design.frames().all(|f| f.validate().is_valid()));
}

#[test]
fn preserve_or_create_keeps_free_values() {
    let mut design = Design::new();
    loader()
        .load_into(&two_nodes(), &mut design, IdentityStrategy::PreserveOrCreate)
        .unwrap();
    let objects = all_objects(&design);
    assert!(objects.contains(&ObjectId::from_u64(1)));
    assert!(objects.contains(&ObjectId::from_u64(2)));
}

#[test]
fn create_new_ignores_concrete_values() {
    let mut design = Design::new();
    design
        .identities_mut()
        .reserve(EntityId::new(1), IdKind::Frame);
    design.identities_mut().commit([EntityId::new(1)]);

    loader()
        .load_into(&two_nodes(), &mut design, IdentityStrategy::CreateNew)
        .unwrap();
    let frame = design.frames().next().unwrap();
    let edge = frame.edges()[0];
    let Structure::Edge { origin, target } = edge.structure() else {
        panic!("expected an edge");
    };
    assert_ne!(*origin, ObjectId::from_u64(1));
    assert!(frame.object(*origin).is_some());
    assert!(frame.object(*target).is_some());
}

#[test]
fn strategy_comes_from_config() {
    let config = LoaderConfig::from_toml_str("identity_strategy = \"preserve_or_create\"").unwrap();
    let loader = DesignLoader::with_config(std::sync::Arc::new(metamodel()), config);
    let mut design = loader.load(&two_nodes()).unwrap();
    loader
        .load_into(&two_nodes(), &mut design, loader.config().identity_strategy)
        .unwrap();
    assert_eq!(design.frame_count(), 2);
}

// ============================================================================
// Names
// ============================================================================

#[test]
fn names_are_scoped_to_one_load() {
    let loader = loader();
    let mut design = loader.load(&two_nodes()).unwrap();
    let first = all_objects(&design);

    let mut raw = RawDesign::new();
    raw.snapshots = vec![RawSnapshot::new("Node").with_id("e")];
    raw.frames = vec![RawFrame::new(None, vec![RawId::from("e")])];
    let frames = loader
        .load_into(&raw, &mut design, IdentityStrategy::RequireProvided)
        .unwrap();

    let node = design.frame(frames[0]).unwrap().snapshots()[0].id();
    assert!(!first.contains(&node));
}

#[test]
fn name_bound_to_two_kinds_is_rejected() {
    let mut raw = two_nodes();
    raw.frames[0].id = Some(RawId::from("e"));
    let err = loader().load(&raw).unwrap_err();
    assert_eq!(err.location(), Some((RawCollection::Frames, 0)));
    assert!(matches!(
        err.item_error(),
        Some(ItemError::IdTypeMismatch {
            expected: IdKind::Frame,
            found: IdKind::Object,
            ..
        })
    ));
}
