//! All-or-nothing Loading Tests
//!
//! A load that fails in any phase must leave the design exactly as it was:
//! no frames, no snapshots, no history changes and no identities, used or
//! reserved.

use crate::common::*;
use std::sync::Arc;
use trellis::{ObjectSnapshot, SnapshotId};

/// Everything observable about a design
fn fingerprint(design: &Design) -> (RawDesign, (usize, usize), usize) {
    (
        DesignExtractor::new().extract(design),
        identity_counts(design),
        design.snapshot_count(),
    )
}

fn assert_rejected(raw: &RawDesign, strategy: IdentityStrategy) -> DesignLoaderError {
    let mut sample = sample_design();
    let before = fingerprint(&sample.design);
    let err = loader()
        .load_into(raw, &mut sample.design, strategy)
        .unwrap_err();
    assert_eq!(fingerprint(&sample.design), before, "design changed after: {err}");
    err
}

/// Valid document with fresh identities and full history
fn valid_document() -> RawDesign {
    let mut raw = single_frame(
        vec![
            RawSnapshot::new("Node").with_id("x"),
            RawSnapshot::new("Node").with_id("y"),
            raw_edge("x", "y").with_id("xy"),
        ],
        vec!["x".into(), "y".into(), "xy".into()],
    );
    raw.frames[0].id = Some("f".into());
    raw.system_references = vec![RawNamedReference::frame("current_frame", "f")];
    raw
}

#[test]
fn valid_document_is_accepted() {
    let mut sample = sample_design();
    let frames = loader()
        .load_into(&valid_document(), &mut sample.design, IdentityStrategy::RequireProvided)
        .unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(sample.design.current_frame_id(), Some(frames[0]));
}

// ============================================================================
// One failure per phase
// ============================================================================

#[test]
fn duplicate_raw_identity_changes_nothing() {
    let mut raw = valid_document();
    raw.snapshots[1].snapshot_id = Some("s".into());
    raw.snapshots[2].snapshot_id = Some("s".into());
    let err = assert_rejected(&raw, IdentityStrategy::RequireProvided);
    assert_eq!(
        err.item_error(),
        Some(&ItemError::DuplicateForeignId(RawId::from("s")))
    );
}

#[test]
fn taken_identity_changes_nothing() {
    let mut raw = valid_document();
    raw.snapshots.push(raw_node(1));
    raw.frames[0].snapshots.push(RawId::Int(1));
    let err = assert_rejected(&raw, IdentityStrategy::RequireProvided);
    assert!(matches!(
        err.item_error(),
        Some(ItemError::DuplicateId(_)) | Some(ItemError::IdTypeMismatch { .. })
    ));
}

#[test]
fn dangling_reference_changes_nothing() {
    let mut raw = valid_document();
    raw.snapshots[2] = raw_edge("x", "ghost").with_id("xy");
    let err = assert_rejected(&raw, IdentityStrategy::PreserveOrCreate);
    assert_eq!(err.location(), Some((RawCollection::Snapshots, 2)));
}

#[test]
fn unknown_frame_entry_changes_nothing() {
    let mut raw = valid_document();
    raw.frames[0].snapshots.push("ghost".into());
    let err = assert_rejected(&raw, IdentityStrategy::CreateNew);
    assert_eq!(
        err.item_error(),
        Some(&ItemError::UnknownSnapshotId {
            id: RawId::from("ghost"),
            position: 3,
        })
    );
}

#[test]
fn hierarchy_failure_changes_nothing() {
    let mut raw = valid_document();
    raw.snapshots[0] = RawSnapshot::new("Node").with_id("x").with_parent("y");
    raw.snapshots[1] = RawSnapshot::new("Node").with_id("y").with_parent("x");
    let err = assert_rejected(&raw, IdentityStrategy::CreateNew);
    assert!(matches!(err.item_error(), Some(ItemError::ParentCycle(_))));
}

#[test]
fn unknown_type_changes_nothing() {
    let mut raw = valid_document();
    raw.snapshots[1].type_name = "Valve".to_string();
    let err = assert_rejected(&raw, IdentityStrategy::CreateNew);
    assert_eq!(err.location(), Some((RawCollection::Snapshots, 1)));
}

#[test]
fn structural_mismatch_changes_nothing() {
    let mut raw = valid_document();
    raw.snapshots[2] = RawSnapshot::new("Node")
        .with_id("xy")
        .with_structure(RawStructure::edge("x", "y"));
    let err = assert_rejected(&raw, IdentityStrategy::CreateNew);
    assert_eq!(
        err.item_error(),
        Some(&ItemError::StructuralTypeMismatch {
            expected: StructuralType::Node,
            found: StructuralType::Edge,
        })
    );
}

#[test]
fn broken_frame_changes_nothing() {
    // The edge ends at a group, which frame validation rejects
    let mut raw = valid_document();
    raw.snapshots[1] = RawSnapshot::new("Group").with_id("y");
    let err = assert_rejected(&raw, IdentityStrategy::CreateNew);
    assert_eq!(err.location(), Some((RawCollection::Frames, 0)));
    assert!(matches!(
        err.item_error(),
        Some(ItemError::BrokenStructuralIntegrity(_))
    ));
}

#[test]
fn named_reference_failure_changes_nothing() {
    let mut raw = valid_document();
    raw.user_lists = vec![RawNamedList::frames("later", vec!["f".into(), "missing".into()])];
    let err = assert_rejected(&raw, IdentityStrategy::CreateNew);
    assert!(matches!(err, DesignLoaderError::UnknownFrameId { .. }));
}

#[test]
fn missing_current_frame_changes_nothing() {
    let mut raw = valid_document();
    raw.system_references.clear();
    raw.system_lists = vec![RawNamedList::frames("redo", vec!["f".into()])];
    let err = assert_rejected(&raw, IdentityStrategy::CreateNew);
    assert!(matches!(err, DesignLoaderError::MissingCurrentFrame));
}

// ============================================================================
// Clips
// ============================================================================

#[test]
fn failed_clip_leaves_frame_untouched() {
    let mut sample = sample_design();
    let before = identity_counts(&sample.design);

    let mut frame = sample.design.derive_frame(sample.second).unwrap();
    let content = frame.object_ids();
    let clip = vec![
        RawSnapshot::new("Node").with_id("p"),
        raw_edge("p", "q"),
    ];
    let err = loader()
        .load_snapshots(&clip, &mut frame, IdentityStrategy::CreateNew)
        .unwrap_err();
    assert_eq!(err.location(), Some((RawCollection::Snapshots, 1)));
    assert_eq!(frame.object_ids(), content);
    frame.discard();

    assert_eq!(identity_counts(&sample.design), before);
}

#[test]
fn clip_is_validated_against_whole_frame() {
    let mut sample = sample_design();
    let mut frame = sample.design.derive_frame(sample.second).unwrap();
    let content = frame.object_ids();

    // A group may not be an edge endpoint
    let clip = vec![
        RawSnapshot::new("Node").with_id("p"),
        RawSnapshot::new("Group").with_id("g"),
        raw_edge("p", "g"),
    ];
    let err = loader()
        .load_snapshots(&clip, &mut frame, IdentityStrategy::CreateNew)
        .unwrap_err();
    assert!(matches!(
        err.item_error(),
        Some(ItemError::BrokenStructuralIntegrity(_))
    ));
    assert_eq!(err.location(), Some((RawCollection::Snapshots, 2)));
    assert_eq!(frame.object_ids(), content);
}

#[test]
fn broken_target_frame_is_not_blamed_on_clip() {
    let mut sample = sample_design();
    let before = identity_counts(&sample.design);
    let mut frame = sample.design.derive_frame(sample.second).unwrap();

    // Edge whose target is not in the frame
    let dangling = ObjectSnapshot::new(
        ObjectId::from_u64(900),
        SnapshotId::from_u64(901),
        object_type("Edge"),
        Structure::Edge {
            origin: sample.a,
            target: ObjectId::from_u64(902),
        },
    )
    .unwrap();
    frame.insert(Arc::new(dangling)).unwrap();
    let content = frame.object_ids();

    let err = loader()
        .load_snapshots(&[raw_node(1)], &mut frame, IdentityStrategy::CreateNew)
        .unwrap_err();
    assert!(matches!(err, DesignLoaderError::BrokenTargetFrame(ref v) if !v.is_empty()));
    assert_eq!(err.location(), None);
    assert_eq!(frame.object_ids(), content);
    frame.discard();
    assert_eq!(identity_counts(&sample.design), before);
}
