//! Integrity Tests
//!
//! Properties every successful load guarantees and every rejected load
//! respects:
//! - Raw identities are unique per collection
//! - Loaded frames are structurally sound
//! - An object appears at most once per frame

use crate::common::*;
use proptest::prelude::*;

/// Random graph document: `n` named nodes, edges between them and a
/// parent forest where every parent precedes its child.
fn graph(n: usize, edges: &[(usize, usize)], parents: &[Option<usize>]) -> RawDesign {
    let mut snapshots = Vec::new();
    let mut entries = Vec::new();
    for i in 0..n {
        let mut node = RawSnapshot::new("Node").with_id(format!("n{i}"));
        if let Some(p) = parents.get(i).copied().flatten() {
            if i > 0 {
                node = node.with_parent(format!("n{}", p % i));
            }
        }
        snapshots.push(node);
        entries.push(RawId::from(format!("n{i}")));
    }
    for (k, (from, to)) in edges.iter().enumerate() {
        snapshots.push(
            raw_edge(format!("n{}", from % n), format!("n{}", to % n)).with_id(format!("e{k}")),
        );
        entries.push(RawId::from(format!("e{k}")));
    }
    single_frame(snapshots, entries)
}

proptest! {
    #[test]
    fn duplicate_snapshot_ids_are_rejected(n in 2usize..12, a in 0usize..12, b in 0usize..12) {
        let a = a % n;
        let b = b % n;
        prop_assume!(a != b);

        let snapshots: Vec<RawSnapshot> = (0..n)
            .map(|k| {
                let version = if k == b { 100 + a } else { 100 + k };
                raw_node(k as u64 + 1).with_snapshot_id(version as u64)
            })
            .collect();
        let raw = single_frame(snapshots, vec![]);

        let mut design = Design::new();
        let err = loader()
            .load_into(&raw, &mut design, IdentityStrategy::RequireProvided)
            .unwrap_err();
        prop_assert_eq!(err.location(), Some((RawCollection::Snapshots, a.min(b))));
        prop_assert_eq!(
            err.item_error(),
            Some(&ItemError::DuplicateForeignId(RawId::Int(100 + a as u64)))
        );
        prop_assert_eq!(identity_counts(&design), (0, 0));
        prop_assert_eq!(design.frame_count(), 0);
    }

    #[test]
    fn loaded_frames_are_structurally_sound(
        n in 1usize..10,
        edges in prop::collection::vec((0usize..100, 0usize..100), 0..8),
        parents in prop::collection::vec(prop::option::of(0usize..100), 0..10),
    ) {
        let design = loader().load(&graph(n, &edges, &parents)).unwrap();
        let frame = design.frames().next().unwrap();

        prop_assert!(frame.validate().is_valid());
        prop_assert_eq!(frame.len(), n + edges.len());
        for edge in frame.edges() {
            let Structure::Edge { origin, target } = edge.structure() else {
                unreachable!();
            };
            prop_assert!(frame.nodes().iter().any(|s| s.id() == *origin));
            prop_assert!(frame.nodes().iter().any(|s| s.id() == *target));
        }
        for snapshot in frame.snapshots() {
            if let Some(parent) = snapshot.parent() {
                let parent = frame.object(parent).unwrap();
                prop_assert!(parent.children().contains(&snapshot.id()));
            }
        }
    }

    #[test]
    fn every_committed_identity_is_used_once(n in 1usize..10, copies in 1usize..4) {
        let loader = loader();
        let mut design = Design::new();
        for _ in 0..copies {
            loader
                .load_into(&graph(n, &[], &[]), &mut design, IdentityStrategy::PreserveOrCreate)
                .unwrap();
        }
        // n objects, n snapshots and one frame per load
        prop_assert_eq!(identity_counts(&design), (copies * (2 * n + 1), 0));
    }
}

// ============================================================================
// Frame exclusivity
// ============================================================================

#[test]
fn two_versions_in_one_frame_are_rejected() {
    let raw = single_frame(
        vec![
            raw_node(1).with_snapshot_id(10u64),
            raw_node(1).with_snapshot_id(11u64),
        ],
        vec![RawId::Int(10), RawId::Int(11)],
    );
    let err = loader().load(&raw).unwrap_err();
    assert_eq!(err.location(), Some((RawCollection::Frames, 0)));
    assert_eq!(
        err.item_error(),
        Some(&ItemError::DuplicateObject(ObjectId::from_u64(1)))
    );
}

#[test]
fn versions_in_separate_frames_share_the_object() {
    let mut raw = single_frame(
        vec![
            raw_node(1).with_snapshot_id(10u64),
            raw_node(1)
                .with_snapshot_id(11u64)
                .with_attribute("weight", 2.5),
        ],
        vec![RawId::Int(10)],
    );
    raw.frames.push(RawFrame::new(None, vec![RawId::Int(11)]));

    let design = loader().load(&raw).unwrap();
    let frames: Vec<_> = design.frames().collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].object_ids(), frames[1].object_ids());
    assert_eq!(
        frames[1].snapshots()[0].attribute("weight"),
        Some(&Variant::from(2.5))
    );
}

#[test]
fn inconsistent_children_across_frames_are_rejected() {
    // Group 1 (one version) has child 2 in the first frame only
    let mut raw = single_frame(
        vec![
            RawSnapshot::new("Group").with_id(1u64).with_snapshot_id(10u64),
            raw_node(2).with_snapshot_id(20u64).with_parent(1u64),
        ],
        vec![RawId::Int(10), RawId::Int(20)],
    );
    raw.frames.push(RawFrame::new(None, vec![RawId::Int(10)]));

    let err = loader().load(&raw).unwrap_err();
    assert!(matches!(
        err.item_error(),
        Some(ItemError::ChildrenMismatch(_))
    ));
}

#[test]
fn children_listed_in_another_order_are_consistent() {
    let mut raw = single_frame(
        vec![
            RawSnapshot::new("Group").with_id(1u64).with_snapshot_id(10u64),
            raw_node(2).with_snapshot_id(20u64).with_parent(1u64),
            raw_node(3).with_snapshot_id(30u64).with_parent(1u64),
        ],
        vec![RawId::Int(10), RawId::Int(20), RawId::Int(30)],
    );
    raw.frames.push(RawFrame::new(
        None,
        vec![RawId::Int(10), RawId::Int(30), RawId::Int(20)],
    ));

    let design = loader().load(&raw).unwrap();
    let group = ObjectId::from_u64(1);
    let expected = [ObjectId::from_u64(2), ObjectId::from_u64(3)];
    for frame in design.frames() {
        assert!(frame.validate().is_valid());
        assert_eq!(frame.object(group).unwrap().children(), &expected);
    }
}

#[test]
fn clip_cannot_reach_outside_objects() {
    let mut sample = sample_design();
    let mut frame = sample.design.derive_frame(sample.second).unwrap();
    let clip = vec![raw_edge(sample.a, sample.b)];
    let err = loader()
        .load_snapshots(&clip, &mut frame, IdentityStrategy::CreateNew)
        .unwrap_err();
    assert_eq!(
        err.item_error(),
        Some(&ItemError::UnknownId(RawId::from(sample.a)))
    );
}
