//! Clipboard Pruning Tests
//!
//! Any selection of a valid frame prunes to a self-consistent subset that
//! pastes into an empty frame without errors.

use crate::common::*;
use proptest::prelude::*;
use std::collections::HashSet;

fn selected(frame: &dyn FrameView, mask: &[bool]) -> Vec<ObjectId> {
    frame
        .object_ids()
        .into_iter()
        .zip(mask.iter().copied().chain(std::iter::repeat(false)))
        .filter_map(|(id, keep)| keep.then_some(id))
        .collect()
}

proptest! {
    #[test]
    fn pruned_subset_is_self_consistent(mask in prop::collection::vec(any::<bool>(), 0..12)) {
        let sample = sample_design();
        let frame = sample.design.frame(sample.second).unwrap();
        let selection = selected(&**frame, &mask);
        let pruned = DesignExtractor::new().extract_pruning(&selection, &**frame);

        let kept: HashSet<RawId> = pruned.iter().filter_map(|s| s.id.clone()).collect();
        for snapshot in &pruned {
            let id = snapshot.id.clone().unwrap();
            prop_assert!(selection.iter().any(|s| RawId::from(*s) == id));
            for reference in &snapshot.structure.references {
                prop_assert!(kept.contains(reference));
            }
            if let Some(parent) = &snapshot.parent {
                prop_assert!(kept.contains(parent));
            }
            for child in &snapshot.children {
                prop_assert!(kept.contains(child));
            }
        }
    }

    #[test]
    fn pruned_subset_pastes_cleanly(mask in prop::collection::vec(any::<bool>(), 0..12)) {
        let mut sample = sample_design();
        let frame = sample.design.frame(sample.second).unwrap();
        let selection = selected(&**frame, &mask);
        let pruned = DesignExtractor::new().extract_pruning(&selection, &**frame);

        let mut target = sample.design.create_frame();
        let objects = loader()
            .load_snapshots(&pruned, &mut target, IdentityStrategy::CreateNew)
            .unwrap();
        prop_assert_eq!(objects.len(), pruned.len());
        prop_assert!(target.validate().is_valid());
        prop_assert!(target.accept().is_ok());
    }
}

// ============================================================================
// Specific selections
// ============================================================================

#[test]
fn selecting_everything_keeps_everything() {
    let sample = sample_design();
    let frame = sample.design.frame(sample.second).unwrap();
    let all = frame.object_ids();
    let pruned = DesignExtractor::new().extract_pruning(&all, &**frame);
    assert_eq!(pruned, DesignExtractor::new().extract_frame(&**frame));
}

#[test]
fn edge_without_endpoint_is_dropped() {
    let sample = sample_design();
    let frame = sample.design.frame(sample.first).unwrap();
    let pruned = DesignExtractor::new().extract_pruning(&[sample.a, sample.ab], &**frame);
    assert_eq!(pruned.len(), 1);
    assert_eq!(pruned[0].id, Some(RawId::from(sample.a)));
    // a's parent (the group) was not selected
    assert_eq!(pruned[0].parent, None);
}

#[test]
fn set_keeps_only_selected_items() {
    let sample = sample_design();
    let frame = sample.design.frame(sample.first).unwrap();
    let pruned = DesignExtractor::new()
        .extract_pruning(&[sample.a, sample.c, sample.list], &**frame);

    let list = pruned
        .iter()
        .find(|s| s.id == Some(RawId::from(sample.list)))
        .unwrap();
    assert_eq!(
        list.structure,
        RawStructure::ordered_set(sample.a, vec![RawId::from(sample.c)])
    );
}

#[test]
fn set_without_owner_is_dropped() {
    let sample = sample_design();
    let frame = sample.design.frame(sample.first).unwrap();
    let pruned = DesignExtractor::new()
        .extract_pruning(&[sample.b, sample.c, sample.list], &**frame);
    let ids: Vec<RawId> = pruned.iter().filter_map(|s| s.id.clone()).collect();
    assert_eq!(ids, vec![RawId::from(sample.b), RawId::from(sample.c)]);
}

#[test]
fn group_keeps_selected_children_in_order() {
    let sample = sample_design();
    let frame = sample.design.frame(sample.second).unwrap();
    let pruned = DesignExtractor::new()
        .extract_pruning(&[sample.group, sample.c, sample.b], &**frame);

    let group = pruned
        .iter()
        .find(|s| s.id == Some(RawId::from(sample.group)))
        .unwrap();
    assert_eq!(
        group.children,
        vec![RawId::from(sample.b), RawId::from(sample.c)]
    );
}

#[test]
fn objects_outside_frame_are_ignored() {
    let sample = sample_design();
    let frame = sample.design.frame(sample.first).unwrap();
    let bc = sample
        .design
        .frame(sample.second)
        .unwrap()
        .edges()
        .into_iter()
        .map(|s| s.id())
        .find(|id| *id != sample.ab)
        .unwrap();
    let pruned = DesignExtractor::new().extract_pruning(&[bc, sample.b], &**frame);
    assert_eq!(pruned.len(), 1);
}
