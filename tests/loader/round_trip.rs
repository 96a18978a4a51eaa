//! Extract/Load Round Trip Tests
//!
//! A design extracted and loaded back with `RequireProvided` must be the
//! same design: frames, snapshots, hierarchy, history and named frames.

use crate::common::*;

fn reload(raw: &RawDesign) -> Design {
    let json = raw.to_json_string().unwrap();
    let parsed = RawDesign::from_json_str(&json).unwrap();
    let mut design = Design::new();
    loader()
        .load_into(&parsed, &mut design, IdentityStrategy::RequireProvided)
        .unwrap();
    design
}

// ============================================================================
// Whole designs
// ============================================================================

#[test]
fn round_trip_preserves_frames_and_snapshots() {
    let sample = sample_design();
    let raw = DesignExtractor::new().extract(&sample.design);
    let loaded = reload(&raw);

    assert_eq!(loaded.frame_ids(), sample.design.frame_ids());
    assert_eq!(loaded.snapshot_count(), sample.design.snapshot_count());
    for id in sample.design.frame_ids() {
        let original = sample.design.frame(id).unwrap();
        let copy = loaded.frame(id).unwrap();
        assert_eq!(copy.snapshots(), original.snapshots(), "frame {id}");
    }
}

#[test]
fn round_trip_preserves_history_and_names() {
    let sample = sample_design();
    let loaded = reload(&DesignExtractor::new().extract(&sample.design));

    assert_eq!(loaded.current_frame_id(), Some(sample.second));
    assert_eq!(loaded.undo_list(), &[sample.first]);
    assert!(loaded.redo_list().is_empty());
    assert_eq!(loaded.named_frame("start"), Some(sample.first));
    assert_eq!(
        loaded.named_list("milestones"),
        Some(&[sample.first, sample.second][..])
    );
    assert_eq!(loaded.metamodel_name(), Some("diagrams"));
}

#[test]
fn round_trip_preserves_child_order() {
    let sample = sample_design();
    let loaded = reload(&DesignExtractor::new().extract(&sample.design));

    let second = loaded.frame(sample.second).unwrap();
    let children: Vec<ObjectId> = second
        .children_of(sample.group)
        .iter()
        .map(|s| s.id())
        .collect();
    assert_eq!(children, vec![sample.b, sample.a, sample.c]);

    let first = loaded.frame(sample.first).unwrap();
    assert_eq!(first.object(sample.c).unwrap().parent(), None);
}

#[test]
fn round_trip_is_a_fixed_point() {
    let sample = sample_design();
    let extractor = DesignExtractor::new();
    let raw = extractor.extract(&sample.design);
    let loaded = reload(&raw);

    assert_eq!(extractor.extract(&loaded), raw);
    assert_eq!(identity_counts(&loaded), identity_counts(&sample.design));
}

#[test]
fn round_trip_shares_unchanged_versions() {
    let sample = sample_design();
    let loaded = reload(&DesignExtractor::new().extract(&sample.design));

    let first = loaded.frame(sample.first).unwrap();
    let second = loaded.frame(sample.second).unwrap();
    let b1 = first.object(sample.b).unwrap();
    let b2 = second.object(sample.b).unwrap();
    assert_eq!(b1.snapshot_id(), b2.snapshot_id());

    let a1 = first.object(sample.a).unwrap();
    let a2 = second.object(sample.a).unwrap();
    assert_ne!(a1.snapshot_id(), a2.snapshot_id());
    assert_eq!(a2.name(), Some("alpha-2"));
}

// ============================================================================
// Reloading into a populated design
// ============================================================================

#[test]
fn reload_with_preserve_or_create_duplicates_content() {
    let mut sample = sample_design();
    let raw = DesignExtractor::new().extract(&sample.design);

    let inserted = loader()
        .load_into(&raw, &mut sample.design, IdentityStrategy::PreserveOrCreate)
        .unwrap();
    assert_eq!(inserted.len(), 2);
    assert_eq!(sample.design.frame_count(), 4);
    assert!(!inserted.contains(&sample.first));
    assert!(!inserted.contains(&sample.second));

    // History and named frames now point into the copy
    assert_eq!(sample.design.current_frame_id(), Some(inserted[1]));
    assert_eq!(sample.design.named_frame("start"), Some(inserted[0]));

    let copy = sample.design.frame(inserted[1]).unwrap();
    let original = sample.design.frame(sample.second).unwrap();
    assert_eq!(copy.len(), original.len());
    assert!(copy.validate().is_valid());
    assert!(copy
        .object_ids()
        .iter()
        .all(|id| !original.contains(*id)));
}

#[test]
fn extracted_frame_loads_as_clip() {
    let mut sample = sample_design();
    let frame = sample.design.frame(sample.first).unwrap();
    let snapshots = DesignExtractor::new().extract_frame(&**frame);

    let mut target = sample.design.create_frame();
    let objects = loader()
        .load_snapshots(&snapshots, &mut target, IdentityStrategy::CreateNew)
        .unwrap();
    assert_eq!(objects.len(), 6);
    assert!(target.validate().is_valid());
    let id = target.accept().unwrap();

    let copy = sample.design.frame(id).unwrap();
    assert_eq!(copy.edges().len(), 1);
    assert_eq!(copy.filter_type("List").len(), 1);
    assert_eq!(identity_counts(&sample.design).1, 0);
}

#[test]
fn snapshots_awaiting_collection_are_not_extracted() {
    let mut sample = sample_design();
    sample.design.remove_frame(sample.first).unwrap();
    let raw = DesignExtractor::new().extract(&sample.design);

    let reloaded = reload(&raw);
    sample.design.collect_garbage();
    assert_eq!(raw, DesignExtractor::new().extract(&sample.design));
    assert_eq!(reloaded.snapshot_count(), sample.design.snapshot_count());
}
