//! Foreign Producer Tests
//!
//! Objects from a producer with its own representation, loaded through the
//! ForeignObject contract into an open frame.

use crate::common::*;
use std::collections::BTreeMap;
use trellis::ForeignObject;

/// Drawing element of an external sketch tool
///
/// The tool only knows child lists and names its elements.
struct Shape {
    kind: &'static str,
    name: RawId,
    ends: Option<(RawId, RawId)>,
    children: Vec<RawId>,
    attributes: BTreeMap<String, Variant>,
}

impl Shape {
    fn new(kind: &'static str, name: &str) -> Self {
        Shape {
            kind,
            name: RawId::from(name),
            ends: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    fn connector(name: &str, from: &str, to: &str) -> Self {
        let mut shape = Shape::new("Edge", name);
        shape.ends = Some((RawId::from(from), RawId::from(to)));
        shape
    }

    fn containing(mut self, children: &[&str]) -> Self {
        self.children = children.iter().map(|c| RawId::from(*c)).collect();
        self
    }
}

impl ForeignObject for Shape {
    fn type_name(&self) -> &str {
        self.kind
    }

    fn structural_kind(&self) -> Option<&str> {
        None
    }

    fn id(&self) -> Option<&RawId> {
        Some(&self.name)
    }

    fn snapshot_id(&self) -> Option<&RawId> {
        None
    }

    fn parent(&self) -> Option<&RawId> {
        None
    }

    fn origin(&self) -> Option<&RawId> {
        self.ends.as_ref().map(|(from, _)| from)
    }

    fn target(&self) -> Option<&RawId> {
        self.ends.as_ref().map(|(_, to)| to)
    }

    fn children(&self) -> &[RawId] {
        &self.children
    }

    fn attributes(&self) -> &BTreeMap<String, Variant> {
        &self.attributes
    }
}

fn sketch() -> Vec<Shape> {
    vec![
        Shape::new("Group", "panel").containing(&["in", "out"]),
        Shape::new("Node", "in"),
        Shape::new("Node", "out"),
        Shape::connector("wire", "in", "out"),
    ]
}

#[test]
fn foreign_objects_paste_into_frame() {
    let mut sample = sample_design();
    let before = sample.design.frame(sample.second).unwrap().len();

    let mut frame = sample.design.derive_frame(sample.second).unwrap();
    let objects = loader()
        .load_foreign(&sketch(), &mut frame, IdentityStrategy::PreserveOrCreate)
        .unwrap();
    assert_eq!(objects.len(), 4);
    assert_eq!(frame.len(), before + 4);

    let panel = frame.object(objects[0]).unwrap();
    assert_eq!(panel.children(), &[objects[1], objects[2]]);
    assert_eq!(panel.name(), Some("panel"));
    assert_eq!(frame.object(objects[1]).unwrap().parent(), Some(objects[0]));
    assert_eq!(
        frame.object(objects[3]).unwrap().structure(),
        &Structure::Edge {
            origin: objects[1],
            target: objects[2],
        }
    );

    let id = frame.accept().unwrap();
    assert!(sample.design.frame(id).unwrap().validate().is_valid());
    assert_eq!(identity_counts(&sample.design).1, 0);
}

#[test]
fn foreign_child_claimed_twice_is_rejected() {
    let mut shapes = sketch();
    shapes.push(Shape::new("Group", "other").containing(&["in"]));

    let mut design = Design::new();
    let mut frame = design.create_frame();
    let err = loader()
        .load_foreign(&shapes, &mut frame, IdentityStrategy::CreateNew)
        .unwrap_err();
    assert_eq!(err.location(), Some((RawCollection::Snapshots, 4)));
    assert!(frame.is_empty());
    frame.discard();
    assert_eq!(identity_counts(&design), (0, 0));
}

#[test]
fn foreign_objects_extract_to_document() {
    let mut design = Design::new();
    let mut frame = design.create_frame();
    loader()
        .load_foreign(&sketch(), &mut frame, IdentityStrategy::CreateNew)
        .unwrap();
    let id = frame.accept().unwrap();
    design.set_history(Some(id), vec![], vec![]).unwrap();

    let raw = DesignExtractor::new().extract(&design);
    let reloaded = loader().load(&raw).unwrap();
    assert_eq!(reloaded.current_frame_id(), Some(id));
    assert_eq!(
        reloaded.frame(id).unwrap().snapshots(),
        design.frame(id).unwrap().snapshots()
    );
}
