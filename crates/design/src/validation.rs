//! Structural integrity validation for frames
//!
//! A frame is structurally sound when:
//! - every edge origin/target is present and node-typed
//! - every ordered-set owner and item is present
//! - every parent is present and lists the object among its children
//! - every listed child is present and points back to its parent
//! - no parent chain forms a cycle
//!
//! Validation accumulates every violation instead of stopping at the first,
//! the same way the transaction validator collects conflicts.

use crate::error::StructuralIntegrityError;
use crate::frame::FrameView;
use crate::snapshot::Structure;
use std::collections::HashSet;
use trellis_core::{ObjectId, StructuralType};

/// Result of structural validation
///
/// A frame may become stable only if `is_valid()` returns true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// All violations detected
    pub violations: Vec<StructuralIntegrityError>,
}

impl IntegrityReport {
    /// Report without violations
    pub fn ok() -> Self {
        IntegrityReport::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: IntegrityReport) {
        self.violations.extend(other.violations);
    }
}

/// Validate edges and ordered sets
pub fn validate_references<F: FrameView + ?Sized>(frame: &F) -> IntegrityReport {
    let mut report = IntegrityReport::ok();

    for snapshot in frame.snapshots() {
        let object = snapshot.id();
        match snapshot.structure() {
            Structure::Unstructured | Structure::Node => {}
            Structure::Edge { origin, target } => {
                for endpoint in [*origin, *target] {
                    match frame.object(endpoint) {
                        None => report
                            .violations
                            .push(StructuralIntegrityError::BrokenReference {
                                object,
                                reference: endpoint,
                            }),
                        Some(end) if end.object_type().structural_type != StructuralType::Node => {
                            report
                                .violations
                                .push(StructuralIntegrityError::EdgeEndpointNotNode {
                                    edge: object,
                                    endpoint,
                                })
                        }
                        Some(_) => {}
                    }
                }
            }
            Structure::OrderedSet { owner, items } => {
                for reference in std::iter::once(owner).chain(items.iter()) {
                    if !frame.contains(*reference) {
                        report
                            .violations
                            .push(StructuralIntegrityError::BrokenReference {
                                object,
                                reference: *reference,
                            });
                    }
                }
            }
        }
    }

    report
}

/// Validate parent pointers against child lists
pub fn validate_hierarchy<F: FrameView + ?Sized>(frame: &F) -> IntegrityReport {
    let mut report = IntegrityReport::ok();

    for snapshot in frame.snapshots() {
        let object = snapshot.id();

        if let Some(parent) = snapshot.parent() {
            match frame.object(parent) {
                None => report
                    .violations
                    .push(StructuralIntegrityError::MissingParent { object, parent }),
                Some(p) if !p.children().contains(&object) => {
                    report
                        .violations
                        .push(StructuralIntegrityError::ChildrenMismatch {
                            parent,
                            child: object,
                        })
                }
                Some(_) => {}
            }
        }

        for child in snapshot.children() {
            match frame.object(*child) {
                Some(c) if c.parent() == Some(object) => {}
                Some(_) => report
                    .violations
                    .push(StructuralIntegrityError::ChildrenMismatch {
                        parent: object,
                        child: *child,
                    }),
                None => report
                    .violations
                    .push(StructuralIntegrityError::BrokenReference {
                        object,
                        reference: *child,
                    }),
            }
        }
    }

    report.merge(validate_acyclic(frame));
    report
}

/// Detect parent chains that loop back on themselves
///
/// Each cycle is reported once, at its smallest object id.
pub fn validate_acyclic<F: FrameView + ?Sized>(frame: &F) -> IntegrityReport {
    let mut report = IntegrityReport::ok();
    let mut settled: HashSet<ObjectId> = HashSet::new();

    for snapshot in frame.snapshots() {
        let mut path: Vec<ObjectId> = Vec::new();
        let mut on_path: HashSet<ObjectId> = HashSet::new();
        let mut current = Some(snapshot.id());

        while let Some(id) = current {
            if settled.contains(&id) {
                break;
            }
            if !on_path.insert(id) {
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                let object = path[start..].iter().copied().min().unwrap_or(id);
                report
                    .violations
                    .push(StructuralIntegrityError::ParentCycle { object });
                break;
            }
            path.push(id);
            current = frame.object(id).and_then(|s| s.parent());
        }
        settled.extend(path);
    }

    report
}

/// Full structural validation of a frame
pub fn validate_structure<F: FrameView + ?Sized>(frame: &F) -> IntegrityReport {
    let mut report = validate_references(frame);
    report.merge(validate_hierarchy(frame));
    report
}
