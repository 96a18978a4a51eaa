//! Phase 6: build object snapshots against the metamodel

use super::{IdentityTable, ResolvedFrames, ResolvedHierarchy, ResolvedReferences, Reserved};
use crate::error::{DesignLoaderError, ItemError, RawCollection, Result};
use std::sync::Arc;
use tracing::debug;
use trellis_core::{FrameId, MetamodelView, ObjectId, ObjectType, StructuralType, Variant};
use trellis_design::{ObjectSnapshot, Structure};
use trellis_foreign::RawSnapshot;

/// Attribute filled from a string object identity in compatibility mode
const NAME_ATTRIBUTE: &str = "name";

/// Batch of immutable snapshots, not yet grouped into stable frames
pub(crate) struct Materialized {
    pub(super) snapshots: Vec<Arc<ObjectSnapshot>>,
    pub(super) members: Vec<Vec<usize>>,
    pub(super) frame_ids: Vec<FrameId>,
    pub(super) table: IdentityTable,
}

impl<'r> ResolvedHierarchy<'r> {
    /// Materialize every snapshot of the batch
    ///
    /// Attributes missing from the raw data take the object type's
    /// defaults. With `name_from_string_id`, a string object identity
    /// becomes the `name` attribute unless the raw data sets one.
    ///
    /// # Errors
    /// - `MissingObjectType` / `UnknownObjectType`
    /// - `InvalidStructuralType` for an unknown kind or a wrong number of
    ///   structural references
    /// - `StructuralTypeMismatch` if the kind differs from the type's
    pub(crate) fn materialize<M>(self, metamodel: &M, name_from_string_id: bool) -> Result<Materialized>
    where
        M: MetamodelView + ?Sized,
    {
        let ResolvedHierarchy { frames, children } = self;
        let ResolvedFrames { resolved, members, .. } = frames;
        let ResolvedReferences {
            reserved,
            references,
            parents,
            ..
        } = resolved;
        let Reserved {
            snapshots: raw,
            table,
            objects,
            snapshot_ids,
            frame_ids,
            ..
        } = reserved;

        let mut snapshots = Vec::with_capacity(raw.len());
        let items = references.into_iter().zip(parents).zip(children);
        for (index, ((refs, parent), kids)) in items.enumerate() {
            let at = |e| DesignLoaderError::item(RawCollection::Snapshots, index, e);
            let source = &raw[index];
            let object_type = lookup(metamodel, &source.type_name).map_err(at)?;
            let structure = build_structure(
                source.structure.kind.as_deref(),
                refs,
                object_type.structural_type,
            )
            .map_err(at)?;
            let attributes = fill_attributes(&object_type, source, name_from_string_id);

            let snapshot = ObjectSnapshot::new(objects[index], snapshot_ids[index], object_type, structure)
                .expect("structure kind was checked against the object type")
                .with_parent(parent)
                .with_children(kids)
                .with_attributes(attributes);
            snapshots.push(Arc::new(snapshot));
        }

        debug!(target: "trellis::loader", snapshots = snapshots.len(), "Snapshots materialized");
        Ok(Materialized {
            snapshots,
            members,
            frame_ids,
            table,
        })
    }
}

impl Materialized {
    /// Snapshots in batch order (reduced path)
    pub(crate) fn into_snapshots(self) -> Vec<Arc<ObjectSnapshot>> {
        self.snapshots
    }
}

fn lookup<M>(metamodel: &M, type_name: &str) -> std::result::Result<Arc<ObjectType>, ItemError>
where
    M: MetamodelView + ?Sized,
{
    if type_name.is_empty() {
        return Err(ItemError::MissingObjectType);
    }
    metamodel
        .object_type(type_name)
        .ok_or_else(|| ItemError::UnknownObjectType(type_name.to_string()))
}

/// Structure from a declared kind and resolved references
///
/// A missing kind takes the object type's structural type.
fn build_structure(
    kind: Option<&str>,
    references: Vec<ObjectId>,
    expected: StructuralType,
) -> std::result::Result<Structure, ItemError> {
    let found = match kind {
        None => expected,
        Some(text) => StructuralType::from_name(text)
            .ok_or_else(|| ItemError::InvalidStructuralType(format!("unknown kind '{text}'")))?,
    };
    if found != expected {
        return Err(ItemError::StructuralTypeMismatch { expected, found });
    }

    let count = references.len();
    match found {
        StructuralType::Unstructured | StructuralType::Node if count > 0 => Err(
            ItemError::InvalidStructuralType(format!("{found} takes no references, got {count}")),
        ),
        StructuralType::Unstructured => Ok(Structure::Unstructured),
        StructuralType::Node => Ok(Structure::Node),
        StructuralType::Edge => match references.as_slice() {
            [origin, target] => Ok(Structure::Edge {
                origin: *origin,
                target: *target,
            }),
            _ => Err(ItemError::InvalidStructuralType(format!(
                "edge requires 2 references, got {count}"
            ))),
        },
        StructuralType::OrderedSet => {
            let mut refs = references.into_iter();
            let owner = refs.next().ok_or_else(|| {
                ItemError::InvalidStructuralType("ordered_set requires an owner".to_string())
            })?;
            Ok(Structure::OrderedSet {
                owner,
                items: refs.collect(),
            })
        }
    }
}

fn fill_attributes(
    object_type: &ObjectType,
    raw: &RawSnapshot,
    name_from_string_id: bool,
) -> std::collections::BTreeMap<String, Variant> {
    let mut attributes = object_type.default_attributes();
    attributes.extend(raw.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
    if name_from_string_id && !raw.attributes.contains_key(NAME_ATTRIBUTE) {
        if let Some(name) = raw.id.as_ref().and_then(|id| id.as_name()) {
            attributes.insert(NAME_ATTRIBUTE.to_string(), Variant::from(name));
        }
    }
    attributes
}
