//! Module: db::aggregate::path
//! Responsibility: recursive relationship-path validation over metadata and
//! store-identity providers.
//! Does not own: reverse-path derivation or aggregate type resolution.
//! Boundary: fail-fast; the first violating hop ends validation.

use crate::{
    db::aggregate::PathError,
    model::{RelationshipPath, ResourceId, ResourceMetadata, StoreId, StoreIdentity},
};

/// Validate a relationship path hop by hop, returning the related resource
/// the path reaches. An empty path is trivially valid and reaches the
/// owning resource itself.
///
/// Every resource reached by a hop must expose a primary read action and
/// live in the owning resource's backing store; a many-to-many hop checks
/// its join resource the same way before its destination.
pub fn validate_path(
    metadata: &dyn ResourceMetadata,
    stores: &dyn StoreIdentity,
    resource: ResourceId,
    path: &RelationshipPath,
) -> Result<ResourceId, PathError> {
    validate_hops(metadata, stores, stores.store_of(resource), resource, path)
}

fn validate_hops(
    metadata: &dyn ResourceMetadata,
    stores: &dyn StoreIdentity,
    origin_store: StoreId,
    resource: ResourceId,
    path: &RelationshipPath,
) -> Result<ResourceId, PathError> {
    let Some((name, rest)) = path.split_first() else {
        return Ok(resource);
    };

    let descriptor =
        metadata
            .relationship(resource, name)
            .ok_or_else(|| PathError::NoSuchRelationship {
                resource,
                name: name.to_string(),
            })?;

    // Join resource of a many-to-many hop is traversed implicitly and must
    // satisfy the same read/store constraints as the destination.
    if let Some(join) = descriptor.join_resource() {
        check_reached(metadata, stores, origin_store, resource, name, join)?;
    }

    let destination = descriptor.destination();
    check_reached(metadata, stores, origin_store, resource, name, destination)?;

    validate_hops(metadata, stores, origin_store, destination, &rest)
}

fn check_reached(
    metadata: &dyn ResourceMetadata,
    stores: &dyn StoreIdentity,
    origin_store: StoreId,
    source: ResourceId,
    name: &str,
    reached: ResourceId,
) -> Result<(), PathError> {
    if !metadata.has_primary_read(reached) {
        return Err(PathError::NoReadAction { resource: reached });
    }

    let found = stores.store_of(reached);
    if found != origin_store {
        return Err(PathError::CrossStoreBoundary {
            resource: source,
            name: name.to_string(),
            expected: origin_store,
            found,
        });
    }

    Ok(())
}
