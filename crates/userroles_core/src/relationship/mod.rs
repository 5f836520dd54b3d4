//! Resource relationship contract.
//!
//! # Responsibility
//! - Describe read/write access to one named relation field between a
//!   source entity and a target entity.
//! - Keep to-one and to-many arities explicit.
//!
//! # Invariants
//! - To-one operations default to inert behavior: `set_relation` does
//!   nothing and `find_one_target` finds nothing. A to-many repository
//!   never overrides them.
//! - Target ids that do not resolve are skipped, never reported.

use crate::model::Entity;
use crate::query::{QuerySpec, ResourceList};
use crate::repo::RepoResult;
use serde::{Deserialize, Serialize};

pub mod user_roles;

/// Cardinality of a relation field as seen from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationArity {
    ToOne,
    ToMany,
}

/// Read/write access to one relation field of `Source` pointing at `Target`.
///
/// The `field_name` argument mirrors the resource field being resolved by
/// the hosting API layer.
pub trait RelationshipRepository {
    type Source: Entity;
    type Target: Entity;

    const ARITY: RelationArity;

    /// Relation field this repository serves.
    fn field_name(&self) -> &'static str;

    fn arity(&self) -> RelationArity {
        Self::ARITY
    }

    fn source_resource_type(&self) -> &'static str {
        <Self::Source as Entity>::RESOURCE_TYPE
    }

    fn target_resource_type(&self) -> &'static str {
        <Self::Target as Entity>::RESOURCE_TYPE
    }

    /// Points a to-one relation at `target_id`. Inert by default.
    fn set_relation(
        &self,
        _source_id: <Self::Source as Entity>::Id,
        _target_id: Option<<Self::Target as Entity>::Id>,
        _field_name: &str,
    ) -> RepoResult<()> {
        Ok(())
    }

    /// Replaces the related set with exactly the resolvable `target_ids`.
    fn set_relations(
        &self,
        source_id: <Self::Source as Entity>::Id,
        target_ids: &[<Self::Target as Entity>::Id],
        field_name: &str,
    ) -> RepoResult<()>;

    /// Unions the resolvable `target_ids` into the related set.
    fn add_relations(
        &self,
        source_id: <Self::Source as Entity>::Id,
        target_ids: &[<Self::Target as Entity>::Id],
        field_name: &str,
    ) -> RepoResult<()>;

    /// Removes the resolvable `target_ids` from the related set.
    fn remove_relations(
        &self,
        source_id: <Self::Source as Entity>::Id,
        target_ids: &[<Self::Target as Entity>::Id],
        field_name: &str,
    ) -> RepoResult<()>;

    /// Reads a to-one relation. Finds nothing by default.
    fn find_one_target(
        &self,
        _source_id: <Self::Source as Entity>::Id,
        _field_name: &str,
        _query: &QuerySpec,
    ) -> RepoResult<Option<Self::Target>> {
        Ok(None)
    }

    /// Reads a to-many relation through `query`.
    fn find_many_targets(
        &self,
        source_id: <Self::Source as Entity>::Id,
        field_name: &str,
        query: &QuerySpec,
    ) -> RepoResult<ResourceList<Self::Target>>;
}
