//! Generic association service.
//!
//! Every many-to-many relation in the catalog follows the same shape: load
//! parent and child, run the relation's invariant, mutate both endpoint views
//! and persist them. This component implements that shape once, parameterized
//! by the endpoint types and an [`AssociationRules`] value; the concrete
//! instances are wired in [`crate::services::links`].
//!
//! `replace_all` is deliberately a union: requested children missing from the
//! relation are added, existing members are never detached. The one relation
//! with true replacement semantics (podcast episodes) has its own service.

use crate::error::{CatalogError, Result};
use crate::models::LinksTo;
use crate::repositories::Repository;
use crate::services::checker::require;
use std::sync::Arc;
use tracing::debug;

/// Which side's existing relation set governs the uniqueness rule.
///
/// The scan is asymmetric by design: the constraint belongs to one entity
/// type regardless of which direction the call travels. An artist can never
/// hold two albums with the same title, so both the artist->album and the
/// album->artist direction scan the artist's albums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uniqueness {
    /// No uniqueness constraint on this relation.
    None,
    /// Scan the parent's children; the incoming child's display key must not
    /// collide with an existing member's.
    ParentScan,
    /// Scan the child's reverse set; the parent's display key must not
    /// collide with an existing member's.
    ChildScan,
}

/// Per-relation validation rules injected into [`AssociationService`].
#[derive(Debug, Clone, Copy)]
pub struct AssociationRules {
    pub uniqueness: Uniqueness,
    /// Minimum number of children the parent must retain after a remove.
    pub min_on_remove: Option<usize>,
    /// Minimum number of entries a replace-all payload must carry.
    pub min_on_replace: Option<usize>,
}

impl AssociationRules {
    /// No invariants beyond existence of both endpoints.
    pub fn none() -> Self {
        Self {
            uniqueness: Uniqueness::None,
            min_on_remove: None,
            min_on_replace: None,
        }
    }

    /// Children must carry distinct display keys under this parent.
    pub fn unique_children() -> Self {
        Self {
            uniqueness: Uniqueness::ParentScan,
            min_on_remove: None,
            min_on_replace: None,
        }
    }

    /// The child's reverse set governs uniqueness of the parent's key.
    pub fn child_governed() -> Self {
        Self {
            uniqueness: Uniqueness::ChildScan,
            min_on_remove: None,
            min_on_replace: None,
        }
    }

    pub fn min_on_remove(mut self, min: usize) -> Self {
        self.min_on_remove = Some(min);
        self
    }

    pub fn min_on_replace(mut self, min: usize) -> Self {
        self.min_on_replace = Some(min);
        self
    }
}

/// Manages the bidirectional link between a parent and a child entity type.
///
/// "Parent" is only the side the call travels from; the same relation is
/// usually wired twice, once per direction, sharing the same edge storage.
pub struct AssociationService<P, C>
where
    P: LinksTo<C>,
    C: LinksTo<P>,
{
    parents: Arc<dyn Repository<P>>,
    children: Arc<dyn Repository<C>>,
    rules: AssociationRules,
}

impl<P, C> AssociationService<P, C>
where
    P: LinksTo<C>,
    C: LinksTo<P>,
{
    pub fn new(
        parents: Arc<dyn Repository<P>>,
        children: Arc<dyn Repository<C>>,
        rules: AssociationRules,
    ) -> Self {
        Self {
            parents,
            children,
            rules,
        }
    }

    async fn check_uniqueness(&self, parent: &P, child: &C) -> Result<()> {
        match self.rules.uniqueness {
            Uniqueness::None => Ok(()),
            Uniqueness::ParentScan => {
                for id in parent.links() {
                    // Re-adding an existing member is idempotent, not a clash.
                    if id == child.id() {
                        continue;
                    }
                    let member = require(self.children.as_ref(), id).await?;
                    if member.display_key() == child.display_key() {
                        return Err(CatalogError::invalid(format!(
                            "{} '{}' already exists in {}",
                            C::KIND,
                            child.display_key(),
                            P::KIND
                        )));
                    }
                }
                Ok(())
            }
            Uniqueness::ChildScan => {
                for id in child.links() {
                    if id == parent.id() {
                        continue;
                    }
                    let member = require(self.parents.as_ref(), id).await?;
                    if member.display_key() == parent.display_key() {
                        return Err(CatalogError::invalid(format!(
                            "{} cannot hold two {}s named '{}'",
                            C::KIND,
                            P::KIND,
                            parent.display_key()
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Associate an existing child with an existing parent.
    ///
    /// Fails with `NotFound` if either endpoint is missing and with
    /// `InvalidOperation` if the relation's uniqueness rule is violated.
    /// Returns the child as it now stands.
    pub async fn add(&self, parent_id: P::Id, child_id: C::Id) -> Result<C> {
        let mut child = require(self.children.as_ref(), child_id).await?;
        let mut parent = require(self.parents.as_ref(), parent_id).await?;

        self.check_uniqueness(&parent, &child).await?;

        parent.link(child_id);
        child.link(parent_id);
        self.parents.save(&parent).await?;
        let child = self.children.save(&child).await?;

        debug!(
            parent = %parent_id, child = %child_id,
            "linked {} to {}", C::KIND, P::KIND
        );
        Ok(child)
    }

    /// All children currently associated with the parent.
    pub async fn get_all(&self, parent_id: P::Id) -> Result<Vec<C>> {
        let parent = require(self.parents.as_ref(), parent_id).await?;

        let mut members = Vec::new();
        for id in parent.links() {
            // Edge rows are cascaded with their endpoints, so a dangling
            // member id is real corruption and surfaces as NotFound.
            members.push(require(self.children.as_ref(), id).await?);
        }

        Ok(members)
    }

    /// A single associated child.
    ///
    /// Fails with `InvalidOperation` if both entities exist but are not
    /// associated.
    pub async fn get_one(&self, parent_id: P::Id, child_id: C::Id) -> Result<C> {
        let parent = require(self.parents.as_ref(), parent_id).await?;
        let child = require(self.children.as_ref(), child_id).await?;

        if parent.is_linked(child_id) {
            return Ok(child);
        }

        Err(CatalogError::invalid(format!(
            "The {} is not associated with the {}",
            C::KIND,
            P::KIND
        )))
    }

    /// Merge the requested children into the relation.
    ///
    /// Every requested id must exist. Children already associated are left
    /// alone; missing ones are added through [`Self::add`], so per-relation
    /// invariants apply item by item. Returns the resulting full set.
    pub async fn replace_all(&self, parent_id: P::Id, child_ids: &[C::Id]) -> Result<Vec<C>> {
        require(self.parents.as_ref(), parent_id).await?;

        if let Some(min) = self.rules.min_on_replace {
            if child_ids.len() < min {
                return Err(CatalogError::invalid(format!(
                    "The list of {}s must contain at least {}",
                    C::KIND,
                    min
                )));
            }
        }

        for &child_id in child_ids {
            require(self.children.as_ref(), child_id).await?;

            // Reload: earlier iterations may have grown the relation.
            let parent = require(self.parents.as_ref(), parent_id).await?;
            if !parent.is_linked(child_id) {
                self.add(parent_id, child_id).await?;
            }
        }

        self.get_all(parent_id).await
    }

    /// Dissociate a child from a parent.
    ///
    /// The minimum-cardinality guard, when configured, runs before any
    /// mutation: a failed remove leaves the relation untouched.
    pub async fn remove(&self, parent_id: P::Id, child_id: C::Id) -> Result<()> {
        let mut parent = require(self.parents.as_ref(), parent_id).await?;
        let mut child = require(self.children.as_ref(), child_id).await?;

        if let Some(min) = self.rules.min_on_remove {
            if parent.is_linked(child_id) && parent.links().len() <= min {
                return Err(CatalogError::invalid(format!(
                    "{} must keep at least {} {}",
                    P::KIND,
                    min,
                    C::KIND
                )));
            }
        }

        parent.unlink(child_id);
        child.unlink(parent_id);
        self.parents.save(&parent).await?;
        self.children.save(&child).await?;

        debug!(
            parent = %parent_id, child = %child_id,
            "unlinked {} from {}", C::KIND, P::KIND
        );
        Ok(())
    }
}
