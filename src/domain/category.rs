//! Category tree
//!
//! Categories persist flat (id, parent id, sibling order) and render
//! nested, at most three levels deep. Drag-and-drop reordering only ever
//! moves a category among its own siblings; the new 0-based positions go
//! back to the store in one batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum nesting the dashboard renders.
pub const MAX_DEPTH: usize = 3;

/// Flat category record as persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sort_order: u32,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// New sibling position to persist after a reorder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAssignment {
    pub id: String,
    pub sort_order: u32,
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("category {0} references a parent that does not exist")]
    UnknownParent(String),

    #[error("cannot move a category under a different parent")]
    CrossParentMove,

    #[error("category tree exceeds {MAX_DEPTH} levels")]
    TooDeep,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Persistence seam for sibling order updates.
pub trait CategoryStore {
    fn persist(&mut self, assignments: &[OrderAssignment]) -> Result<(), CategoryError>;

    /// Last known-good flat records, used to rebuild after a failed persist.
    fn reload(&mut self) -> Result<Vec<Category>, CategoryError>;
}

/// In-memory view of the category hierarchy.
#[derive(Clone, Debug, Default)]
pub struct CategoryTree {
    records: Vec<Category>,
}

impl CategoryTree {
    /// Builds the tree from flat records, validating parent links and depth.
    pub fn from_records(records: Vec<Category>) -> Result<Self, CategoryError> {
        let tree = Self { records };
        for category in &tree.records {
            tree.depth_of(category)?;
        }
        Ok(tree)
    }

    pub fn records(&self) -> &[Category] {
        &self.records
    }

    /// Direct children of `parent_id` (or the roots), in sibling order.
    pub fn children(&self, parent_id: Option<&str>) -> Vec<&Category> {
        let mut siblings: Vec<&Category> = self
            .records
            .iter()
            .filter(|c| c.parent_id.as_deref() == parent_id)
            .collect();
        siblings.sort_by_key(|c| c.sort_order);
        siblings
    }

    /// Moves `dragged_id` to `target_id`'s position among their shared
    /// siblings and renumbers the whole sibling list 0-based. Returns the
    /// assignments to persist. The tree is left untouched on any error.
    pub fn reorder(
        &mut self,
        dragged_id: &str,
        target_id: &str,
    ) -> Result<Vec<OrderAssignment>, CategoryError> {
        let dragged = self.get(dragged_id)?;
        let target = self.get(target_id)?;
        if dragged.parent_id != target.parent_id {
            return Err(CategoryError::CrossParentMove);
        }
        let parent = dragged.parent_id.clone();

        let mut siblings: Vec<String> = self
            .children(parent.as_deref())
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        let from = siblings
            .iter()
            .position(|id| id == dragged_id)
            .ok_or_else(|| CategoryError::UnknownCategory(dragged_id.to_string()))?;
        let to = siblings
            .iter()
            .position(|id| id == target_id)
            .ok_or_else(|| CategoryError::UnknownCategory(target_id.to_string()))?;

        let moved = siblings.remove(from);
        siblings.insert(to, moved);

        let assignments: Vec<OrderAssignment> = siblings
            .iter()
            .enumerate()
            .map(|(position, id)| OrderAssignment {
                id: id.clone(),
                sort_order: position as u32,
            })
            .collect();

        for assignment in &assignments {
            if let Some(record) = self.records.iter_mut().find(|c| c.id == assignment.id) {
                record.sort_order = assignment.sort_order;
            }
        }
        Ok(assignments)
    }

    /// Reorders and persists; a failed persist reverts the in-memory tree
    /// to the store's last known-good state before surfacing the error.
    pub fn reorder_and_persist<S: CategoryStore>(
        &mut self,
        store: &mut S,
        dragged_id: &str,
        target_id: &str,
    ) -> Result<(), CategoryError> {
        let assignments = self.reorder(dragged_id, target_id)?;
        if let Err(err) = store.persist(&assignments) {
            *self = Self::from_records(store.reload()?)?;
            return Err(err);
        }
        Ok(())
    }

    fn get(&self, id: &str) -> Result<&Category, CategoryError> {
        self.records
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CategoryError::UnknownCategory(id.to_string()))
    }

    /// 1-based nesting level, walking the parent chain. The depth cap also
    /// bounds the walk, so a cyclic parent link surfaces as `TooDeep`.
    fn depth_of(&self, category: &Category) -> Result<usize, CategoryError> {
        let mut depth = 1;
        let mut current = category;
        while let Some(parent_id) = current.parent_id.as_deref() {
            depth += 1;
            if depth > MAX_DEPTH {
                return Err(CategoryError::TooDeep);
            }
            current = self
                .records
                .iter()
                .find(|c| c.id == parent_id)
                .ok_or_else(|| CategoryError::UnknownParent(current.id.clone()))?;
        }
        Ok(depth)
    }
}
