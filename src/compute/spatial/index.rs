//! Bounded fan-out spatial index over bounding-boxed records.
//!
//! The index is a small R-tree variant tuned for per-user datasets of a few
//! thousand records:
//!
//! 1. **Insertion** descends into the child whose box grows the least
//!    (first child on ties) and expands every box on the way back up.
//! 2. **Splitting** cuts an overflowing node positionally at
//!    `max_children / 2`; the new sibling is always linked into the parent,
//!    so no record is ever detached from the tree. Which nodes get checked is
//!    decided by [`RebalancePolicy`].
//! 3. **Search** prunes subtrees whose box misses the query.
//! 4. **Deletion** removes every intersecting record and rebuilds boxes
//!    bottom-up. Emptied leaves are kept; the tree never shrinks.
//!
//! ## Example
//!
//! ```rust
//! use mediatree::{BoundingBox, Record, SpatialIndex};
//!
//! let mut index = SpatialIndex::new();
//! index.insert(Record::new(1, "A", "", BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
//! index.insert(Record::new(2, "B", "", BoundingBox::new(5.0, 5.0, 15.0, 15.0)));
//! index.insert(Record::new(3, "C", "", BoundingBox::new(20.0, 20.0, 30.0, 30.0)));
//!
//! let query = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
//! assert_eq!(index.search(&query).len(), 2);
//! assert_eq!(index.search_exact(&query).len(), 1);
//!
//! assert_eq!(index.delete(&query), 2);
//! assert_eq!(index.list_all()[0].id(), 3);
//! ```

use super::node::{InvariantViolation, Iter, Node};
use crate::config::{IndexConfig, RebalancePolicy, SearchMode};
use mediatree_types::{BoundingBox, Record};
use serde::Serialize;

/// Shape statistics of an index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub records: usize,
    pub nodes: usize,
    pub leaves: usize,
    /// Levels from root to leaf, counting both
    pub depth: usize,
    /// Largest number of direct entries held by any node
    pub max_fanout: usize,
}

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    root: Node,
    config: IndexConfig,
    len: usize,
}

impl SpatialIndex {
    /// Create an empty index with the default fan-out and rebalance policy.
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    /// Create an empty index.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_children` is below 2.
    pub fn with_config(config: IndexConfig) -> Self {
        assert!(
            config.max_children >= 2,
            "max_children must be at least 2"
        );
        Self {
            root: Node::new_leaf(),
            config,
            len: 0,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Box covering every record; [`BoundingBox::EMPTY`] when there are none.
    pub fn bbox(&self) -> &BoundingBox {
        self.root.bbox()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a record, splitting nodes that overflow the fan-out bound.
    pub fn insert(&mut self, record: Record) {
        self.root
            .insert(record, self.config.max_children, self.config.rebalance);
        self.len += 1;

        if self.root.needs_split(self.config.max_children) {
            self.split_root();
        }
    }

    /// Replace the root with a new internal root holding the old root and
    /// the sibling split off it.
    fn split_root(&mut self) {
        let old_root = std::mem::replace(&mut self.root, Node::new_leaf());
        let mut new_root = Node::new_internal(vec![old_root]);
        new_root.split_child(0, self.config.max_children);
        self.root = new_root;

        log::debug!(
            "Root split: tree depth is now {}",
            self.depth()
        );
    }

    /// Records whose box intersects `query` (touching edges included).
    ///
    /// A degenerate query (`xmin > xmax` or `ymin > ymax`) matches nothing.
    pub fn search(&self, query: &BoundingBox) -> Vec<&Record> {
        self.search_with(query, SearchMode::Overlap)
    }

    /// Records whose box equals `query` exactly.
    pub fn search_exact(&self, query: &BoundingBox) -> Vec<&Record> {
        self.search_with(query, SearchMode::Exact)
    }

    pub fn search_with(&self, query: &BoundingBox, mode: SearchMode) -> Vec<&Record> {
        let mut results = Vec::new();
        if !query.is_valid() {
            log::debug!("Degenerate search box {}, matching nothing", query);
            return results;
        }
        self.root.search(query, mode, &mut results);
        results
    }

    /// Remove every record whose box intersects `query`.
    ///
    /// Returns the number of records removed. Emptied nodes stay in the tree.
    pub fn delete(&mut self, query: &BoundingBox) -> usize {
        if !query.is_valid() {
            log::debug!("Degenerate delete box {}, matching nothing", query);
            return 0;
        }
        let removed = self.root.delete(query);
        self.len -= removed;
        removed
    }

    /// All records in leaf order. The order is stable between mutations.
    pub fn list_all(&self) -> Vec<&Record> {
        self.iter().collect()
    }

    pub fn iter(&self) -> Iter<'_> {
        self.root.iter()
    }

    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut node = &self.root;
        while let Some(first) = node.children().first() {
            depth += 1;
            node = first;
        }
        depth
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            records: self.len,
            depth: self.depth(),
            ..IndexStats::default()
        };

        let mut pending = vec![&self.root];
        while let Some(node) = pending.pop() {
            stats.nodes += 1;
            stats.max_fanout = stats.max_fanout.max(node.len());
            if node.is_leaf() {
                stats.leaves += 1;
            }
            pending.extend(node.children());
        }
        stats
    }

    /// Verify every node's box against its contents and the record count
    /// against the leaves. With [`RebalancePolicy::Cascading`] the fan-out
    /// bound is checked at every node as well.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let bound = match self.config.rebalance {
            RebalancePolicy::Cascading => Some(self.config.max_children),
            RebalancePolicy::RootOnly => None,
        };

        let actual = self.root.check(&mut Vec::new(), bound)?;
        if actual != self.len {
            return Err(InvariantViolation::CountMismatch {
                recorded: self.len,
                actual,
            });
        }
        Ok(())
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a SpatialIndex {
    type Item = &'a Record;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl Extend<Record> for SpatialIndex {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }
}
