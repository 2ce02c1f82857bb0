//! Tree vertices of the spatial index.
//!
//! A [`Node`] is either a leaf holding records or an internal node holding
//! child nodes. Every node owns its subtree outright and keeps a bounding box
//! equal to the union of its direct contents' boxes.

use crate::config::{RebalancePolicy, SearchMode};
use mediatree_types::{BoundingBox, Record};
use smallvec::SmallVec;
use std::slice;
use thiserror::Error;

/// Contents of a node: records at the leaves, child nodes above them.
#[derive(Debug, Clone, PartialEq)]
pub enum Entries {
    Leaf(Vec<Record>),
    Internal(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    bbox: BoundingBox,
    entries: Entries,
}

/// A broken structural invariant, located by the child-index path from the root.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("node at {path:?} stores box {stored} but its contents span {expected}")]
    BoxMismatch {
        path: Vec<usize>,
        stored: BoundingBox,
        expected: BoundingBox,
    },

    #[error("node at {path:?} holds {entries} entries, above the fan-out bound of {max}")]
    Overflow {
        path: Vec<usize>,
        entries: usize,
        max: usize,
    },

    #[error("index counts {recorded} records but its leaves hold {actual}")]
    CountMismatch { recorded: usize, actual: usize },
}

impl Node {
    pub fn new_leaf() -> Self {
        Self {
            bbox: BoundingBox::EMPTY,
            entries: Entries::Leaf(Vec::new()),
        }
    }

    /// Internal node over `children`, with its box computed from theirs.
    pub(crate) fn new_internal(children: Vec<Node>) -> Self {
        let mut node = Self {
            bbox: BoundingBox::EMPTY,
            entries: Entries::Internal(children),
        };
        node.recompute_bbox();
        node
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.entries, Entries::Leaf(_))
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    /// Records held directly by this node. Empty for internal nodes.
    pub fn records(&self) -> &[Record] {
        match &self.entries {
            Entries::Leaf(records) => records,
            Entries::Internal(_) => &[],
        }
    }

    /// Child nodes. Empty for leaves.
    pub fn children(&self) -> &[Node] {
        match &self.entries {
            Entries::Leaf(_) => &[],
            Entries::Internal(children) => children,
        }
    }

    /// Number of direct entries (records or children).
    pub fn len(&self) -> usize {
        match &self.entries {
            Entries::Leaf(records) => records.len(),
            Entries::Internal(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn needs_split(&self, max_children: usize) -> bool {
        self.len() > max_children
    }

    fn content_bbox(&self) -> BoundingBox {
        match &self.entries {
            Entries::Leaf(records) => records.iter().fold(BoundingBox::EMPTY, |acc, r| {
                acc.union(r.bbox())
            }),
            Entries::Internal(children) => children
                .iter()
                .fold(BoundingBox::EMPTY, |acc, c| acc.union(c.bbox())),
        }
    }

    pub(crate) fn recompute_bbox(&mut self) {
        self.bbox = self.content_bbox();
    }

    /// Insert `record` into this subtree.
    ///
    /// Internal nodes descend into the child with the smallest expansion
    /// cost; ties go to the first such child. Each node on the path grows to
    /// cover the record on the way back up. With [`RebalancePolicy::Cascading`]
    /// an overflowing child is split before its parent returns; the root
    /// itself is left to the caller.
    pub(crate) fn insert(&mut self, record: Record, max_children: usize, policy: RebalancePolicy) {
        match &mut self.entries {
            Entries::Leaf(records) => {
                let bbox = *record.bbox();
                records.push(record);
                self.bbox.expand_to_include(&bbox);
            }
            Entries::Internal(children) => {
                debug_assert!(!children.is_empty(), "internal node without children");

                let best = choose_subtree(children, record.bbox());
                children[best].insert(record, max_children, policy);
                let child_bbox = *children[best].bbox();

                if policy == RebalancePolicy::Cascading {
                    split_child_at(children, best, max_children);
                }

                self.bbox.expand_to_include(&child_bbox);
            }
        }
    }

    /// Split an overflowing node with a positional cut.
    ///
    /// Entries from index `max_children / 2` onward move into a new sibling
    /// of the same kind, which is returned for the caller to link next to
    /// this node. Returns `None` when the node is within bounds.
    pub(crate) fn split(&mut self, max_children: usize) -> Option<Node> {
        if !self.needs_split(max_children) {
            return None;
        }

        let cut = max_children / 2;
        let sibling = match &mut self.entries {
            Entries::Leaf(records) => {
                let mut sibling = Node::new_leaf();
                for record in records.split_off(cut) {
                    sibling.push_record(record);
                }
                sibling
            }
            Entries::Internal(children) => Node::new_internal(children.split_off(cut)),
        };
        self.recompute_bbox();

        log::debug!(
            "Split {} node: kept {} entries, moved {} to sibling",
            if self.is_leaf() { "leaf" } else { "internal" },
            self.len(),
            sibling.len()
        );

        Some(sibling)
    }

    fn push_record(&mut self, record: Record) {
        if let Entries::Leaf(records) = &mut self.entries {
            self.bbox.expand_to_include(record.bbox());
            records.push(record);
        }
    }

    /// Split the child at `index` if it overflows, linking the sibling right after it.
    pub(crate) fn split_child(&mut self, index: usize, max_children: usize) -> bool {
        match &mut self.entries {
            Entries::Internal(children) => split_child_at(children, index, max_children),
            Entries::Leaf(_) => false,
        }
    }

    /// Collect records matching `query` under `mode`, pruning subtrees whose
    /// box does not intersect the query.
    pub(crate) fn search<'a>(&'a self, query: &BoundingBox, mode: SearchMode, out: &mut Vec<&'a Record>) {
        if !self.bbox.intersects(query) {
            return;
        }

        match &self.entries {
            Entries::Leaf(records) => {
                out.extend(records.iter().filter(|r| matches_query(r.bbox(), query, mode)));
            }
            Entries::Internal(children) => {
                for child in children {
                    child.search(query, mode, out);
                }
            }
        }
    }

    /// Remove every record whose box intersects `query` and rebuild boxes.
    ///
    /// Internal nodes recurse into every child. Emptied leaves stay in place.
    pub(crate) fn delete(&mut self, query: &BoundingBox) -> usize {
        let removed = match &mut self.entries {
            Entries::Leaf(records) => {
                let before = records.len();
                records.retain(|r| !r.bbox().intersects(query));
                before - records.len()
            }
            Entries::Internal(children) => children.iter_mut().map(|c| c.delete(query)).sum(),
        };
        self.recompute_bbox();
        removed
    }

    pub(crate) fn check(
        &self,
        path: &mut Vec<usize>,
        max_children: Option<usize>,
    ) -> Result<usize, InvariantViolation> {
        let expected = self.content_bbox();
        if expected != self.bbox {
            return Err(InvariantViolation::BoxMismatch {
                path: path.clone(),
                stored: self.bbox,
                expected,
            });
        }

        if let Some(max) = max_children
            && self.needs_split(max)
        {
            return Err(InvariantViolation::Overflow {
                path: path.clone(),
                entries: self.len(),
                max,
            });
        }

        match &self.entries {
            Entries::Leaf(records) => Ok(records.len()),
            Entries::Internal(children) => {
                let mut total = 0;
                for (i, child) in children.iter().enumerate() {
                    path.push(i);
                    total += child.check(path, max_children)?;
                    path.pop();
                }
                Ok(total)
            }
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_> {
        match &self.entries {
            Entries::Leaf(records) => Iter {
                stack: SmallVec::new(),
                records: records.iter(),
            },
            Entries::Internal(children) => {
                let mut stack = SmallVec::new();
                stack.push(children.iter());
                Iter {
                    stack,
                    records: slice::Iter::default(),
                }
            }
        }
    }
}

/// Index of the child needing the least area growth to cover `bbox`.
/// The first child wins ties.
fn choose_subtree(children: &[Node], bbox: &BoundingBox) -> usize {
    let mut best = 0;
    let mut best_cost = f64::INFINITY;

    for (i, child) in children.iter().enumerate() {
        let cost = child.bbox().expansion_cost(bbox);
        if cost < best_cost {
            best_cost = cost;
            best = i;
        }
    }

    best
}

fn split_child_at(children: &mut Vec<Node>, index: usize, max_children: usize) -> bool {
    match children[index].split(max_children) {
        Some(sibling) => {
            children.insert(index + 1, sibling);
            true
        }
        None => false,
    }
}

fn matches_query(candidate: &BoundingBox, query: &BoundingBox, mode: SearchMode) -> bool {
    match mode {
        SearchMode::Overlap => candidate.intersects(query),
        SearchMode::Exact => candidate == query,
    }
}

/// In-order iterator over the records of a subtree.
pub struct Iter<'a> {
    stack: SmallVec<[slice::Iter<'a, Node>; 8]>,
    records: slice::Iter<'a, Record>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<&'a Record> {
        loop {
            if let Some(record) = self.records.next() {
                return Some(record);
            }

            let level = self.stack.last_mut()?;
            match level.next() {
                Some(node) => match &node.entries {
                    Entries::Leaf(records) => self.records = records.iter(),
                    Entries::Internal(children) => self.stack.push(children.iter()),
                },
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
