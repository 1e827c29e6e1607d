//! In-memory box tree.
//!
//! An arena of nodes addressed by integer handle, with
//! parent/first-child/next-sibling links preserving document order.
//! The parser consults it for contextual decisions
//! (e.g. "is this `meta` under `udta` or directly under `moov`?")
//! and the whole tree is dumped to the log after a successful parse.

use log::debug;

use crate::{atom::BoxHeader, FourCC};

/// Handle into the [`BoxTree`] arena.
pub type NodeId = usize;

/// A single box record in the tree.
#[derive(Debug)]
pub struct BoxNode {
    pub(crate) header: BoxHeader,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    /// Insertion cursor, avoids walking the sibling chain on push.
    last_child: Option<NodeId>,
}

impl BoxNode {
    pub fn header(&self) -> &BoxHeader {
        &self.header
    }

    pub fn name(&self) -> &FourCC {
        &self.header.name
    }
}

/// Arena-backed parent/first-child/sibling tree of box records.
#[derive(Debug, Default)]
pub struct BoxTree {
    nodes: Vec<BoxNode>,
}

impl BoxTree {
    /// Appends a box as the last child of `parent`
    /// (or as a root box when `parent` is `None`)
    /// and returns its handle.
    pub(crate) fn push(&mut self, parent: Option<NodeId>, header: BoxHeader) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(BoxNode {
            header,
            parent,
            first_child: None,
            next_sibling: None,
            last_child: None,
        });

        if let Some(p) = parent {
            match self.nodes[p].last_child {
                Some(prev) => self.nodes[prev].next_sibling = Some(id),
                None => self.nodes[p].first_child = Some(id),
            }
            self.nodes[p].last_child = Some(id);
        }

        id
    }

    pub fn get(&self, id: NodeId) -> &BoxNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// FourCC of the node's parent, if any.
    pub fn parent_name(&self, id: NodeId) -> Option<&FourCC> {
        self.parent(id).map(|p| self.nodes[p].name())
    }

    /// Returns `true` if any ancestor of `id` carries `name`.
    pub fn has_ancestor(&self, id: NodeId, name: &FourCC) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if self.nodes[p].name() == name {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }

    /// Root boxes in document order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Children of `id` in document order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.nodes[id].first_child,
        }
    }

    /// Logs the tree indented per nesting depth.
    pub(crate) fn log(&self) {
        for root in self.roots() {
            self.log_node(root, 0);
        }
    }

    fn log_node(&self, id: NodeId, level: usize) {
        let node = &self.nodes[id];
        debug!(
            "{}- {} @{} size {}",
            "  ".repeat(level),
            node.name(),
            node.header.offset,
            node.header.size,
        );
        let mut child = node.first_child;
        while let Some(c) = child {
            self.log_node(c, level + 1);
            child = self.nodes[c].next_sibling;
        }
    }
}

/// Iterator over the direct children of a node.
pub struct Children<'a> {
    tree: &'a BoxTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.nodes[id].next_sibling;
        Some(id)
    }
}
