//! Box header decoding and the in-memory box tree.

mod header;
mod tree;

pub use header::BoxHeader;
pub use tree::{BoxNode, BoxTree, Children, NodeId};
