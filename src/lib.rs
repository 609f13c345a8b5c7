//! Classical balanced search trees, implemented for study.
//!
//! Three structures share one theme — keeping an ordered search structure
//! balanced under mutation:
//!
//! - [`Bst`]: a plain binary search tree with parent back-references,
//!   transplant-based deletion, and the rotation primitives the AVL layer
//!   builds on. Operations are O(height), with no balancing of its own.
//! - [`Avl`]: the BST plus height bookkeeping and bottom-up rebalancing,
//!   guaranteeing O(log n) operations for any insertion order.
//! - [`BTree`]: a multiway tree with fixed-capacity block-style nodes and
//!   preemptive top-down splitting, the same invariant-maintenance problem
//!   under a storage model sized for block I/O.
//!
//! Trees are exclusively owned, in-memory, and single-threaded; callers
//! needing shared mutation must wrap a tree in their own lock.

pub mod avl;
pub mod b_tree;
pub mod bst;
pub mod error;

pub use avl::Avl;
pub use b_tree::BTree;
pub use bst::{Bst, NodeId};
pub use error::TreeError;
