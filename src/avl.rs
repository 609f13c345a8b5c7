use crate::bst::{Bst, NodeId};
use crate::error::TreeError;

// https://en.wikipedia.org/wiki/AVL_tree
// The AVL tree reuses the BST engine wholesale: plain BST insert/delete
// followed by a bottom-up rebalancing walk that keeps every node's cached
// height exact and every balance factor within [-1, 1].

/// Height-balanced binary search tree.
///
/// Wraps the plain [`Bst`] and restores the AVL invariant after every
/// mutation, so search, insert, and delete are all O(log n) regardless of
/// insertion order.
pub struct Avl<K: Ord> {
    tree: Bst<K>,
}

impl<K: Ord> Avl<K> {
    /// Constructor method for an empty tree
    pub fn new() -> Self {
        Avl { tree: Bst::new() }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Height of the whole tree; -1 for an empty tree, 0 for a single node
    pub fn height(&self) -> i32 {
        self.tree.child_height(self.tree.root())
    }

    /// Read-only view of the underlying BST
    ///
    /// Useful for structural inspection; mutating through the BST handle is
    /// deliberately impossible, as it could break the balance invariant.
    pub fn as_bst(&self) -> &Bst<K> {
        &self.tree
    }

    pub fn search(&self, key: &K) -> Option<NodeId> {
        self.tree.search(key)
    }

    pub fn minimum(&self) -> Result<NodeId, TreeError> {
        self.tree.minimum()
    }

    pub fn maximum(&self) -> Result<NodeId, TreeError> {
        self.tree.maximum()
    }

    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        self.tree.successor(id)
    }

    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        self.tree.predecessor(id)
    }

    pub fn in_order<F: FnMut(&K)>(&self, visit: F) {
        self.tree.in_order(visit);
    }

    pub fn pre_order<F: FnMut(&K)>(&self, visit: F) {
        self.tree.pre_order(visit);
    }

    pub fn post_order<F: FnMut(&K)>(&self, visit: F) {
        self.tree.post_order(visit);
    }

    /// Inserts a key, then rebalances upward from the new leaf's parent
    ///
    /// Fails with DuplicateKey on an equal key, leaving the tree untouched.
    /// The returned id stays valid until the key is deleted.
    pub fn insert(&mut self, key: K) -> Result<NodeId, TreeError> {
        let id = self.tree.insert(key)?;
        self.rebalance(self.tree.parent(id));
        Ok(id)
    }

    /// Deletes the node at `id`, rebalances, and returns the key
    pub fn delete(&mut self, id: NodeId) -> K {
        // The BST engine reports the lowest node whose subtree changed
        // shape; that is the first node that can be out of balance
        let (key, start) = self.tree.delete_inner(id);
        self.rebalance(start);
        key
    }

    /// Convenience wrapper: search for the key, then delete its node
    pub fn remove(&mut self, key: &K) -> Option<K> {
        self.search(key).map(|id| self.delete(id))
    }

    /// Walks from `from` to the root, recomputing heights and rotating
    /// whenever a node's balance factor leaves [-1, 1]
    fn rebalance(&mut self, from: Option<NodeId>) {
        let mut cur = from;
        while let Some(x) = cur {
            self.update_height(x);
            let top = match self.balance_factor(x) {
                bf if bf > 1 => {
                    // Left-heavy. A right-leaning left child forms a
                    // zig-zag: straighten it first, then rotate x right.
                    let l = self.tree.left(x).expect("left-heavy node has a left child");
                    if self.balance_factor(l) < 0 {
                        self.rotate_left_tracked(l);
                    }
                    self.rotate_right_tracked(x)
                }
                bf if bf < -1 => {
                    // Right-heavy, mirror case
                    let r = self.tree.right(x).expect("right-heavy node has a right child");
                    if self.balance_factor(r) > 0 {
                        self.rotate_right_tracked(r);
                    }
                    self.rotate_left_tracked(x)
                }
                _ => x,
            };
            cur = self.tree.parent(top);
        }
    }

    /// height(left) - height(right), reading the cached child heights
    fn balance_factor(&self, id: NodeId) -> i32 {
        self.tree.child_height(self.tree.left(id)) - self.tree.child_height(self.tree.right(id))
    }

    fn update_height(&mut self, id: NodeId) {
        let h = 1 + self
            .tree
            .child_height(self.tree.left(id))
            .max(self.tree.child_height(self.tree.right(id)));
        self.tree.set_height(id, h);
    }

    /// Rotation plus height fixup of the two nodes the rotation re-parents.
    /// Returns the node now rooting the rotated subtree.
    fn rotate_left_tracked(&mut self, x: NodeId) -> NodeId {
        self.tree
            .rotate_left(x)
            .expect("rebalance only rotates toward an existing child");
        let top = self.tree.parent(x).expect("pivot has a parent after rotation");
        self.update_height(x);
        self.update_height(top);
        top
    }

    fn rotate_right_tracked(&mut self, x: NodeId) -> NodeId {
        self.tree
            .rotate_right(x)
            .expect("rebalance only rotates toward an existing child");
        let top = self.tree.parent(x).expect("pivot has a parent after rotation");
        self.update_height(x);
        self.update_height(top);
        top
    }
}

impl<K: Ord> Default for Avl<K> {
    fn default() -> Self {
        Self::new()
    }
}
