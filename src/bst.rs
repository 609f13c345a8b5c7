use std::cmp::Ordering;

use crate::error::TreeError;

// https://en.wikipedia.org/wiki/Binary_search_tree
// Nodes live in a flat slot pool and refer to each other by index, so a node
// can hold a back-reference to its parent without creating an ownership cycle.
// Slots vacated by delete go on a free list and are reused by later inserts.

/// Index of a live node inside a tree's slot pool.
///
/// Ids are stable across rotations and unrelated mutations, but deleting a
/// node invalidates its id (the slot may be handed to a future insert).
pub type NodeId = usize;

struct Node<K> {
    key: K,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    // Cached subtree height, maintained by the AVL layer only. A missing
    // child counts as -1, so a leaf has height 0.
    height: i32,
}

pub struct Bst<K: Ord> {
    slots: Vec<Option<Node<K>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl<K: Ord> Bst<K> {
    /// Constructor method for an empty tree
    pub fn new() -> Self {
        Bst { slots: Vec::new(), free: Vec::new(), root: None, len: 0 }
    }

    /// Returns the number of keys currently stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the root node id, or None for an empty tree
    ///
    /// The root can change under insert, delete, and rotation, so callers
    /// holding node ids should re-read it after any mutation.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the key stored at a live node id
    ///
    /// Panics if the id was invalidated by an earlier delete.
    pub fn key(&self, id: NodeId) -> &K {
        &self.node(id).key
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Search method for the tree
    ///
    /// Follows comparison-driven descent from the root and returns the node
    /// holding an equal key, or None if no such key is stored. O(h).
    pub fn search(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            cur = match key.cmp(&self.node(id).key) {
                Ordering::Less => self.node(id).left,
                Ordering::Greater => self.node(id).right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Returns the node holding the smallest key
    pub fn minimum(&self) -> Result<NodeId, TreeError> {
        match self.root {
            Some(r) => Ok(self.minimum_from(r)),
            None => Err(TreeError::EmptyTree),
        }
    }

    /// Returns the node holding the largest key
    pub fn maximum(&self) -> Result<NodeId, TreeError> {
        match self.root {
            Some(r) => Ok(self.maximum_from(r)),
            None => Err(TreeError::EmptyTree),
        }
    }

    /// Smallest key in the subtree rooted at `id`: follow left children down
    pub fn minimum_from(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(l) = self.node(cur).left {
            cur = l;
        }
        cur
    }

    /// Largest key in the subtree rooted at `id`: follow right children down
    pub fn maximum_from(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(r) = self.node(cur).right {
            cur = r;
        }
        cur
    }

    /// Returns the node with the next key in sorted order, or None if `id`
    /// holds the largest key
    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        // With a right subtree the successor is its minimum
        if let Some(r) = self.node(id).right {
            return Some(self.minimum_from(r));
        }
        // Otherwise climb until we leave a left subtree
        let mut cur = id;
        let mut up = self.node(cur).parent;
        while let Some(p) = up {
            if self.node(p).left == Some(cur) {
                return Some(p);
            }
            cur = p;
            up = self.node(p).parent;
        }
        None
    }

    /// Returns the node with the previous key in sorted order, or None if
    /// `id` holds the smallest key
    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(l) = self.node(id).left {
            return Some(self.maximum_from(l));
        }
        let mut cur = id;
        let mut up = self.node(cur).parent;
        while let Some(p) = up {
            if self.node(p).right == Some(cur) {
                return Some(p);
            }
            cur = p;
            up = self.node(p).parent;
        }
        None
    }

    /// Inserts a key as a new leaf and returns its node id
    ///
    /// Fails with DuplicateKey if an equal key is already stored; the tree
    /// is untouched in that case.
    pub fn insert(&mut self, key: K) -> Result<NodeId, TreeError> {
        // Descend to the leaf position the key belongs in, remembering the
        // last node passed so it can become the new node's parent
        let mut parent = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            parent = Some(id);
            cur = match key.cmp(&self.node(id).key) {
                Ordering::Less => self.node(id).left,
                Ordering::Greater => self.node(id).right,
                Ordering::Equal => return Err(TreeError::DuplicateKey),
            };
        }

        let id = self.alloc(Node { key, parent, left: None, right: None, height: 0 });
        match parent {
            None => self.root = Some(id),
            Some(p) => {
                // The descent ended on this side of the parent
                if self.node(id).key < self.node(p).key {
                    self.node_mut(p).left = Some(id);
                } else {
                    self.node_mut(p).right = Some(id);
                }
            }
        }
        self.len += 1;
        Ok(id)
    }

    /// Deletes the node at `id` and returns its key to the caller
    ///
    /// The slot is recycled, so `id` must not be used afterwards.
    pub fn delete(&mut self, id: NodeId) -> K {
        self.delete_inner(id).0
    }

    /// Convenience wrapper: search for the key, then delete its node
    pub fn remove(&mut self, key: &K) -> Option<K> {
        self.search(key).map(|id| self.delete(id))
    }

    /// Delete via subtree transplant (the three CLRS cases), also returning
    /// the lowest node whose subtree changed shape. The AVL layer starts its
    /// rebalancing walk there.
    pub(crate) fn delete_inner(&mut self, z: NodeId) -> (K, Option<NodeId>) {
        let start;
        match (self.node(z).left, self.node(z).right) {
            // At most one child: splice z out directly
            (None, r) => {
                start = self.node(z).parent;
                self.transplant(z, r);
            }
            (l @ Some(_), None) => {
                start = self.node(z).parent;
                self.transplant(z, l);
            }
            (Some(zl), Some(zr)) => {
                // Two children: the in-order successor y (minimum of the
                // right subtree, so it has no left child) takes z's place
                let y = self.minimum_from(zr);
                if self.node(y).parent == Some(z) {
                    // y moves up one level; y itself is the lowest node
                    // whose subtree changed
                    start = Some(y);
                } else {
                    // Detach y from deeper in the right subtree first, then
                    // give it z's right subtree
                    start = self.node(y).parent;
                    let yr = self.node(y).right;
                    self.transplant(y, yr);
                    self.node_mut(y).right = Some(zr);
                    self.node_mut(zr).parent = Some(y);
                }
                self.transplant(z, Some(y));
                self.node_mut(y).left = Some(zl);
                self.node_mut(zl).parent = Some(y);
            }
        }

        let node = self.slots[z].take().expect("deleted slot must be live");
        self.free.push(z);
        self.len -= 1;
        (node.key, start)
    }

    /// Pivots the subtree rooted at `x` around its right child
    ///
    /// Fails with MissingChild if `x` has no right child. Updates the root
    /// if `x` was the root.
    pub fn rotate_left(&mut self, x: NodeId) -> Result<(), TreeError> {
        let y = self.node(x).right.ok_or(TreeError::MissingChild)?;

        // y's left subtree becomes x's right subtree
        let beta = self.node(y).left;
        self.node_mut(x).right = beta;
        if let Some(b) = beta {
            self.node_mut(b).parent = Some(x);
        }

        // y takes x's place under x's parent
        let p = self.node(x).parent;
        self.node_mut(y).parent = p;
        match p {
            None => self.root = Some(y),
            Some(pid) => {
                if self.node(pid).left == Some(x) {
                    self.node_mut(pid).left = Some(y);
                } else {
                    self.node_mut(pid).right = Some(y);
                }
            }
        }

        // x becomes y's left child
        self.node_mut(y).left = Some(x);
        self.node_mut(x).parent = Some(y);
        Ok(())
    }

    /// Pivots the subtree rooted at `x` around its left child
    ///
    /// Mirror image of `rotate_left`.
    pub fn rotate_right(&mut self, x: NodeId) -> Result<(), TreeError> {
        let y = self.node(x).left.ok_or(TreeError::MissingChild)?;

        let beta = self.node(y).right;
        self.node_mut(x).left = beta;
        if let Some(b) = beta {
            self.node_mut(b).parent = Some(x);
        }

        let p = self.node(x).parent;
        self.node_mut(y).parent = p;
        match p {
            None => self.root = Some(y),
            Some(pid) => {
                if self.node(pid).left == Some(x) {
                    self.node_mut(pid).left = Some(y);
                } else {
                    self.node_mut(pid).right = Some(y);
                }
            }
        }

        self.node_mut(y).right = Some(x);
        self.node_mut(x).parent = Some(y);
        Ok(())
    }

    /// Visits every key in sorted order
    ///
    /// Iterative with an explicit stack: tree depth is caller-controlled for
    /// a plain BST, so recursion depth must not track it.
    pub fn in_order<F: FnMut(&K)>(&self, mut visit: F) {
        let mut stack: Vec<NodeId> = Vec::new();
        let mut cur = self.root;
        while cur.is_some() || !stack.is_empty() {
            // Push the whole left spine, then visit on the way back up
            while let Some(id) = cur {
                stack.push(id);
                cur = self.node(id).left;
            }
            let id = stack.pop().expect("spine was just pushed");
            visit(&self.node(id).key);
            cur = self.node(id).right;
        }
    }

    /// Visits every key parent-first
    pub fn pre_order<F: FnMut(&K)>(&self, mut visit: F) {
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            visit(&self.node(id).key);
            // Right pushed first so the left subtree pops first
            if let Some(r) = self.node(id).right {
                stack.push(r);
            }
            if let Some(l) = self.node(id).left {
                stack.push(l);
            }
        }
    }

    /// Visits every key children-first
    pub fn post_order<F: FnMut(&K)>(&self, mut visit: F) {
        let mut stack: Vec<(NodeId, bool)> = self.root.into_iter().map(|r| (r, false)).collect();
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                visit(&self.node(id).key);
            } else {
                stack.push((id, true));
                if let Some(r) = self.node(id).right {
                    stack.push((r, false));
                }
                if let Some(l) = self.node(id).left {
                    stack.push((l, false));
                }
            }
        }
    }

    /// Replaces the subtree rooted at `u` with the subtree rooted at `v` as
    /// a child of `u`'s parent. Does not touch `u`'s own child links; the
    /// caller either frees `u` or re-links it immediately.
    fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
        let p = self.node(u).parent;
        match p {
            None => self.root = v,
            Some(pid) => {
                if self.node(pid).left == Some(u) {
                    self.node_mut(pid).left = v;
                } else {
                    self.node_mut(pid).right = v;
                }
            }
        }
        if let Some(vid) = v {
            self.node_mut(vid).parent = p;
        }
    }

    /// Places a node in a recycled slot if one is free, otherwise grows the
    /// pool by one
    fn alloc(&mut self, node: Node<K>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn node(&self, id: NodeId) -> &Node<K> {
        self.slots[id].as_ref().expect("node id must reference a live slot")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K> {
        self.slots[id].as_mut().expect("node id must reference a live slot")
    }

    pub(crate) fn height(&self, id: NodeId) -> i32 {
        self.node(id).height
    }

    pub(crate) fn set_height(&mut self, id: NodeId, height: i32) {
        self.node_mut(id).height = height;
    }

    /// Height of an optional child, with a missing child counting as -1
    pub(crate) fn child_height(&self, id: Option<NodeId>) -> i32 {
        id.map_or(-1, |c| self.node(c).height)
    }
}

impl<K: Ord> Default for Bst<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    fn collect_in_order(tree: &Bst<i32>) -> Vec<i32> {
        let mut out = Vec::new();
        tree.in_order(|k| out.push(*k));
        out
    }

    /// Every (id, parent, left, right) link in the tree, parent-first.
    fn link_snapshot(tree: &Bst<i32>) -> Vec<(NodeId, Option<NodeId>, Option<NodeId>, Option<NodeId>)> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = tree.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push((id, tree.parent(id), tree.left(id), tree.right(id)));
            if let Some(r) = tree.right(id) {
                stack.push(r);
            }
            if let Some(l) = tree.left(id) {
                stack.push(l);
            }
        }
        out
    }

    #[test]
    fn test_empty_tree() {
        let tree: Bst<i32> = Bst::new();
        assert!(tree.is_empty());
        assert_eq!(tree.search(&1), None);
        assert_eq!(tree.minimum(), Err(TreeError::EmptyTree));
        assert_eq!(tree.maximum(), Err(TreeError::EmptyTree));
    }

    #[test]
    fn test_insert_in_order_sorted() {
        let mut tree = Bst::new();
        for k in [50, 30, 70, 20, 40, 60, 80, 10, 90] {
            tree.insert(k).unwrap();
        }
        assert_eq!(collect_in_order(&tree), vec![10, 20, 30, 40, 50, 60, 70, 80, 90]);
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn test_duplicate_insert_leaves_tree_unchanged() {
        let mut tree = Bst::new();
        for k in [5, 1, 3, 8] {
            tree.insert(k).unwrap();
        }
        let before = link_snapshot(&tree);
        assert_eq!(tree.insert(3), Err(TreeError::DuplicateKey));
        assert_eq!(link_snapshot(&tree), before);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_delete_root_round_trip() {
        let mut tree = Bst::new();
        for k in [5, 1, 3, 8] {
            tree.insert(k).unwrap();
        }
        assert_eq!(tree.remove(&5), Some(5));
        assert_eq!(collect_in_order(&tree), vec![1, 3, 8]);
    }

    #[test]
    fn test_delete_leaf_and_single_child() {
        let mut tree = Bst::new();
        for k in [10, 5, 15, 3] {
            tree.insert(k).unwrap();
        }
        // 3 is a leaf
        assert_eq!(tree.remove(&3), Some(3));
        assert_eq!(collect_in_order(&tree), vec![5, 10, 15]);
        // 5 now has no children; give it one and delete it
        tree.insert(7).unwrap();
        assert_eq!(tree.remove(&5), Some(5));
        assert_eq!(collect_in_order(&tree), vec![7, 10, 15]);
        // 7's parent should now be the root
        let seven = tree.search(&7).unwrap();
        assert_eq!(tree.parent(seven), tree.root());
    }

    #[test]
    fn test_delete_two_children_distant_successor() {
        let mut tree = Bst::new();
        for k in [10, 5, 20, 15, 30, 12, 17] {
            tree.insert(k).unwrap();
        }
        // 10's successor is 12, which is not its immediate right child
        assert_eq!(tree.remove(&10), Some(10));
        assert_eq!(collect_in_order(&tree), vec![5, 12, 15, 17, 20, 30]);
        assert_eq!(*tree.key(tree.root().unwrap()), 12);
    }

    #[test]
    fn test_delete_missing_key() {
        let mut tree = Bst::new();
        tree.insert(1).unwrap();
        assert_eq!(tree.remove(&2), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_minimum_maximum() {
        let mut tree = Bst::new();
        for k in [8, 3, 10, 1, 6, 14, 4, 7, 13] {
            tree.insert(k).unwrap();
        }
        assert_eq!(*tree.key(tree.minimum().unwrap()), 1);
        assert_eq!(*tree.key(tree.maximum().unwrap()), 14);
    }

    #[test]
    fn test_successor_predecessor_walk() {
        let mut tree = Bst::new();
        let keys = [8, 3, 10, 1, 6, 14, 4, 7, 13];
        for k in keys {
            tree.insert(k).unwrap();
        }
        // Walk forwards from the minimum
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        let mut cur = Some(tree.minimum().unwrap());
        let mut seen = Vec::new();
        while let Some(id) = cur {
            seen.push(*tree.key(id));
            cur = tree.successor(id);
        }
        assert_eq!(seen, sorted);
        // And backwards from the maximum
        let mut cur = Some(tree.maximum().unwrap());
        let mut seen = Vec::new();
        while let Some(id) = cur {
            seen.push(*tree.key(id));
            cur = tree.predecessor(id);
        }
        sorted.reverse();
        assert_eq!(seen, sorted);
    }

    #[test]
    fn test_rotation_round_trip_restores_links() {
        let mut tree = Bst::new();
        for k in [10, 5, 20, 15, 30] {
            tree.insert(k).unwrap();
        }
        let pivot = tree.search(&10).unwrap();
        let before = link_snapshot(&tree);

        tree.rotate_left(pivot).unwrap();
        // 20 is now the root with 10 as its left child
        assert_eq!(*tree.key(tree.root().unwrap()), 20);
        assert_eq!(collect_in_order(&tree), vec![5, 10, 15, 20, 30]);

        let new_root = tree.root().unwrap();
        tree.rotate_right(new_root).unwrap();
        assert_eq!(link_snapshot(&tree), before);
    }

    #[test]
    fn test_rotate_missing_child() {
        let mut tree = Bst::new();
        let id = tree.insert(1).unwrap();
        assert_eq!(tree.rotate_left(id), Err(TreeError::MissingChild));
        assert_eq!(tree.rotate_right(id), Err(TreeError::MissingChild));
        // Failed rotation leaves the tree alone
        assert_eq!(tree.root(), Some(id));
    }

    #[test]
    fn test_rotate_updates_parent_links() {
        let mut tree = Bst::new();
        for k in [10, 5, 20, 15, 30] {
            tree.insert(k).unwrap();
        }
        let twenty = tree.search(&20).unwrap();
        tree.rotate_left(twenty).unwrap();
        // 30 took 20's place under the root
        let thirty = tree.search(&30).unwrap();
        assert_eq!(tree.parent(thirty), tree.root());
        assert_eq!(tree.left(thirty), Some(twenty));
        assert_eq!(collect_in_order(&tree), vec![5, 10, 15, 20, 30]);
    }

    #[test]
    fn test_traversal_orders() {
        let mut tree = Bst::new();
        for k in [4, 2, 6, 1, 3, 5, 7] {
            tree.insert(k).unwrap();
        }
        let mut pre = Vec::new();
        tree.pre_order(|k| pre.push(*k));
        assert_eq!(pre, vec![4, 2, 1, 3, 6, 5, 7]);

        let mut post = Vec::new();
        tree.post_order(|k| post.push(*k));
        assert_eq!(post, vec![1, 3, 2, 5, 7, 6, 4]);

        assert_eq!(collect_in_order(&tree), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_slot_reuse_after_delete() {
        let mut tree = Bst::new();
        for k in 0..16 {
            tree.insert(k).unwrap();
        }
        for k in 0..8 {
            tree.remove(&k);
        }
        let pool_size = tree.slots.len();
        for k in 100..108 {
            tree.insert(k).unwrap();
        }
        // The eight freed slots were recycled, not appended
        assert_eq!(tree.slots.len(), pool_size);
        assert_eq!(collect_in_order(&tree), (8..16).chain(100..108).collect::<Vec<_>>());
    }

    #[test]
    fn test_random_insert_delete_stays_sorted() {
        let mut rng = rand::rng();
        let mut keys: Vec<i32> = (0..200).collect();
        keys.shuffle(&mut rng);

        let mut tree = Bst::new();
        for &k in &keys {
            tree.insert(k).unwrap();
        }
        assert_eq!(collect_in_order(&tree), (0..200).collect::<Vec<_>>());

        let mut to_delete = keys.clone();
        to_delete.shuffle(&mut rng);
        to_delete.truncate(100);
        for k in &to_delete {
            assert_eq!(tree.remove(k), Some(*k));
        }

        let mut expected: Vec<i32> = (0..200).filter(|k| !to_delete.contains(k)).collect();
        expected.sort_unstable();
        assert_eq!(collect_in_order(&tree), expected);
    }
}
