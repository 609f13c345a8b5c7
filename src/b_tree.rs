use crate::error::TreeError;

// https://en.wikipedia.org/wiki/B-tree
// A B-tree with minimum degree t keeps between t-1 and 2t-1 keys in every
// node except the root, and all leaves at the same depth.

// This uses the CLRS minimum-degree definition: a node holds at most 2t-1
// keys and 2t children, and a full child is always split before the
// insertion descends into it, so the active insertion path never touches an
// already-full node.

pub struct BTree<K: Ord> {
    root: Option<Box<Node<K>>>,
    t: usize,
    len: usize,
}

// Key and child storage is a fixed-capacity block with an explicit live
// count, mirroring the fixed block size B-tree nodes are designed around.
// Slots at and past `count` are always None.
struct Node<K> {
    keys: Box<[Option<K>]>,
    children: Box<[Option<Box<Node<K>>>]>,
    count: usize,
    leaf: bool,
}

impl<K: Ord> BTree<K> {
    /// Constructor method for BTree
    ///
    /// Takes the minimum degree t: every node except the root will hold
    /// between t-1 and 2t-1 keys.
    pub fn new(t: usize) -> Self {
        assert!(t >= 2, "BTree minimum degree must be at least 2");
        BTree { root: None, t, len: 0 }
    }

    /// Returns the number of keys currently stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Search method for BTree
    ///
    /// Returns true if the key is present, false otherwise
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns a reference to the stored key equal to `key`, or None
    pub fn get(&self, key: &K) -> Option<&K> {
        let (node, idx) = Node::search(self.root.as_deref()?, key)?;
        Some(node.key(idx))
    }

    /// Inserts a key into the b-tree
    ///
    /// Fails with DuplicateKey if an equal key is already stored; the tree
    /// is untouched in that case.
    pub fn insert(&mut self, key: K) -> Result<(), TreeError> {
        // Validate before any node is modified, so a failed insert never
        // leaves a half-done split behind
        if self.contains(&key) {
            return Err(TreeError::DuplicateKey);
        }

        match &mut self.root {
            Some(r) => {
                if r.is_full() {
                    // Grow the tree by one level: the old root becomes the
                    // sole child of a fresh root and is split immediately
                    let old_root = self.root.take().expect("root exists in Some branch");
                    let mut new_root = Node::new(self.t, false);
                    new_root.children[0] = Some(old_root);
                    new_root.split_child(0);
                    new_root.insert_nonfull(key);
                    self.root = Some(Box::new(new_root));
                } else {
                    r.insert_nonfull(key);
                }
            }
            None => {
                let mut node = Node::new(self.t, true);
                node.keys[0] = Some(key);
                node.count = 1;
                self.root = Some(Box::new(node));
            }
        }
        self.len += 1;
        Ok(())
    }

    /// Visits every stored key in sorted order
    pub fn in_order<F: FnMut(&K)>(&self, mut visit: F) {
        if let Some(r) = &self.root {
            r.in_order(&mut visit);
        }
    }

    /// Helper (test) function asserting the b-tree shape invariants: all
    /// leaves at the same depth, per-node key counts within bounds, and keys
    /// in sorted order
    #[cfg(test)]
    fn check_invariants(&self) {
        let Some(root) = &self.root else { return };
        assert!(root.count >= 1, "non-empty tree has an empty root");
        let mut leaf_depth = None;
        root.check(self.t, true, 0, &mut leaf_depth);
    }

    #[cfg(test)]
    fn root_key_count(&self) -> usize {
        self.root.as_ref().map_or(0, |r| r.count)
    }

    #[cfg(test)]
    fn root_child_count(&self) -> usize {
        match &self.root {
            Some(r) if !r.leaf => r.count + 1,
            _ => 0,
        }
    }
}

impl<K: Ord> Node<K> {
    fn new(t: usize, leaf: bool) -> Self {
        Node {
            keys: std::iter::repeat_with(|| None).take(2 * t - 1).collect(),
            children: std::iter::repeat_with(|| None).take(2 * t).collect(),
            count: 0,
            leaf,
        }
    }

    fn is_full(&self) -> bool {
        self.count == self.keys.len()
    }

    /// The minimum degree, recovered from the fixed key capacity 2t-1
    fn degree(&self) -> usize {
        (self.keys.len() + 1) / 2
    }

    fn key(&self, i: usize) -> &K {
        self.keys[i].as_ref().expect("key slot below count is occupied")
    }

    fn child(&self, i: usize) -> &Node<K> {
        self.children[i].as_deref().expect("child slot below count+1 is occupied")
    }

    /// Descends from `node` to the node and key index holding `key`
    ///
    /// Scans each node's ordered keys for the first key >= target and
    /// follows the matching child when there is no exact hit.
    fn search<'a>(node: &'a Node<K>, key: &K) -> Option<(&'a Node<K>, usize)> {
        let mut node = node;
        loop {
            let mut i = 0;
            while i < node.count && key > node.key(i) {
                i += 1;
            }
            if i < node.count && key == node.key(i) {
                return Some((node, i));
            }
            if node.leaf {
                return None;
            }
            node = node.child(i);
        }
    }

    /// Inserts a key into a node known to be non-full (called recursively)
    ///
    /// Recursion depth is the tree height, which the balance invariant
    /// bounds at O(log n).
    fn insert_nonfull(&mut self, key: K) {
        if self.leaf {
            // Shift larger keys one slot right and drop the key in place
            let mut j = self.count;
            while j > 0 && *self.key(j - 1) > key {
                self.keys[j] = self.keys[j - 1].take();
                j -= 1;
            }
            self.keys[j] = Some(key);
            self.count += 1;
        } else {
            // Locate the child to descend into
            let mut i = 0;
            while i < self.count && key > *self.key(i) {
                i += 1;
            }
            if self.child(i).is_full() {
                self.split_child(i);
                // The promoted median now sits at position i; descend to
                // its right if the key is greater
                if key > *self.key(i) {
                    i += 1;
                }
            }
            self.children[i]
                .as_mut()
                .expect("descent child is occupied")
                .insert_nonfull(key);
        }
    }

    /// Splits the full child at `child_idx` into two nodes of t-1 keys each
    /// and promotes its median key into this node at position `child_idx`
    fn split_child(&mut self, child_idx: usize) {
        let t = self.degree();

        let (median, z) = {
            let y = self.children[child_idx]
                .as_mut()
                .expect("split target child is occupied");
            debug_assert!(y.is_full());

            // New right sibling takes y's upper t-1 keys and upper t children
            let mut z = Node::new(t, y.leaf);
            for j in 0..t - 1 {
                z.keys[j] = y.keys[j + t].take();
            }
            if !y.leaf {
                for j in 0..t {
                    z.children[j] = y.children[j + t].take();
                }
            }
            z.count = t - 1;

            let median = y.keys[t - 1].take().expect("full child has a median key");
            y.count = t - 1;
            (median, z)
        };

        // Open a gap in this node for the median and the new sibling
        for j in (child_idx + 1..=self.count).rev() {
            self.keys[j] = self.keys[j - 1].take();
        }
        self.keys[child_idx] = Some(median);
        for j in (child_idx + 2..=self.count + 1).rev() {
            self.children[j] = self.children[j - 1].take();
        }
        self.children[child_idx + 1] = Some(Box::new(z));
        self.count += 1;
    }

    fn in_order(&self, visit: &mut impl FnMut(&K)) {
        for i in 0..self.count {
            if !self.leaf {
                self.child(i).in_order(visit);
            }
            visit(self.key(i));
        }
        if !self.leaf {
            self.child(self.count).in_order(visit);
        }
    }

    /// Recursive invariant check used by tests: key bounds, slot hygiene,
    /// sorted keys, and uniform leaf depth
    #[cfg(test)]
    fn check(&self, t: usize, is_root: bool, depth: usize, leaf_depth: &mut Option<usize>) {
        if !is_root {
            assert!(self.count >= t - 1, "node below minimum key count");
        }
        assert!(self.count <= 2 * t - 1, "node above maximum key count");
        for i in self.count..self.keys.len() {
            assert!(self.keys[i].is_none(), "stale key slot past count");
        }
        for i in 1..self.count {
            assert!(self.key(i - 1) < self.key(i), "node keys out of order");
        }
        if self.leaf {
            match leaf_depth {
                Some(d) => assert_eq!(*d, depth, "leaves at differing depths"),
                None => *leaf_depth = Some(depth),
            }
        } else {
            for i in self.count + 1..self.children.len() {
                assert!(self.children[i].is_none(), "stale child slot past count");
            }
            for i in 0..=self.count {
                self.child(i).check(t, false, depth + 1, leaf_depth);
            }
        }
    }
}
