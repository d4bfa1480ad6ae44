//! # Balanced Ordered Set
//!
//! A height-balanced (AVL) binary search tree over `Ord` keys.
//!
//! One implementation serves every ordered structure in the index:
//! - sender sets inside a recipient node
//! - recipient trees inside a relation
//! - leader sets inside a relation's cache
//! - the catalog's name order and each entity's relation back-references
//!
//! Every subtree is exclusively owned by its parent. For every node the
//! heights of the two children differ by at most one, which bounds search,
//! insertion, removal and `min` to logarithmic depth.

use crate::primitives::ABSENT_HEIGHT;
use std::borrow::Borrow;
use std::cmp::Ordering;

type Link<K, V> = Option<Box<Node<K, V>>>;

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    height: i32,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            height: 0,
            left: None,
            right: None,
        }
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

fn height<K, V>(link: &Link<K, V>) -> i32 {
    link.as_ref().map_or(ABSENT_HEIGHT, |node| node.height)
}

// =============================================================================
// ROTATIONS
// =============================================================================

fn rotate_right<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

fn rotate_left<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

/// Restore the AVL invariant at `node`, assuming both children satisfy it.
///
/// A heavy child leaning the opposite way gets a preliminary rotation
/// (double rotation); otherwise a single rotation suffices.
fn rebalance<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        if node.left.as_ref().is_some_and(|left| left.balance_factor() < 0) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }

    if balance < -1 {
        if node
            .right
            .as_ref()
            .is_some_and(|right| right.balance_factor() > 0)
        {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }

    node
}

// =============================================================================
// RECURSIVE OPERATIONS
// =============================================================================

/// Insert `key` or update the existing node holding it.
///
/// `update` receives the value and whether it was just created.
fn upsert_node<K: Ord, V, R>(
    link: Link<K, V>,
    key: K,
    make: impl FnOnce() -> V,
    update: impl FnOnce(&mut V, bool) -> R,
) -> (Box<Node<K, V>>, R, bool) {
    let Some(mut node) = link else {
        let mut node = Box::new(Node::leaf(key, make()));
        let result = update(&mut node.value, true);
        return (node, result, true);
    };

    match key.cmp(&node.key) {
        Ordering::Less => {
            let (child, result, inserted) = upsert_node(node.left.take(), key, make, update);
            node.left = Some(child);
            (rebalance(node), result, inserted)
        }
        Ordering::Greater => {
            let (child, result, inserted) = upsert_node(node.right.take(), key, make, update);
            node.right = Some(child);
            (rebalance(node), result, inserted)
        }
        Ordering::Equal => {
            let result = update(&mut node.value, false);
            (node, result, false)
        }
    }
}

fn remove_node<K, V, Q>(link: Link<K, V>, key: &Q, removed: &mut Option<V>) -> Link<K, V>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let mut node = link?;

    match key.cmp(node.key.borrow()) {
        Ordering::Less => node.left = remove_node(node.left.take(), key, removed),
        Ordering::Greater => node.right = remove_node(node.right.take(), key, removed),
        Ordering::Equal => {
            let Node {
                value, left, right, ..
            } = *node;
            *removed = Some(value);

            return match (left, right) {
                (None, None) => None,
                (Some(child), None) | (None, Some(child)) => Some(child),
                (Some(left), Some(right)) => {
                    // Promote the in-order successor.
                    let (rest, mut successor) = take_min(right);
                    successor.left = Some(left);
                    successor.right = rest;
                    Some(rebalance(successor))
                }
            };
        }
    }

    Some(rebalance(node))
}

/// Detach the minimum node of a subtree. Returns the rebalanced remainder
/// and the detached node.
fn take_min<K, V>(mut node: Box<Node<K, V>>) -> (Link<K, V>, Box<Node<K, V>>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn walk_mut<K, V>(link: &mut Link<K, V>, visit: &mut impl FnMut(&K, &mut V)) {
    if let Some(node) = link {
        walk_mut(&mut node.left, visit);
        visit(&node.key, &mut node.value);
        walk_mut(&mut node.right, visit);
    }
}

fn drain_in_order<K, V>(link: Link<K, V>, out: &mut Vec<(K, V)>) {
    if let Some(node) = link {
        let Node {
            key,
            value,
            left,
            right,
            ..
        } = *node;
        drain_in_order(left, out);
        out.push((key, value));
        drain_in_order(right, out);
    }
}

/// Build a size-balanced tree from `len` items of an ordered iterator.
/// Sibling sizes differ by at most one, so the result is also AVL-balanced.
fn build_balanced<K, V>(items: &mut impl Iterator<Item = (K, V)>, len: usize) -> Link<K, V> {
    if len == 0 {
        return None;
    }
    let left_len = len / 2;
    let left = build_balanced(items, left_len);
    let (key, value) = items.next()?;
    let right = build_balanced(items, len - left_len - 1);

    let mut node = Box::new(Node {
        key,
        value,
        height: 0,
        left,
        right,
    });
    node.update_height();
    Some(node)
}

fn check_node<K: Ord, V>(link: &Link<K, V>, lower: Option<&K>, upper: Option<&K>) -> Option<i32> {
    let Some(node) = link else {
        return Some(ABSENT_HEIGHT);
    };
    if lower.is_some_and(|lo| node.key <= *lo) || upper.is_some_and(|hi| node.key >= *hi) {
        return None;
    }
    let left = check_node(&node.left, lower, Some(&node.key))?;
    let right = check_node(&node.right, Some(&node.key), upper)?;
    let expected = 1 + left.max(right);
    if (left - right).abs() > 1 || node.height != expected {
        return None;
    }
    Some(expected)
}

// =============================================================================
// PUBLIC TREE
// =============================================================================

/// An AVL tree mapping ordered keys to values.
///
/// Used as a set by choosing `V = ()`.
#[derive(Debug, Clone)]
pub struct AvlTree<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the root; `ABSENT_HEIGHT` for an empty tree.
    #[must_use]
    pub fn height(&self) -> i32 {
        height(&self.root)
    }

    /// Insert `key` if absent. If the key is already present, `merge` runs on
    /// the stored value instead of inserting a duplicate.
    ///
    /// Returns `true` if a new element was inserted.
    pub fn insert_with(
        &mut self,
        key: K,
        make: impl FnOnce() -> V,
        merge: impl FnOnce(&mut V),
    ) -> bool {
        let (root, (), inserted) = upsert_node(self.root.take(), key, make, |value, fresh| {
            if !fresh {
                merge(value);
            }
        });
        self.root = Some(root);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Insert `key` with `value` if absent; an existing value is kept.
    ///
    /// Returns `true` if a new element was inserted.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.insert_with(key, || value, |_| {})
    }

    /// Locate or create the element for `key`, then run `update` on it.
    pub fn upsert<R>(
        &mut self,
        key: K,
        make: impl FnOnce() -> V,
        update: impl FnOnce(&mut V) -> R,
    ) -> R {
        let (root, result, inserted) =
            upsert_node(self.root.take(), key, make, |value, _| update(value));
        self.root = Some(root);
        if inserted {
            self.len += 1;
        }
        result
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut removed = None;
        self.root = remove_node(self.root.take(), key, &mut removed);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut link = self.root.as_deref();
        while let Some(node) = link {
            link = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut link = self.root.as_deref_mut();
        while let Some(node) = link {
            link = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left.as_deref_mut(),
                Ordering::Greater => node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.value),
            };
        }
        None
    }

    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// The smallest element.
    #[must_use]
    pub fn min(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some((&node.key, &node.value))
    }

    /// In-order iterator over `(key, value)` pairs.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self.root.as_deref());
        iter
    }

    /// In-order iterator over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Visit every element in key order with mutable access to its value.
    pub fn for_each_mut(&mut self, mut visit: impl FnMut(&K, &mut V)) {
        walk_mut(&mut self.root, &mut visit);
    }

    /// Keep only the elements for which `keep` returns `true`.
    ///
    /// The survivors are rebuilt into a fresh balanced tree in one pass.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) {
        let mut items = Vec::with_capacity(self.len);
        drain_in_order(self.root.take(), &mut items);
        items.retain_mut(|(key, value)| keep(key, value));
        self.len = items.len();
        self.root = build_balanced(&mut items.into_iter(), self.len);
    }

    /// Drop every node, leaving the tree empty.
    pub fn destroy(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Verify ordering, cached heights and the AVL balance bound.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        check_node(&self.root, None, None).is_some()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        for (key, value) in iter {
            tree.insert(key, value);
        }
        tree
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a AvlTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator produced by [`AvlTree::iter`].
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut link: Option<&'a Node<K, V>>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some((&node.key, &node.value))
    }
}

// =============================================================================
// TESTS
// =============================================================================
