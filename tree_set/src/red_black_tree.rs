use core::fmt;
use core::iter::FusedIterator;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;

use log::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

impl Color {
    /// Returns `true` if the color is [`Red`].
    ///
    /// [`Red`]: Color::Red
    #[must_use]
    fn is_red(&self) -> bool {
        matches!(self, Self::Red)
    }

    /// Returns `true` if the color is [`Black`].
    ///
    /// [`Black`]: Color::Black
    #[must_use]
    fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }
}

struct Node<T> {
    // key is uninit only for the sentinel node, otherwise it must always be a valid value
    key: MaybeUninit<T>,
    color: Color,
    parent: Option<RawNode<T>>,
    // absent children point to the tree's sentinel, never dangle
    left: RawNode<T>,
    right: RawNode<T>,
}

/// Wrapper around `NonNull<Node<T>>` to provide convenient methods in order
/// to make the algorithms of [`RedBlackTree`] much more readable.
///
/// Two handles are equal if they point to the same node.
#[repr(transparent)]
struct RawNode<T> {
    ptr: NonNull<Node<T>>,
}

impl<T> Clone for RawNode<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawNode<T> {}

impl<T> PartialEq for RawNode<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for RawNode<T> {}

impl<T> fmt::Debug for RawNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawNode").field(&self.ptr).finish()
    }
}

impl<T> RawNode<T> {
    fn from_node(node: Node<T>) -> Self {
        Self {
            ptr: unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(node))) },
        }
    }

    /// Allocates a new sentinel whose children point back to itself.
    fn sentinel() -> Self {
        let mut nil = Self::from_node(Node {
            key: MaybeUninit::uninit(),
            color: Color::Black,
            parent: None,
            left: Self {
                ptr: NonNull::dangling(),
            },
            right: Self {
                ptr: NonNull::dangling(),
            },
        });
        // SAFETY: `nil` was just allocated and no one else points to it
        unsafe {
            nil.set_left(nil);
            nil.set_right(nil);
        }
        nil
    }

    #[inline]
    fn as_ptr(&self) -> *mut Node<T> {
        self.ptr.as_ptr()
    }

    #[inline]
    unsafe fn as_ref<'a>(&self) -> &'a Node<T> {
        unsafe { self.ptr.as_ref() }
    }

    /// Caller must make sure that `self` is not the sentinel.
    #[inline]
    unsafe fn key<'a>(&self) -> &'a T {
        unsafe { (*self.as_ptr()).key.assume_init_ref() }
    }

    #[inline]
    unsafe fn parent(&self) -> Option<RawNode<T>> {
        unsafe { (*self.as_ptr()).parent }
    }

    #[inline]
    unsafe fn set_parent(&mut self, new_parent: Option<RawNode<T>>) {
        unsafe {
            (*self.as_ptr()).parent = new_parent;
        }
    }

    #[inline]
    unsafe fn left(&self) -> RawNode<T> {
        unsafe { (*self.as_ptr()).left }
    }

    #[inline]
    unsafe fn set_left(&mut self, new_left: RawNode<T>) {
        unsafe {
            (*self.as_ptr()).left = new_left;
        }
    }

    #[inline]
    unsafe fn right(&self) -> RawNode<T> {
        unsafe { (*self.as_ptr()).right }
    }

    #[inline]
    unsafe fn set_right(&mut self, new_right: RawNode<T>) {
        unsafe {
            (*self.as_ptr()).right = new_right;
        }
    }

    #[inline]
    unsafe fn color(&self) -> Color {
        unsafe { (*self.as_ptr()).color }
    }

    #[inline]
    unsafe fn set_color(&mut self, new_color: Color) {
        unsafe { (*self.as_ptr()).color = new_color }
    }
}

/// An ordered set of unique keys stored in a red-black tree.
///
/// All absent links point to a single black sentinel node owned by the tree,
/// so every real node always has two children and the rebalancing code never
/// has to special case a missing child.
///
/// The tree doesn't count its keys, [`TreeSet`](crate::TreeSet) does that on
/// top of the boolean results of [`insert`](Self::insert) and [`delete`](Self::delete).
pub struct RedBlackTree<T> {
    // INVARIANTS:
    //  * `nil` is a valid pointer to this tree's sentinel, it is black and its key is never initialized
    //  * `root == nil` iff the tree is empty, otherwise `root` is black and has no parent
    //  * every child link of a real node points to a real node or to `nil`
    //  * `nil.parent` is `None` outside of `delete_core`
    root: RawNode<T>,
    nil: RawNode<T>,
    marker: PhantomData<Box<Node<T>>>,
}

// SAFETY: the tree exclusively owns all of its nodes, sending it to another
// thread is the same as sending the keys.
unsafe impl<T: Send> Send for RedBlackTree<T> {}
// SAFETY: shared references only give out `&T`.
unsafe impl<T: Sync> Sync for RedBlackTree<T> {}

impl<T> Drop for RedBlackTree<T> {
    fn drop(&mut self) {
        // TODO: handle panics in `T::drop`
        self.clear();
        // SAFETY: the sentinel was allocated by `RawNode::sentinel` and its key is uninit,
        // dropping the box frees the node without touching the key
        let _: Box<Node<T>> = unsafe { Box::from_raw(self.nil.as_ptr()) };
    }
}

impl<T> fmt::Debug for RedBlackTree<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct NodeDebug<'a, T> {
            node: RawNode<T>,
            nil: RawNode<T>,
            marker: PhantomData<&'a T>,
        }

        impl<T> fmt::Debug for NodeDebug<'_, T>
        where
            T: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let key_of = |node: RawNode<T>| {
                    if node == self.nil {
                        None
                    } else {
                        Some(unsafe { node.key() })
                    }
                };
                let node = unsafe { self.node.as_ref() };
                f.debug_struct("Node")
                    .field("key", unsafe { node.key.assume_init_ref() })
                    .field("color", &node.color)
                    .field("parent", &node.parent.and_then(key_of))
                    .field("left", &key_of(node.left))
                    .field("right", &key_of(node.right))
                    .finish()
            }
        }

        struct TreeDebug<'a, T> {
            tree: &'a RedBlackTree<T>,
        }

        impl<T> fmt::Debug for TreeDebug<'_, T>
        where
            T: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_list();
                let mut func = |node: RawNode<T>| {
                    f.entry(&NodeDebug {
                        node,
                        nil: self.tree.nil,
                        marker: PhantomData,
                    });
                };
                unsafe { self.tree.inorder_for_each_core(self.tree.root, &mut func) };
                f.finish()
            }
        }

        let mut f = f.debug_struct("RedBlackTree");
        if self.is_empty() {
            f.field("root", &None::<T>);
        } else {
            f.field("root", &Some(unsafe { self.root.key() }));
        }
        f.field("nodes", &TreeDebug { tree: self });
        f.finish()
    }
}

impl<T> Default for RedBlackTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RedBlackTree<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let mut tree = Self::new();
        tree.root = unsafe { Self::clone_subtree(self.root, self.nil, tree.nil, None) };
        tree
    }
}

impl<T> RedBlackTree<T> {
    pub fn new() -> Self {
        let nil = RawNode::sentinel();
        Self {
            root: nil,
            nil,
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root == self.nil
    }

    /// Removes all keys from the tree.
    pub fn clear(&mut self) {
        let root = mem::replace(&mut self.root, self.nil);
        unsafe { self.free_subtree(root) };
    }

    /// Frees `node` and all of its descendants, dropping their keys.
    unsafe fn free_subtree(&self, node: RawNode<T>) {
        if node == self.nil {
            return;
        }

        unsafe {
            self.free_subtree(node.left());
            self.free_subtree(node.right());
            let node = Box::from_raw(node.as_ptr());
            drop(node.key.assume_init());
        }
    }

    /// Deep copies the subtree at `node` of a tree whose sentinel is `src_nil`
    /// into new nodes that use `dst_nil` as their sentinel.
    unsafe fn clone_subtree(
        node: RawNode<T>,
        src_nil: RawNode<T>,
        dst_nil: RawNode<T>,
        parent: Option<RawNode<T>>,
    ) -> RawNode<T>
    where
        T: Clone,
    {
        if node == src_nil {
            return dst_nil;
        }

        unsafe {
            let mut copy = RawNode::from_node(Node {
                key: MaybeUninit::new(node.key().clone()),
                color: node.color(),
                parent,
                left: dst_nil,
                right: dst_nil,
            });
            let left = Self::clone_subtree(node.left(), src_nil, dst_nil, Some(copy));
            copy.set_left(left);
            let right = Self::clone_subtree(node.right(), src_nil, dst_nil, Some(copy));
            copy.set_right(right);
            copy
        }
    }

    unsafe fn inorder_for_each_core<F>(&self, node: RawNode<T>, f: &mut F)
    where
        F: FnMut(RawNode<T>),
    {
        if node == self.nil {
            return;
        }

        unsafe {
            self.inorder_for_each_core(node.left(), f);
            f(node);
            self.inorder_for_each_core(node.right(), f);
        }
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.root, self.nil)
    }

    /// Returns an iterator over the keys in descending order.
    pub fn descending_iter(&self) -> DescendingIter<'_, T> {
        DescendingIter::new(self.root, self.nil)
    }

    pub fn first(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        unsafe { Some(self.min_of(self.root).key()) }
    }

    pub fn last(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        unsafe { Some(self.max_of(self.root).key()) }
    }

    /// Removes and returns the smallest key.
    pub fn poll_first(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let first = unsafe { self.min_of(self.root) };
        Some(self.delete_core(first))
    }

    /// Removes and returns the largest key.
    pub fn poll_last(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let last = unsafe { self.max_of(self.root) };
        Some(self.delete_core(last))
    }

    /// `root` must not be the sentinel.
    unsafe fn min_of(&self, root: RawNode<T>) -> RawNode<T> {
        let mut x = root;
        while unsafe { x.left() } != self.nil {
            x = unsafe { x.left() };
        }

        x
    }

    /// `root` must not be the sentinel.
    unsafe fn max_of(&self, root: RawNode<T>) -> RawNode<T> {
        let mut x = root;
        while unsafe { x.right() } != self.nil {
            x = unsafe { x.right() };
        }

        x
    }

    pub fn lookup<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lookup_raw(key).map(|node| unsafe { node.key() })
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lookup_raw(key).is_some()
    }

    fn lookup_raw<Q>(&self, key: &Q) -> Option<RawNode<T>>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut x = self.root;
        while x != self.nil {
            match key.cmp(unsafe { x.key() }.borrow()) {
                Ordering::Less => x = unsafe { x.left() },
                Ordering::Equal => return Some(x),
                Ordering::Greater => x = unsafe { x.right() },
            }
        }

        None
    }

    /// Returns the greatest key less than or equal to `key`.
    pub fn floor<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        unsafe { self.floor_core(self.root, key) }
    }

    unsafe fn floor_core<Q>(&self, node: RawNode<T>, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if node == self.nil {
            return None;
        }

        unsafe {
            let node_key = node.key();
            match key.cmp(node_key.borrow()) {
                Ordering::Equal => Some(node_key),
                // everything in the right subtree is even larger
                Ordering::Less => self.floor_core(node.left(), key),
                Ordering::Greater => self.floor_core(node.right(), key).or(Some(node_key)),
            }
        }
    }

    /// Returns the least key greater than or equal to `key`.
    pub fn ceiling<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        unsafe { self.ceiling_core(self.root, key) }
    }

    unsafe fn ceiling_core<Q>(&self, node: RawNode<T>, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if node == self.nil {
            return None;
        }

        unsafe {
            let node_key = node.key();
            match key.cmp(node_key.borrow()) {
                Ordering::Equal => Some(node_key),
                Ordering::Greater => self.ceiling_core(node.right(), key),
                Ordering::Less => self.ceiling_core(node.left(), key).or(Some(node_key)),
            }
        }
    }

    /// Returns the greatest key strictly less than `key`.
    pub fn lower<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        unsafe { self.lower_core(self.root, key) }
    }

    unsafe fn lower_core<Q>(&self, node: RawNode<T>, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if node == self.nil {
            return None;
        }

        unsafe {
            let node_key = node.key();
            match key.cmp(node_key.borrow()) {
                Ordering::Greater => self.lower_core(node.right(), key).or(Some(node_key)),
                // an exact match never qualifies, only smaller keys to the left do
                Ordering::Equal | Ordering::Less => self.lower_core(node.left(), key),
            }
        }
    }

    /// Returns the least key strictly greater than `key`.
    pub fn higher<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        unsafe { self.higher_core(self.root, key) }
    }

    unsafe fn higher_core<Q>(&self, node: RawNode<T>, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if node == self.nil {
            return None;
        }

        unsafe {
            let node_key = node.key();
            match key.cmp(node_key.borrow()) {
                Ordering::Less => self.higher_core(node.left(), key).or(Some(node_key)),
                Ordering::Equal | Ordering::Greater => self.higher_core(node.right(), key),
            }
        }
    }

    fn rotate_left(&mut self, mut node: RawNode<T>) {
        //    p                       p
        //    |                       |
        // +-node-+               +-right-+
        // |      |      -->      |       |
        // a  +-right-+       +-node-+    c
        //    |       |       |      |
        //    b       c       a      b
        // where a, b, c can be any subtrees
        unsafe {
            if node == self.nil || node.right() == self.nil {
                warn!("rotate_left needs a node with a right child, ignoring");
                return;
            }

            let mut right = node.right();

            // attach b to node
            let mut b = right.left();
            node.set_right(b);
            if b != self.nil {
                b.set_parent(Some(node));
            }

            // attach right to parent
            let parent = node.parent();
            right.set_parent(parent);
            match parent {
                None => self.root = right,
                Some(mut parent) if parent.left() == node => parent.set_left(right),
                Some(mut parent) => parent.set_right(right),
            }

            // attach node to right
            right.set_left(node);
            node.set_parent(Some(right));
        }
    }

    fn rotate_right(&mut self, mut node: RawNode<T>) {
        //         p              p
        //         |              |
        //     +-node-+       +-left-+
        //     |      |       |      |
        // +-left-+   c  -->  a  +-node-+
        // |      |              |      |
        // a      b              b      c
        // where a, b, c can be any subtrees
        unsafe {
            if node == self.nil || node.left() == self.nil {
                warn!("rotate_right needs a node with a left child, ignoring");
                return;
            }

            let mut left = node.left();

            // attach b to node
            let mut b = left.right();
            node.set_left(b);
            if b != self.nil {
                b.set_parent(Some(node));
            }

            // attach left to parent
            let parent = node.parent();
            left.set_parent(parent);
            match parent {
                None => self.root = left,
                Some(mut parent) if parent.right() == node => parent.set_right(left),
                Some(mut parent) => parent.set_left(left),
            }

            // attach node to left
            left.set_right(node);
            node.set_parent(Some(left));
        }
    }

    /// Inserts `key` into the tree.
    ///
    /// Returns `false` and leaves the tree untouched if an equal key is already present.
    pub fn insert(&mut self, key: T) -> bool
    where
        T: Ord,
    {
        // Move left/right down the tree until we find empty slot
        let mut parent = None;
        let mut goes_left = false;
        let mut x = self.root;
        while x != self.nil {
            parent = Some(x);
            match key.cmp(unsafe { x.key() }) {
                Ordering::Less => {
                    goes_left = true;
                    x = unsafe { x.left() };
                }
                Ordering::Equal => return false,
                Ordering::Greater => {
                    goes_left = false;
                    x = unsafe { x.right() };
                }
            }
        }

        // new node is a leaf, both of its children are the sentinel
        let new_node = RawNode::from_node(Node {
            key: MaybeUninit::new(key),
            color: Color::Red,
            parent,
            left: self.nil,
            right: self.nil,
        });
        match parent {
            Some(mut parent) => unsafe {
                if goes_left {
                    parent.set_left(new_node);
                } else {
                    parent.set_right(new_node);
                }
            },
            None => self.root = new_node,
        }

        self.insert_fixup(new_node);
        true
    }

    fn insert_fixup(&mut self, new_node: RawNode<T>) {
        let mut node = new_node;
        unsafe {
            while let Some(mut parent) = node.parent() {
                if parent.color().is_black() {
                    break;
                }
                // red-black properties are violated because red parent has a red child
                //
                // Note that there is only one violation at this point.
                // At first iteration it's the new_node and it's parent.
                // If we take the "red uncle" branch then at next iteration it will be
                // the grand_parent and it's parent that violate the red-black properties.
                // If we take the other branch, there will be no more iterations as that
                // will result in a black parent.

                // parent is red and thus not the root
                let Some(mut grand_parent) = parent.parent() else {
                    break;
                };
                debug_assert!(grand_parent.color().is_black());

                if parent == grand_parent.left() {
                    let mut uncle = grand_parent.right();
                    if uncle.color().is_red() {
                        //     +--- gp:b ---+               +--- gp:r ---+
                        //     |            |               |            |
                        //  + p:r +      + u:r +   -->   + p:b +      + u:b +
                        //  |     |      |     |         |     |      |     |
                        // n:r   a:b    b:b   c:b       n:r   a:b    b:b   c:b
                        // (a, b, c can be any subtrees)
                        //
                        // Coloring parent and uncle black and grandparent red keeps
                        // the black height unchanged. The grand parent may now have
                        // a red parent, repeat as if it was the new node.
                        trace!("insert fixup: red uncle, recoloring");
                        parent.set_color(Color::Black);
                        uncle.set_color(Color::Black);
                        grand_parent.set_color(Color::Red);
                        node = grand_parent;
                    } else {
                        if node == parent.right() {
                            //       +-- gp:b --+                 +-- gp:b --+
                            //       |          |                 |          |
                            //  +-- p:r --+    u:b  -->       +- n:r --+    u:b
                            //  |         |                   |        |
                            // a:b    +- n:r -+           +- p:r -+   c:b
                            //        |       |           |       |
                            //       b:b     c:b         a:b     b:b
                            //
                            // left rotate parent and swap node and parent so we match the case below
                            trace!("insert fixup: black uncle, inner child");
                            self.rotate_left(parent);
                            mem::swap(&mut parent, &mut node);
                        }

                        //           +-- gp:b --+            +----- p:b -----+
                        //           |          |            |               |
                        //      +-- p:r --+    u:b  -->   +- n:r -+     +- gp:r -+
                        //      |         |               |       |     |        |
                        //  +- n:r -+    c:b             a:b     b:b   c:b      u:b
                        //  |       |
                        // a:b     b:b
                        //
                        // Parent ends up black, so the loop terminates.
                        trace!("insert fixup: black uncle, outer child");
                        parent.set_color(Color::Black);
                        grand_parent.set_color(Color::Red);
                        self.rotate_right(grand_parent);
                    }
                } else {
                    // same as above but left/right are switched
                    let mut uncle = grand_parent.left();
                    if uncle.color().is_red() {
                        trace!("insert fixup: red uncle, recoloring");
                        parent.set_color(Color::Black);
                        uncle.set_color(Color::Black);
                        grand_parent.set_color(Color::Red);
                        node = grand_parent;
                    } else {
                        if node == parent.left() {
                            trace!("insert fixup: black uncle, inner child");
                            self.rotate_right(parent);
                            mem::swap(&mut parent, &mut node);
                        }

                        trace!("insert fixup: black uncle, outer child");
                        parent.set_color(Color::Black);
                        grand_parent.set_color(Color::Red);
                        self.rotate_left(grand_parent);
                    }
                }
            }

            self.root.set_color(Color::Black);
        }
    }

    /// Removes `key` from the tree. Returns `false` if it wasn't present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes `key` from the tree and returns the stored key.
    pub fn take<Q>(&mut self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lookup_raw(key).map(|node| self.delete_core(node))
    }

    fn delete_core(&mut self, node: RawNode<T>) -> T {
        //       +---------- 34 ---------+
        //       |                       |
        // +---- 2 ----+                 58 ----+
        // |           |                        |
        // 1      +--- 9 ----+              +-- 77 --+
        //        |          |              |        |
        //     +- 6       +- 20 -+      +- 71 -+     82
        //     |          |      |      |      |
        //     5         12 -+   24    67      75
        //                   |
        //                   13
        unsafe {
            let mut removed_color = node.color();
            // Node that takes the place of the node that left the structure,
            // can be the sentinel
            let mut replacement;

            if node.left() == self.nil {
                // no children or only the right one, for example remove 1, 12, 58 from tree above
                replacement = node.right();
                self.transplant(node, replacement);
            } else if node.right() == self.nil {
                // only the left child, for example remove 6 from tree above
                replacement = node.left();
                self.transplant(node, replacement);
            } else {
                // Replace `node` with its successor, the minimum of its right subtree.
                // The successor never has a left child.
                let mut successor = self.min_of(node.right());
                removed_color = successor.color();
                replacement = successor.right();

                if successor.parent() == Some(node) {
                    // successor is the right child of `node`,
                    // for example remove 20, 71, 77 from tree above
                    replacement.set_parent(Some(successor));
                } else {
                    // first take the successor out by replacing it with its own right child,
                    // for example remove 9 from tree above, successor will be 12
                    self.transplant(successor, replacement);
                    successor.set_right(node.right());
                    successor.right().set_parent(Some(successor));
                }
                self.transplant(node, successor);
                successor.set_left(node.left());
                successor.left().set_parent(Some(successor));
                successor.set_color(node.color());
            }

            if removed_color.is_black() {
                self.delete_fixup(replacement);
            }
            self.nil.set_parent(None);
            self.nil.set_color(Color::Black);

            let node = Box::from_raw(node.as_ptr());
            node.key.assume_init()
        }
    }

    fn delete_fixup(&mut self, mut x: RawNode<T>) {
        // x points to the place where we removed the node which was black
        // x itself can be either red or black.
        //
        // If x is red then we simply color it black after the loop, which adds
        // back the black node that was removed from all paths through x.
        //
        // If x is black and not the root, all paths through x miss one black
        // node ("x is doubly black") and we enter the loop.
        // x can be the sentinel, in which case its parent was set by `transplant`.
        // x always has a real sibling, otherwise the black heights from x.parent
        // couldn't have been equal before the removal.
        unsafe {
            while x != self.root && x.color().is_black() {
                let Some(mut parent) = x.parent() else {
                    break;
                };

                if x == parent.left() {
                    let mut sibling = parent.right();

                    if sibling.color().is_red() {
                        //     +--- p:b ---+                +--- p:r ---+                    +--- s:b ---+
                        //     |           |                |           |                    |           |
                        // +- x:b -+   +- s:r -+   -->  +- x:b -+   +- s:b -+   -->      +- p:r -+      d:b
                        // |       |   |       |        |       |   |       |            |       |
                        // a       b  c:b     d:b       a       b  c:b     d:b       +- x:b -+  c:b
                        //                                                           |       |
                        //                                                           a       b
                        // Turns into one of the cases below with a red parent.
                        trace!("delete fixup: red sibling");
                        sibling.set_color(Color::Black);
                        parent.set_color(Color::Red);
                        self.rotate_left(parent);
                        sibling = parent.right();
                    }

                    if sibling.left().color().is_black() && sibling.right().color().is_black() {
                        //     +--- p:c ---+                +--- p:c ---+
                        //     |           |                |           |
                        // +- x:b -+   +- s:b -+   -->  +- x:b -+   +- s:r -+
                        // |       |   |       |        |       |   |       |
                        // a       b  c:b     d:b       a       b  c:b     d:b
                        //
                        // Move the extra black up to the parent.
                        trace!("delete fixup: black sibling with black children");
                        sibling.set_color(Color::Red);
                        x = parent;
                    } else {
                        if sibling.right().color().is_black() {
                            //    +----- p:c -----+                +---- p:c ----+
                            //    |               |                |             |
                            // +- x:b -+      +- s:b -+   -->  +- x:b -+     +- c:b -+
                            // |       |      |       |        |       |     |       |
                            // a       b  +- c:r -+  d:b       a       b     e   +- s:r -+
                            //            |       |                              |       |
                            //            e       f                              f      d:b
                            //
                            // Turns into the far red child case below.
                            trace!("delete fixup: black sibling with red near child");
                            sibling.left().set_color(Color::Black);
                            sibling.set_color(Color::Red);
                            self.rotate_right(sibling);
                            sibling = parent.right();
                        }

                        //     +--- p:c ---+                     +-- s:c --+
                        //     |           |                     |         |
                        // +- x:b -+   +- s:b -+   -->       +- p:b -+    d:b
                        // |       |   |       |             |       |
                        // a       b  c:?     d:r        +- x:b -+  c:?
                        //                               |       |
                        //                               a       b
                        //
                        // Paths through x gain the missing black node, d keeps its
                        // count by being recolored black. This fixes the tree.
                        trace!("delete fixup: black sibling with red far child");
                        sibling.set_color(parent.color());
                        parent.set_color(Color::Black);
                        sibling.right().set_color(Color::Black);
                        self.rotate_left(parent);
                        x = self.root;
                    }
                } else {
                    // same as above but left/right are switched
                    let mut sibling = parent.left();

                    if sibling.color().is_red() {
                        trace!("delete fixup: red sibling");
                        sibling.set_color(Color::Black);
                        parent.set_color(Color::Red);
                        self.rotate_right(parent);
                        sibling = parent.left();
                    }

                    if sibling.right().color().is_black() && sibling.left().color().is_black() {
                        trace!("delete fixup: black sibling with black children");
                        sibling.set_color(Color::Red);
                        x = parent;
                    } else {
                        if sibling.left().color().is_black() {
                            trace!("delete fixup: black sibling with red near child");
                            sibling.right().set_color(Color::Black);
                            sibling.set_color(Color::Red);
                            self.rotate_left(sibling);
                            sibling = parent.left();
                        }

                        trace!("delete fixup: black sibling with red far child");
                        sibling.set_color(parent.color());
                        parent.set_color(Color::Black);
                        sibling.left().set_color(Color::Black);
                        self.rotate_right(parent);
                        x = self.root;
                    }
                }
            }

            x.set_color(Color::Black);
        }
    }

    /// Replaces subtree `old` with subtree `new`
    unsafe fn transplant(&mut self, old: RawNode<T>, mut new: RawNode<T>) {
        // We need to do two things:
        //  a) make the parent of `old` point to `new` instead of `old`,
        //     if `old` doesn't have parents it must have been the root which
        //     means that `new` will be the new root
        //  b) make `new` point to the parent of `old`, even if `new` is the
        //     sentinel as `delete_fixup` walks up from it

        unsafe {
            // a)
            let parent = old.parent();
            match parent {
                None => self.root = new,
                Some(mut parent) if parent.left() == old => parent.set_left(new),
                Some(mut parent) => parent.set_right(new),
            }

            // b)
            new.set_parent(parent);
        }
    }
}

impl<'a, T> IntoIterator for &'a RedBlackTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the keys of a [`RedBlackTree`].
///
/// Keeps the not yet visited ancestors on the left spine of the current
/// subtree on a stack.
pub struct Iter<'a, T> {
    stack: Vec<RawNode<T>>,
    nil: RawNode<T>,
    marker: PhantomData<&'a T>,
}

impl<'a, T> Iter<'a, T> {
    fn new(root: RawNode<T>, nil: RawNode<T>) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            nil,
            marker: PhantomData,
        };
        iter.push_left_spine(root);
        iter
    }

    fn push_left_spine(&mut self, mut node: RawNode<T>) {
        while node != self.nil {
            self.stack.push(node);
            node = unsafe { node.left() };
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(unsafe { node.right() });
        Some(unsafe { node.key() })
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            nil: self.nil,
            marker: PhantomData,
        }
    }
}

/// Descending iterator over the keys of a [`RedBlackTree`], the mirror of [`Iter`].
pub struct DescendingIter<'a, T> {
    stack: Vec<RawNode<T>>,
    nil: RawNode<T>,
    marker: PhantomData<&'a T>,
}

impl<'a, T> DescendingIter<'a, T> {
    fn new(root: RawNode<T>, nil: RawNode<T>) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            nil,
            marker: PhantomData,
        };
        iter.push_right_spine(root);
        iter
    }

    fn push_right_spine(&mut self, mut node: RawNode<T>) {
        while node != self.nil {
            self.stack.push(node);
            node = unsafe { node.right() };
        }
    }
}

impl<'a, T> Iterator for DescendingIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_right_spine(unsafe { node.left() });
        Some(unsafe { node.key() })
    }
}

impl<T> FusedIterator for DescendingIter<'_, T> {}

impl<T> Clone for DescendingIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            nil: self.nil,
            marker: PhantomData,
        }
    }
}
