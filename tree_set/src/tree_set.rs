use core::fmt;
use core::iter::FusedIterator;
use std::borrow::Borrow;

use crate::error::TreeSetError;
use crate::red_black_tree::{DescendingIter, Iter, RedBlackTree};

/// A sorted set with navigation methods, backed by a [`RedBlackTree`].
///
/// The tree itself doesn't track its size, the set counts elements by
/// observing the results of insertions and removals.
///
/// ```
/// use tree_set::TreeSet;
///
/// let mut set = TreeSet::from([1, 5, 3, 4]);
/// assert_eq!(set.len(), 4);
/// assert_eq!(set.floor(&2), Some(&1));
/// assert_eq!(set.higher(&3), Some(&4));
/// assert_eq!(set.poll_first(), Some(1));
/// assert_eq!(set.first(), Ok(&3));
/// ```
pub struct TreeSet<T> {
    // INVARIANTS:
    //  * `len` is the number of keys in `tree`
    tree: RedBlackTree<T>,
    len: usize,
}

impl<T> TreeSet<T> {
    pub fn new() -> Self {
        Self {
            tree: RedBlackTree::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.tree.clear();
        self.len = 0;
    }

    /// Returns an iterator over the elements in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        self.tree.iter()
    }

    /// Returns an iterator over the elements in descending order.
    pub fn descending_iter(&self) -> DescendingIter<'_, T> {
        self.tree.descending_iter()
    }

    /// Returns the smallest element.
    ///
    /// # Errors
    ///
    /// [`TreeSetError::NoSuchElement`] if the set is empty.
    pub fn first(&self) -> Result<&T, TreeSetError> {
        self.tree.first().ok_or(TreeSetError::NoSuchElement)
    }

    /// Returns the largest element.
    ///
    /// # Errors
    ///
    /// [`TreeSetError::NoSuchElement`] if the set is empty.
    pub fn last(&self) -> Result<&T, TreeSetError> {
        self.tree.last().ok_or(TreeSetError::NoSuchElement)
    }

    /// Removes and returns the smallest element, or `None` if the set is empty.
    pub fn poll_first(&mut self) -> Option<T> {
        let first = self.tree.poll_first()?;
        self.len -= 1;
        Some(first)
    }

    /// Removes and returns the largest element, or `None` if the set is empty.
    pub fn poll_last(&mut self) -> Option<T> {
        let last = self.tree.poll_last()?;
        self.len -= 1;
        Some(last)
    }
}

impl<T> TreeSet<T>
where
    T: Ord,
{
    /// Adds `value` to the set.
    ///
    /// Returns `false` if an equal value was already present, the set is not modified in that case.
    pub fn insert(&mut self, value: T) -> bool {
        let inserted = self.tree.insert(value);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Removes `value` from the set. Returns `false` if it wasn't present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the element equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let removed = self.tree.take(value)?;
        self.len -= 1;
        Some(removed)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains(value)
    }

    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.lookup(value)
    }

    /// Returns the greatest element less than or equal to `value`.
    pub fn floor<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.floor(value)
    }

    /// Returns the least element greater than or equal to `value`.
    pub fn ceiling<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.ceiling(value)
    }

    /// Returns the least element strictly greater than `value`.
    pub fn higher<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.higher(value)
    }

    /// Returns the greatest element strictly less than `value`.
    pub fn lower<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.lower(value)
    }
}

impl<T> Default for TreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TreeSet<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            len: self.len,
        }
    }
}

impl<T> fmt::Debug for TreeSet<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T> PartialEq for TreeSet<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T> Eq for TreeSet<T> where T: Eq {}

impl<T> FromIterator<T> for TreeSet<T>
where
    T: Ord,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T> Extend<T> for TreeSet<T>
where
    T: Ord,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, const N: usize> From<[T; N]> for TreeSet<T>
where
    T: Ord,
{
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<'a, T> IntoIterator for &'a TreeSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for TreeSet<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { set: self }
    }
}

/// Owning iterator over the elements of a [`TreeSet`] in ascending order.
///
/// Each step polls the smallest (or, from the back, the largest) element out of the set.
pub struct IntoIter<T> {
    set: TreeSet<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.set.poll_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        self.set.poll_last()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

#[cfg(test)]
mod tests {
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    /// Set with 1..=50 inserted in descending order.
    fn fifty() -> TreeSet<i32> {
        let mut set = TreeSet::new();
        for value in (1..=50).rev() {
            assert!(set.insert(value));
        }
        set
    }

    #[test]
    fn empty() {
        let mut set = TreeSet::<i32>::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.first(), Err(TreeSetError::NoSuchElement));
        assert_eq!(set.last(), Err(TreeSetError::NoSuchElement));
        assert_eq!(set.floor(&1), None);
        assert_eq!(set.ceiling(&1), None);
        assert_eq!(set.higher(&1), None);
        assert_eq!(set.lower(&1), None);
        assert_eq!(set.poll_first(), None);
        assert_eq!(set.poll_last(), None);
        assert!(!set.remove(&1));
        assert!(!set.contains(&1));
        assert_eq!(set.iter().next(), None);
        assert_eq!(set.descending_iter().next(), None);
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn ordered_insert() {
        let set: TreeSet<_> = (1..=10).collect();
        assert_eq!(set.len(), 10);
        assert!(!set.is_empty());
        assert_eq!(set.first(), Ok(&1));
        assert_eq!(set.last(), Ok(&10));
        assert!(set.contains(&5));
        assert!(!set.contains(&11));
    }

    #[test]
    fn reverse_ordered_insert() {
        let set: TreeSet<_> = (1..=10).rev().collect();
        assert_eq!(set.len(), 10);
        assert_eq!(set.first(), Ok(&1));
        assert_eq!(set.last(), Ok(&10));
        assert!(set.contains(&5));
        assert!(!set.contains(&11));
    }

    #[test]
    fn random_order_insert() {
        let mut values: Vec<i32> = (1..=1000).collect();
        values.shuffle(&mut ChaCha8Rng::seed_from_u64(1));

        let mut set = TreeSet::new();
        for &value in &values {
            assert!(set.insert(value));
        }
        assert_eq!(set.len(), 1000);
        assert_eq!(set.first(), Ok(&1));
        assert_eq!(set.last(), Ok(&1000));
        assert!(set.contains(&values[0]));
        assert!(!set.contains(&1001));
        assert!(set.iter().copied().eq(1..=1000));
    }

    #[test]
    fn duplicate_insert() {
        let mut set = TreeSet::new();
        assert!(set.insert(5));
        assert!(!set.insert(5));
        assert_eq!(set.len(), 1);

        set.extend([1, 5, 1, 7]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn remove() {
        let mut set = TreeSet::from([5, 10, 15]);
        assert_eq!(set.len(), 3);
        assert!(set.remove(&5));
        assert!(!set.contains(&5));
        assert_eq!(set.len(), 2);
        assert!(!set.remove(&5));
        assert_eq!(set.len(), 2);
        assert_eq!(set.take(&10), Some(10));
        assert_eq!(set.take(&10), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn clear() {
        let mut set = TreeSet::from([5, 10, 15]);
        set.clear();
        assert_eq!(set.len(), 0);
        assert!(set.is_empty());
        assert_eq!(set.first(), Err(TreeSetError::NoSuchElement));
        assert_eq!(set.last(), Err(TreeSetError::NoSuchElement));
        assert!(set.insert(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn iter() {
        let set = fifty();
        assert!(set.iter().copied().eq(1..=50));
        assert!(set.descending_iter().copied().eq((1..=50).rev()));
        assert!((&set).into_iter().copied().eq(1..=50));
    }

    #[test]
    fn into_iter() {
        let set = fifty();
        let mut iter = set.into_iter();
        assert_eq!(iter.len(), 50);
        assert_eq!(iter.next(), Some(1));
        assert_eq!(iter.next_back(), Some(50));
        assert_eq!(iter.len(), 48);
        assert!(iter.eq(2..=49));
    }

    #[test]
    fn iterator_types_at_crate_root() {
        let set = fifty();
        let asc: crate::Iter<'_, i32> = set.iter();
        let desc: crate::DescendingIter<'_, i32> = set.descending_iter();
        assert_eq!(asc.last(), Some(&50));
        assert_eq!(desc.last(), Some(&1));

        let owned: crate::IntoIter<i32> = set.into_iter();
        assert_eq!(owned.len(), 50);
    }

    #[test]
    fn poll_first() {
        let mut set = fifty();
        for value in 1..=50 {
            assert_eq!(set.poll_first(), Some(value));
            assert_eq!(set.len(), (50 - value) as usize);
        }
        assert!(set.is_empty());
        assert_eq!(set.poll_first(), None);
    }

    #[test]
    fn poll_last() {
        let mut set = fifty();
        for value in (1..=50).rev() {
            assert_eq!(set.poll_last(), Some(value));
        }
        assert!(set.is_empty());
        assert_eq!(set.poll_last(), None);
    }

    #[test]
    fn first_last_after_poll() {
        let mut set = fifty();
        assert_eq!(set.first(), Ok(&1));
        set.poll_first();
        assert_eq!(set.first(), Ok(&2));

        assert_eq!(set.last(), Ok(&50));
        set.poll_last();
        assert_eq!(set.last(), Ok(&49));
    }

    #[test]
    fn navigation() {
        let set = fifty();
        assert_eq!(set.floor(&25), Some(&25));
        assert_eq!(set.floor(&0), None);
        assert_eq!(set.ceiling(&24), Some(&24));
        assert_eq!(set.ceiling(&51), None);
        assert_eq!(set.higher(&25), Some(&26));
        assert_eq!(set.higher(&50), None);
        assert_eq!(set.lower(&25), Some(&24));
        assert_eq!(set.lower(&1), None);

        let set = TreeSet::from([1, 5, 3, 4]);
        assert_eq!(set.floor(&4), Some(&4));
        assert_eq!(set.floor(&2), Some(&1));
        assert_eq!(set.ceiling(&2), Some(&3));
        assert_eq!(set.ceiling(&6), None);
        assert_eq!(set.higher(&3), Some(&4));
        assert_eq!(set.higher(&5), None);
        assert_eq!(set.lower(&3), Some(&1));
        assert_eq!(set.lower(&1), None);
    }

    #[test]
    fn clone_independence() {
        let original = fifty();
        let mut copy = original.clone();
        assert_eq!(original, copy);

        assert!(copy.remove(&25));
        assert!(copy.insert(100));
        assert_eq!(copy.poll_first(), Some(1));
        assert_ne!(original, copy);

        assert_eq!(original.len(), 50);
        assert!(original.contains(&25));
        assert!(!original.contains(&100));
        assert!(original.iter().copied().eq(1..=50));
    }

    #[test]
    fn strings() {
        let mut set = TreeSet::new();
        for word in ["pear", "apple", "fig", "banana"] {
            set.insert(word.to_string());
        }
        assert_eq!(set.first().map(String::as_str), Ok("apple"));
        assert_eq!(set.ceiling("c").map(String::as_str), Some("fig"));
        assert!(set.remove("fig"));
        assert_eq!(set.ceiling("c").map(String::as_str), Some("pear"));
    }

    #[test]
    fn debug() {
        let set = TreeSet::from([3, 1, 2]);
        assert_eq!(format!("{set:?}"), "{1, 2, 3}");
    }

    #[test]
    fn shared_behind_mutex() {
        use std::sync::{Arc, Mutex};
        use std::thread;

        let set = Arc::new(Mutex::new(TreeSet::new()));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let set = Arc::clone(&set);
                thread::spawn(move || {
                    for i in 0..100 {
                        set.lock().unwrap().insert(t * 100 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let set = set.lock().unwrap();
        assert_eq!(set.len(), 400);
        assert!(set.iter().copied().eq(0..400));
    }

    mod proptests {
        use std::collections::BTreeSet;

        use proptest::prelude::*;

        use super::*;

        #[cfg(not(miri))]
        const SET_SIZE: usize = 1000;
        #[cfg(miri)]
        const SET_SIZE: usize = 50;

        #[cfg(not(miri))]
        const PROPTEST_CASES: u32 = 256;
        #[cfg(miri)]
        const PROPTEST_CASES: u32 = 10;

        proptest!(
            #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

            #[test]
            fn len_tracks_distinct_keys(
                ops in proptest::collection::vec((any::<bool>(), 0..500i32), 0..SET_SIZE),
            ) {
                let mut reference = BTreeSet::new();
                let mut set = TreeSet::new();
                for (insert, key) in ops {
                    if insert {
                        prop_assert_eq!(reference.insert(key), set.insert(key));
                    } else {
                        prop_assert_eq!(reference.remove(&key), set.remove(&key));
                    }
                    prop_assert_eq!(reference.len(), set.len());
                    prop_assert_eq!(reference.is_empty(), set.is_empty());
                }
                prop_assert_eq!(reference.first(), set.first().ok());
                prop_assert_eq!(reference.last(), set.last().ok());
            }

            #[test]
            fn poll_drains_in_order(
                inserts in proptest::collection::vec(0..10000i32, 0..SET_SIZE),
            ) {
                let reference: BTreeSet<_> = inserts.iter().copied().collect();
                let mut set: TreeSet<_> = inserts.into_iter().collect();

                let mut polled = Vec::with_capacity(set.len());
                while let Some(value) = set.poll_first() {
                    polled.push(value);
                }
                prop_assert!(set.is_empty());
                prop_assert!(reference.into_iter().eq(polled));
            }
        );
    }
}
