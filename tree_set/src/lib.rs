//! An ordered set built on a red-black tree.
//!
//! [`RedBlackTree`] is the balanced search tree with sorted-set navigation
//! (`first`/`last`, `floor`/`ceiling`, `lower`/`higher`, `poll_first`/`poll_last`)
//! and [`TreeSet`] is the set on top of it that also keeps track of its size.
//!
//! The iterator types are exported next to the collections, so they can be
//! named in signatures:
//!
//! ```
//! use tree_set::{DescendingIter, IntoIter, Iter, TreeSet};
//!
//! fn evens(set: &TreeSet<i32>) -> impl Iterator<Item = &i32> {
//!     let iter: Iter<'_, i32> = set.iter();
//!     iter.filter(|k| *k % 2 == 0)
//! }
//!
//! let set = TreeSet::from([3, 1, 4, 2]);
//! assert!(evens(&set).copied().eq([2, 4]));
//!
//! let desc: DescendingIter<'_, i32> = set.descending_iter();
//! assert!(desc.copied().eq([4, 3, 2, 1]));
//!
//! let owned: IntoIter<i32> = set.into_iter();
//! assert!(owned.eq(1..=4));
//! ```

#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod red_black_tree;
pub mod tree_set;

pub use error::TreeSetError;
pub use red_black_tree::{DescendingIter, Iter, RedBlackTree};
pub use tree_set::{IntoIter, TreeSet};
