use core::fmt;

/// Errors returned by [`TreeSet`](crate::TreeSet) accessors that require an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeSetError {
    /// The set is empty.
    NoSuchElement,
}

impl fmt::Display for TreeSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchElement => write!(f, "no such element, the set is empty"),
        }
    }
}

impl std::error::Error for TreeSetError {}
