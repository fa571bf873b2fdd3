use std::fmt;

use serde::{Deserialize, Serialize};

/// A positional path identifier: the sequence of child ordinals from the
/// root down to a node, used for tie-breaks and trace reconstruction.
///
/// `Index` never inspects its ordinals beyond storing and displaying them;
/// the engine only ever calls [`Index::root`] and [`Index::extend`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Index(Vec<u64>);

impl Index {
    /// The empty path, identifying the root of a search tree.
    pub fn root() -> Self {
        Index(Vec::new())
    }

    /// Appends `child_ordinal` to `previous`, producing the child's path.
    pub fn extend(previous: &Index, child_ordinal: u64) -> Index {
        let mut ordinals = previous.0.clone();
        ordinals.push(child_ordinal);
        Index(ordinals)
    }

    /// The ordinals making up this path, root-first.
    pub fn ordinals(&self) -> &[u64] {
        &self.0
    }

    /// True if `self` is `other` extended by exactly one more ordinal.
    pub fn is_child_of(&self, other: &Index) -> bool {
        self.0.len() == other.0.len() + 1 && self.0.starts_with(&other.0)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index(")?;
        for (i, ordinal) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{ordinal}")?;
        }
        write!(f, ")")
    }
}
