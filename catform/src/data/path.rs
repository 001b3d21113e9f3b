use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of a data path: a field name or a collection index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSeg {
    /// Index into a repeating value.
    Index(usize),
    /// Named field of a record.
    Name(String),
}

impl fmt::Display for PathSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSeg::Index(i) => write!(f, "{i}"),
            PathSeg::Name(s) => f.write_str(s),
        }
    }
}

impl From<usize> for PathSeg {
    fn from(index: usize) -> Self {
        PathSeg::Index(index)
    }
}

impl From<&str> for PathSeg {
    fn from(name: &str) -> Self {
        PathSeg::Name(name.to_string())
    }
}

impl From<String> for PathSeg {
    fn from(name: String) -> Self {
        PathSeg::Name(name)
    }
}

/// Location of a value within a record tree.
///
/// A path is a list of segments from the record root down to a field or a
/// repeating instance. Paths are only meaningful against the record state
/// they were produced from; structural edits invalidate deeper paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Path(Vec<PathSeg>);

impl Path {
    /// An empty path, same as [`Path::root`].
    pub fn new() -> Self {
        Path(Vec::new())
    }

    /// The record root.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Parse a dot-separated key string.
    ///
    /// All-digit segments are treated as indices, everything else as field
    /// names. An empty string yields the root path.
    pub fn from_key(key: &str) -> Self {
        if key.is_empty() {
            return Path::root();
        }
        Path(
            key.split('.')
                .map(|s| match s.parse::<usize>() {
                    Ok(i) => PathSeg::Index(i),
                    Err(_) => PathSeg::Name(s.to_string()),
                })
                .collect(),
        )
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments from root to leaf.
    pub fn segments(&self) -> &[PathSeg] {
        &self.0
    }

    /// The final segment, if any.
    pub fn last(&self) -> Option<&PathSeg> {
        self.0.last()
    }

    /// Append a segment in place.
    pub fn push(&mut self, seg: impl Into<PathSeg>) {
        self.0.push(seg.into());
    }

    /// Remove and return the final segment.
    pub fn pop(&mut self) -> Option<PathSeg> {
        self.0.pop()
    }

    /// A new path with one more segment.
    pub fn child(&self, seg: impl Into<PathSeg>) -> Path {
        let mut segs = self.0.clone();
        segs.push(seg.into());
        Path(segs)
    }

    /// A new path addressing instance `index` under this one.
    pub fn child_index(&self, index: usize) -> Path {
        self.child(PathSeg::Index(index))
    }

    /// A new path addressing field `name` under this one.
    pub fn child_name(&self, name: impl Into<String>) -> Path {
        self.child(PathSeg::Name(name.into()))
    }

    /// Concatenate two paths.
    pub fn join(&self, other: &Path) -> Path {
        let mut segs = self.0.clone();
        segs.extend(other.0.iter().cloned());
        Path(segs)
    }

    /// The path with the final segment removed, or `None` at the root.
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Path(self.0[..self.0.len() - 1].to_vec()))
    }
}

impl fmt::Display for Path {
    /// Dot-separated key string; the root renders as an empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl From<Vec<PathSeg>> for Path {
    fn from(segs: Vec<PathSeg>) -> Self {
        Path(segs)
    }
}

impl FromIterator<PathSeg> for Path {
    fn from_iter<T: IntoIterator<Item = PathSeg>>(iter: T) -> Self {
        Path(iter.into_iter().collect())
    }
}
