use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

const ID_SPLITOR: char = ':';
const ESCAPE: char = '`';

/// Decoded identifier parts. Edge ids have at most five.
pub type IdParts = SmallVec<[String; 5]>;

/// An element identifier in its spliced string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id(CompactString);

impl Id {
    pub fn new(value: impl Into<CompactString>) -> Self {
        Self(value.into())
    }

    /// Splices parts into one id, escaping separators inside parts.
    pub fn splice<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = CompactString::default();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push(ID_SPLITOR);
            }
            for c in part.as_ref().chars() {
                if c == ID_SPLITOR || c == ESCAPE {
                    out.push(ESCAPE);
                }
                out.push(c);
            }
        }
        Self(out)
    }

    /// Inverse of [`Id::splice`].
    pub fn split(&self) -> IdParts {
        let mut parts = IdParts::new();
        let mut current = String::new();
        let mut escaped = false;
        for c in self.0.chars() {
            if escaped {
                current.push(c);
                escaped = false;
            } else if c == ESCAPE {
                escaped = true;
            } else if c == ID_SPLITOR {
                parts.push(std::mem::take(&mut current));
            } else {
                current.push(c);
            }
        }
        // A dangling escape has nothing to escape and stays literal.
        if escaped {
            current.push(ESCAPE);
        }
        parts.push(current);
        parts
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::new(value)
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::new(value)
    }
}

/// Edge direction relative to the owner vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Out,
    In,
    Both,
}

impl Direction {
    pub fn name(self) -> &'static str {
        match self {
            Direction::Out => "OUT",
            Direction::In => "IN",
            Direction::Both => "BOTH",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
