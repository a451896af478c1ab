//! Token, sequence and edit types shared by the lattice, scorer and trainer.
//!
//! A name reaches this crate already tokenized: one [`Token`] per character
//! or phonetic unit. [`Token::EMPTY`] is reserved to mark "nothing consumed"
//! on one side of an [`Edit`] and is never produced for a real character.

use std::fmt;

/// Integer identifier for a character or phonetic unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Sentinel for the empty side of an insertion or deletion.
    pub const EMPTY: Token = Token(0);

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Token::EMPTY
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("ε")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// One tokenized name.
pub type Sequence = Vec<Token>;

/// A single edit `(from, to)` on an alignment path.
///
/// `from` is the source-side token and `to` the target-side token; either
/// may be [`Token::EMPTY`], but not both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edit {
    pub from: Token,
    pub to: Token,
}

/// Shape of an [`Edit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    Match,
    Substitution,
    Insertion,
    Deletion,
}

impl Edit {
    #[inline]
    pub fn new(from: Token, to: Token) -> Self {
        debug_assert!(
            !(from.is_empty() && to.is_empty()),
            "an edit consumes at least one real token"
        );
        Self { from, to }
    }

    /// Insertion of `to` (nothing consumed from the source).
    #[inline]
    pub fn insertion(to: Token) -> Self {
        Self::new(Token::EMPTY, to)
    }

    /// Deletion of `from` (nothing consumed from the target).
    #[inline]
    pub fn deletion(from: Token) -> Self {
        Self::new(from, Token::EMPTY)
    }

    pub fn kind(&self) -> EditKind {
        match (self.from.is_empty(), self.to.is_empty()) {
            (true, _) => EditKind::Insertion,
            (_, true) => EditKind::Deletion,
            _ if self.from == self.to => EditKind::Match,
            _ => EditKind::Substitution,
        }
    }

    /// The same edit seen from the other side of the alignment.
    #[inline]
    pub fn swapped(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.from, self.to)
    }
}

/// Map raw bytes to tokens one-to-one.
///
/// Useful for already-normalized ASCII names in tests and demos. A zero byte
/// would collide with [`Token::EMPTY`], so callers must not pass one.
pub fn tokens_from_bytes(bytes: &[u8]) -> Sequence {
    debug_assert!(!bytes.contains(&0), "byte 0 is reserved for Token::EMPTY");
    bytes.iter().map(|&b| Token(u32::from(b))).collect()
}
