//! # Modes and Content Kinds
//!
//! Every session runs with an explicit [`ContentKind`]. Text means UTF-8: text
//! sessions refuse bytes that are not valid UTF-8, both when seeding and when
//! writing. Binary sessions pass bytes through untouched.
//!
//! Inference is a convenience layered on top: [`ContentKind::infer`] looks at
//! the first content value through the [`Content`] trait, and an explicit kind
//! always wins. String-like values infer `Text`, byte-like values `Binary`,
//! and anything else falls back to `Text`.
//!
//! [`WriteMode`] also parses the classic mode strings (`"w"`, `"ab"`, ...), so
//! callers holding a mode string get the same validation the typed API has:
//! read or update modes are rejected before any file is created.

use crate::error::{FatomicError, Result};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentKind {
    #[default]
    Text,
    Binary,
}

impl ContentKind {
    /// Pick a kind: `explicit` if given, otherwise whatever `first` suggests.
    pub fn infer<C: Content + ?Sized>(first: Option<&C>, explicit: Option<ContentKind>) -> Self {
        match (explicit, first) {
            (Some(kind), _) => kind,
            (None, Some(content)) => content.guess_kind(),
            (None, None) => ContentKind::Text,
        }
    }
}

/// Whether the staging file starts empty or with the target's current bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpenMode {
    #[default]
    Write,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WriteMode {
    pub open: OpenMode,
    pub kind: ContentKind,
}

impl WriteMode {
    pub fn new(open: OpenMode, kind: ContentKind) -> Self {
        Self { open, kind }
    }

    pub fn write(kind: ContentKind) -> Self {
        Self::new(OpenMode::Write, kind)
    }

    pub fn append(kind: ContentKind) -> Self {
        Self::new(OpenMode::Append, kind)
    }

    pub fn is_append(&self) -> bool {
        self.open == OpenMode::Append
    }
}

impl FromStr for WriteMode {
    type Err = FatomicError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FatomicError::InvalidMode(s.to_string());
        let mut chars = s.chars();
        let open = match chars.next() {
            // Exclusive creation adds nothing here: the staging file is always new.
            Some('w') | Some('x') => OpenMode::Write,
            Some('a') => OpenMode::Append,
            _ => return Err(invalid()),
        };
        let kind = match chars.as_str() {
            "" | "t" => ContentKind::Text,
            "b" => ContentKind::Binary,
            _ => return Err(invalid()),
        };
        Ok(WriteMode { open, kind })
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = match self.open {
            OpenMode::Write => "w",
            OpenMode::Append => "a",
        };
        let kind = match self.kind {
            ContentKind::Text => "",
            ContentKind::Binary => "b",
        };
        write!(f, "{}{}", open, kind)
    }
}

/// A value that can be written to a session.
pub trait Content {
    /// The bytes to write. Borrowed when the value already holds them.
    fn bytes(&self) -> Cow<'_, [u8]>;

    /// The kind this value suggests when the caller did not pick one.
    fn guess_kind(&self) -> ContentKind {
        ContentKind::Text
    }
}

impl Content for str {
    fn bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl Content for String {
    fn bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl Content for Cow<'_, str> {
    fn bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl Content for char {
    fn bytes(&self) -> Cow<'_, [u8]> {
        let mut buf = [0u8; 4];
        Cow::Owned(self.encode_utf8(&mut buf).as_bytes().to_vec())
    }
}

impl Content for [u8] {
    fn bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }

    fn guess_kind(&self) -> ContentKind {
        ContentKind::Binary
    }
}

impl<const N: usize> Content for [u8; N] {
    fn bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }

    fn guess_kind(&self) -> ContentKind {
        ContentKind::Binary
    }
}

impl Content for Vec<u8> {
    fn bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }

    fn guess_kind(&self) -> ContentKind {
        ContentKind::Binary
    }
}

impl Content for Cow<'_, [u8]> {
    fn bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }

    fn guess_kind(&self) -> ContentKind {
        ContentKind::Binary
    }
}

impl<C: Content + ?Sized> Content for &C {
    fn bytes(&self) -> Cow<'_, [u8]> {
        (**self).bytes()
    }

    fn guess_kind(&self) -> ContentKind {
        (**self).guess_kind()
    }
}

impl<C: Content + ?Sized> Content for Box<C> {
    fn bytes(&self) -> Cow<'_, [u8]> {
        (**self).bytes()
    }

    fn guess_kind(&self) -> ContentKind {
        (**self).guess_kind()
    }
}
