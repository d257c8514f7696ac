//! One-shot helpers over a default [`AtomicWriter`] (rename-based replace,
//! default configuration). Use an `AtomicWriter` directly to pick another
//! replacer or configuration.

use crate::error::Result;
use crate::mode::{Content, ContentKind, WriteMode};
use crate::read::Piece;
use crate::session::WriteSession;
use crate::writer::AtomicWriter;
use std::path::Path;

/// Run `body` against a session on `path`, committing on `Ok`.
pub fn with_session<T, F>(path: impl AsRef<Path>, mode: WriteMode, body: F) -> Result<T>
where
    F: FnOnce(&mut WriteSession<'_>) -> Result<T>,
{
    AtomicWriter::new().session(path, mode, body)
}

pub fn write_all<C: Content + ?Sized>(
    path: impl AsRef<Path>,
    contents: &C,
    kind: Option<ContentKind>,
) -> Result<()> {
    AtomicWriter::new().write_all(path, contents, kind)
}

pub fn append_all<C: Content + ?Sized>(
    path: impl AsRef<Path>,
    contents: &C,
    kind: Option<ContentKind>,
) -> Result<()> {
    AtomicWriter::new().append_all(path, contents, kind)
}

pub fn write_chunks<I>(path: impl AsRef<Path>, chunks: I, kind: Option<ContentKind>) -> Result<()>
where
    I: IntoIterator,
    I::Item: Content,
{
    AtomicWriter::new().write_chunks(path, chunks, kind)
}

pub fn append_chunks<I>(path: impl AsRef<Path>, chunks: I, kind: Option<ContentKind>) -> Result<()>
where
    I: IntoIterator,
    I::Item: Content,
{
    AtomicWriter::new().append_chunks(path, chunks, kind)
}

pub fn write_lines<I>(path: impl AsRef<Path>, lines: I, kind: Option<ContentKind>) -> Result<()>
where
    I: IntoIterator,
    I::Item: Content,
{
    AtomicWriter::new().write_lines(path, lines, kind)
}

pub fn append_lines<I>(path: impl AsRef<Path>, lines: I, kind: Option<ContentKind>) -> Result<()>
where
    I: IntoIterator,
    I::Item: Content,
{
    AtomicWriter::new().append_lines(path, lines, kind)
}

pub fn transform<P, O, F>(path: impl AsRef<Path>, func: F) -> Result<()>
where
    P: Piece,
    O: Content,
    F: FnMut(P) -> O,
{
    AtomicWriter::new().transform(path, func)
}

pub fn transform_chunks<P, O, F>(
    path: impl AsRef<Path>,
    func: F,
    chunk_size: Option<usize>,
) -> Result<()>
where
    P: Piece,
    O: Content,
    F: FnMut(P) -> O,
{
    AtomicWriter::new().transform_chunks(path, func, chunk_size)
}

pub fn transform_all<P, O, F>(path: impl AsRef<Path>, func: F) -> Result<()>
where
    P: Piece,
    O: Content,
    F: FnOnce(P) -> O,
{
    AtomicWriter::new().transform_all(path, func)
}
