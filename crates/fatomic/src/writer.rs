//! # Atomic Writer
//!
//! [`AtomicWriter`] is the entry point: it owns the [`WriterConfig`] and the
//! [`Replacer`] picked when it was built, and opens [`WriteSession`]s.
//!
//! ## Sessions
//!
//! - [`AtomicWriter::begin_write`] / [`WriteSession::finish`]: explicit form.
//!   A session that is dropped unfinished is discarded.
//! - [`AtomicWriter::session`]: scoped form. The body's `Ok` commits (unless
//!   it called `discard`), its `Err` discards and is returned as-is.
//!
//! ## Helpers
//!
//! Every helper is one session: `write_*` truncate, `append_*` seed the
//! staging file with the current content first, `transform*` rewrite the
//! existing file piece by piece. Helpers taking `Option<ContentKind>` infer
//! the kind from the first value when given `None`. Transforms get their kind
//! from the piece type: `String` for text, `Vec<u8>` for bytes.
//!
//! ## Generic Over Replacer
//!
//! `AtomicWriter<R: Replacer>` defaults to [`RenameReplacer`]. Tests swap in
//! replacers that fail or count calls without touching the rename itself.

use crate::config::WriterConfig;
use crate::error::{FatomicError, Result};
use crate::mode::{Content, ContentKind, OpenMode, WriteMode};
use crate::read::{Chunks, Lines, Piece};
use crate::replace::{RenameReplacer, Replacer};
use crate::session::WriteSession;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

pub struct AtomicWriter<R = RenameReplacer> {
    config: WriterConfig,
    replacer: R,
}

impl AtomicWriter<RenameReplacer> {
    pub fn new() -> Self {
        Self::with_replacer(RenameReplacer)
    }

    /// Build a rename-based writer from the environment and an optional
    /// config file. See [`WriterConfig::load`].
    pub fn from_config_file(file: Option<&Path>) -> Result<Self> {
        Self::new().with_config(WriterConfig::load(file)?)
    }
}

impl Default for AtomicWriter<RenameReplacer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Replacer> AtomicWriter<R> {
    pub fn with_replacer(replacer: R) -> Self {
        Self {
            config: WriterConfig::default(),
            replacer,
        }
    }

    /// Replace the configuration. Fails if `config` does not validate.
    pub fn with_config(mut self, config: WriterConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn replacer(&self) -> &R {
        &self.replacer
    }

    /// Start a session: create the staging file next to `path` and, in
    /// append mode, seed it with the current content of `path`.
    pub fn begin_write(
        &self,
        path: impl AsRef<Path>,
        mode: WriteMode,
    ) -> Result<WriteSession<'_, R>> {
        WriteSession::begin(&self.replacer, &self.config, path.as_ref(), mode)
    }

    /// Like [`begin_write`](Self::begin_write), taking a mode string such as
    /// `"w"` or `"ab"`. Invalid modes fail before anything is created.
    pub fn open(&self, path: impl AsRef<Path>, mode: &str) -> Result<WriteSession<'_, R>> {
        let mode: WriteMode = mode.parse()?;
        self.begin_write(path, mode)
    }

    /// Run `body` against a fresh session and end it exactly once.
    pub fn session<T, F>(&self, path: impl AsRef<Path>, mode: WriteMode, body: F) -> Result<T>
    where
        F: FnOnce(&mut WriteSession<'_, R>) -> Result<T>,
    {
        let mut session = self.begin_write(path, mode)?;
        let value = body(&mut session)?;
        session.finish()?;
        Ok(value)
    }

    pub fn write_all<C: Content + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        contents: &C,
        kind: Option<ContentKind>,
    ) -> Result<()> {
        self.whole(path, OpenMode::Write, contents, kind)
    }

    pub fn append_all<C: Content + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        contents: &C,
        kind: Option<ContentKind>,
    ) -> Result<()> {
        self.whole(path, OpenMode::Append, contents, kind)
    }

    pub fn write_chunks<I>(
        &self,
        path: impl AsRef<Path>,
        chunks: I,
        kind: Option<ContentKind>,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Content,
    {
        self.chunked(path, OpenMode::Write, chunks, kind)
    }

    pub fn append_chunks<I>(
        &self,
        path: impl AsRef<Path>,
        chunks: I,
        kind: Option<ContentKind>,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Content,
    {
        self.chunked(path, OpenMode::Append, chunks, kind)
    }

    /// Same as [`write_chunks`](Self::write_chunks); lines are written as
    /// given, terminators included.
    pub fn write_lines<I>(
        &self,
        path: impl AsRef<Path>,
        lines: I,
        kind: Option<ContentKind>,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Content,
    {
        self.write_chunks(path, lines, kind)
    }

    pub fn append_lines<I>(
        &self,
        path: impl AsRef<Path>,
        lines: I,
        kind: Option<ContentKind>,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Content,
    {
        self.append_chunks(path, lines, kind)
    }

    /// Rewrite `path` line by line: each line of the current file, terminator
    /// included, is replaced by `func(line)`. If reading fails the session is
    /// discarded and `path` is left unchanged.
    pub fn transform<P, O, F>(&self, path: impl AsRef<Path>, func: F) -> Result<()>
    where
        P: Piece,
        O: Content,
        F: FnMut(P) -> O,
    {
        let path = path.as_ref();
        let source = open_source(path)?;
        self.rewrite(path, P::KIND, Lines::new(source), func)
    }

    /// Rewrite `path` chunk by chunk. `chunk_size` counts characters for text
    /// pieces and bytes for binary ones; `None` uses the configured size.
    pub fn transform_chunks<P, O, F>(
        &self,
        path: impl AsRef<Path>,
        func: F,
        chunk_size: Option<usize>,
    ) -> Result<()>
    where
        P: Piece,
        O: Content,
        F: FnMut(P) -> O,
    {
        let size = chunk_size.unwrap_or(self.config.chunk_size);
        if size == 0 {
            return Err(FatomicError::InvalidChunkSize);
        }
        let path = path.as_ref();
        let source = open_source(path)?;
        self.rewrite(path, P::KIND, Chunks::new(source, size), func)
    }

    /// Rewrite `path` in one piece: its whole content becomes `func(content)`.
    pub fn transform_all<P, O, F>(&self, path: impl AsRef<Path>, func: F) -> Result<()>
    where
        P: Piece,
        O: Content,
        F: FnOnce(P) -> O,
    {
        let path = path.as_ref();
        let mut source = open_source(path)?;
        let whole = P::read_all(&mut source).map_err(|e| read_err(path, e))?;
        self.session(path, WriteMode::write(P::KIND), |session| {
            session.write(&func(whole))
        })
    }

    fn whole<C: Content + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        open: OpenMode,
        contents: &C,
        kind: Option<ContentKind>,
    ) -> Result<()> {
        let kind = ContentKind::infer(Some(contents), kind);
        self.session(path, WriteMode::new(open, kind), |session| {
            session.write(contents)
        })
    }

    fn chunked<I>(
        &self,
        path: impl AsRef<Path>,
        open: OpenMode,
        chunks: I,
        kind: Option<ContentKind>,
    ) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Content,
    {
        let mut chunks = chunks.into_iter().peekable();
        let kind = ContentKind::infer(chunks.peek(), kind);
        self.session(path, WriteMode::new(open, kind), |session| {
            session.write_chunks(chunks)
        })
    }

    fn rewrite<P, O, F, I>(
        &self,
        path: &Path,
        kind: ContentKind,
        pieces: I,
        mut func: F,
    ) -> Result<()>
    where
        P: Piece,
        O: Content,
        F: FnMut(P) -> O,
        I: Iterator<Item = io::Result<P>>,
    {
        self.session(path, WriteMode::write(kind), |session| {
            for piece in pieces {
                let piece = piece.map_err(|e| read_err(path, e))?;
                session.write(&func(piece))?;
            }
            Ok(())
        })
    }
}

fn open_source(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| read_err(path, e))
}

fn read_err(path: &Path, source: io::Error) -> FatomicError {
    FatomicError::Read {
        path: path.to_path_buf(),
        source,
    }
}
