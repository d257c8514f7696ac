//! # Write Sessions
//!
//! A [`WriteSession`] binds one staging file to one target path. It is created
//! by [`crate::AtomicWriter::begin_write`] and ends exactly once, either:
//!
//! - **Commit**: [`WriteSession::finish`] flushes and closes the staging file,
//!   then hands it to the [`Replacer`], which installs it over the target in
//!   a single step.
//! - **Discard**: after [`WriteSession::discard`], `finish` deletes the staging
//!   file and leaves the target alone.
//! - **Unwind**: a session dropped without `finish` (early return, `?`, panic)
//!   is treated as discarded. With `keep_staging_on_failure` the staging file
//!   is left on disk instead, and its path is logged.
//!
//! A failed commit takes the unwind path too, so the target is unchanged and
//! no staging file is left behind.

use crate::config::WriterConfig;
use crate::error::{FatomicError, Result};
use crate::mode::{Content, ContentKind, WriteMode};
use crate::replace::{RenameReplacer, Replacer};
use crate::staging;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub struct WriteSession<'w, R: Replacer + ?Sized = RenameReplacer> {
    replacer: &'w R,
    target: PathBuf,
    staging: PathBuf,
    sink: Option<BufWriter<File>>,
    kind: ContentKind,
    discarded: bool,
    finished: bool,
    keep_on_failure: bool,
}

impl<'w, R: Replacer + ?Sized> WriteSession<'w, R> {
    pub(crate) fn begin(
        replacer: &'w R,
        config: &WriterConfig,
        target: &Path,
        mode: WriteMode,
    ) -> Result<Self> {
        let (staging_path, file) = staging::create(
            target,
            &config.staging_suffix(),
            config.preserve_permissions,
        )?;

        let mut session = WriteSession {
            replacer,
            target: target.to_path_buf(),
            staging: staging_path,
            sink: Some(BufWriter::new(file)),
            kind: mode.kind,
            discarded: false,
            finished: false,
            keep_on_failure: config.keep_staging_on_failure,
        };

        tracing::debug!(
            target_path = %session.target.display(),
            staging = %session.staging.display(),
            mode = %mode,
            "write session started"
        );

        if mode.is_append() {
            session.seed()?;
        }
        Ok(session)
    }

    /// Copy the target's current content into the staging file.
    /// A missing target seeds nothing.
    fn seed(&mut self) -> Result<()> {
        let target = self.target.clone();
        let seed_err = |source: io::Error| FatomicError::Seed {
            path: target.clone(),
            source,
        };

        let mut source = match File::open(&target) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(seed_err(err)),
        };

        let sink = self.sink.as_mut().ok_or_else(|| seed_err(closed()))?;
        match self.kind {
            ContentKind::Binary => {
                io::copy(&mut source, sink).map_err(seed_err)?;
            }
            ContentKind::Text => {
                let mut text = String::new();
                source.read_to_string(&mut text).map_err(seed_err)?;
                sink.write_all(text.as_bytes()).map_err(seed_err)?;
            }
        }
        Ok(())
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Mark the session for cancellation. Content already written stays in
    /// the staging file, but it will never be installed.
    pub fn discard(&mut self) {
        self.discarded = true;
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Write one value. Text sessions reject content that is not UTF-8.
    pub fn write<C: Content + ?Sized>(&mut self, content: &C) -> Result<()> {
        self.write_bytes(&content.bytes())
    }

    /// Write raw bytes, checked for UTF-8 in text sessions.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.kind == ContentKind::Text {
            if let Err(err) = std::str::from_utf8(bytes) {
                return Err(self.write_err(io::Error::new(io::ErrorKind::InvalidData, err)));
            }
        }
        self.write_raw(bytes)
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.write_raw(text.as_bytes())
    }

    /// Write each chunk in order.
    pub fn write_chunks<I>(&mut self, chunks: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Content,
    {
        for chunk in chunks {
            self.write(&chunk)?;
        }
        Ok(())
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let result = match self.sink.as_mut() {
            Some(sink) => sink.write_all(bytes),
            None => Err(closed()),
        };
        result.map_err(|e| self.write_err(e))
    }

    fn write_err(&self, source: io::Error) -> FatomicError {
        FatomicError::Write {
            path: self.target.clone(),
            source,
        }
    }

    /// End the session: install the staging file over the target, or delete
    /// it if the session was discarded.
    pub fn finish(mut self) -> Result<()> {
        let sink = self.sink.take();

        if self.discarded {
            drop(sink);
            staging::remove(&self.staging);
            self.finished = true;
            tracing::debug!(target_path = %self.target.display(), "write session discarded");
            return Ok(());
        }

        let sink = sink.ok_or_else(|| self.write_err(closed()))?;
        let file = sink
            .into_inner()
            .map_err(|e| self.write_err(e.into_error()))?;
        drop(file);

        self.replacer
            .replace(&self.staging, &self.target)
            .map_err(|source| FatomicError::Commit {
                path: self.target.clone(),
                source,
            })?;
        self.finished = true;

        tracing::debug!(target_path = %self.target.display(), "write session committed");
        Ok(())
    }
}

impl<R: Replacer + ?Sized> Write for WriteSession<'_, R> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.sink.as_mut() {
            Some(sink) => sink.write(buf),
            None => Err(closed()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Err(closed()),
        }
    }
}

impl<R: Replacer + ?Sized> Drop for WriteSession<'_, R> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        drop(self.sink.take());
        if self.keep_on_failure && !self.discarded {
            tracing::warn!(
                target_path = %self.target.display(),
                staging = %self.staging.display(),
                "write session abandoned, keeping staging file"
            );
            return;
        }
        staging::remove(&self.staging);
        tracing::debug!(target_path = %self.target.display(), "write session abandoned");
    }
}

fn closed() -> io::Error {
    io::Error::other("staging file already closed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::OpenMode;
    use crate::test_utils::{FailingReplacer, TestDir};
    use std::fs;

    fn begin<'w>(
        replacer: &'w RenameReplacer,
        config: &WriterConfig,
        target: &Path,
        mode: &str,
    ) -> WriteSession<'w, RenameReplacer> {
        WriteSession::begin(replacer, config, target, mode.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_staging_invisible_until_finish() {
        let env = TestDir::new();
        let target = env.path("a.txt");
        fs::write(&target, "old").unwrap();

        let config = WriterConfig::default();
        let mut session = begin(&RenameReplacer, &config, &target, "w");
        session.write("new").unwrap();
        session.flush().unwrap();

        assert!(session.staging_path().exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");

        session.finish().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert!(env.leftover_staging().is_empty());
    }

    #[test]
    fn test_discard_leaves_target_untouched() {
        let env = TestDir::new();
        let target = env.path("a.txt");
        fs::write(&target, "old").unwrap();
        let before = fs::metadata(&target).unwrap().modified().unwrap();

        let config = WriterConfig::default();
        let mut session = begin(&RenameReplacer, &config, &target, "w");
        session.write("new").unwrap();
        session.discard();
        assert!(session.is_discarded());
        session.finish().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert_eq!(fs::metadata(&target).unwrap().modified().unwrap(), before);
        assert!(env.leftover_staging().is_empty());
    }

    #[test]
    fn test_drop_without_finish_discards() {
        let env = TestDir::new();
        let target = env.path("a.txt");

        let config = WriterConfig::default();
        {
            let mut session = begin(&RenameReplacer, &config, &target, "w");
            session.write("never installed").unwrap();
        }

        assert!(!target.exists());
        assert!(env.leftover_staging().is_empty());
    }

    #[test]
    fn test_keep_staging_on_failure() {
        let env = TestDir::new();
        let target = env.path("a.txt");

        let config = WriterConfig::default().with_keep_staging_on_failure(true);
        let staging = {
            let mut session = begin(&RenameReplacer, &config, &target, "w");
            session.write("partial").unwrap();
            session.staging_path().to_path_buf()
        };

        assert!(!target.exists());
        assert_eq!(fs::read_to_string(&staging).unwrap(), "partial");
    }

    #[test]
    fn test_explicit_discard_removes_staging_even_when_keeping() {
        let env = TestDir::new();
        let target = env.path("a.txt");

        let config = WriterConfig::default().with_keep_staging_on_failure(true);
        {
            let mut session = begin(&RenameReplacer, &config, &target, "w");
            session.discard();
        }

        assert!(env.leftover_staging().is_empty());
    }

    #[test]
    fn test_text_session_rejects_invalid_utf8() {
        let env = TestDir::new();
        let target = env.path("a.txt");

        let config = WriterConfig::default();
        let mut session = begin(&RenameReplacer, &config, &target, "w");
        let err = session.write(&[0xffu8, 0xfe][..]).unwrap_err();
        assert!(matches!(err, FatomicError::Write { .. }));
        assert_eq!(
            err.io_error().map(|e| e.kind()),
            Some(io::ErrorKind::InvalidData)
        );
    }

    #[test]
    fn test_write_bytes_checks_utf8_in_text_sessions() {
        let env = TestDir::new();
        let target = env.path("a.txt");

        let config = WriterConfig::default();
        let mut session = begin(&RenameReplacer, &config, &target, "w");
        session.write_bytes("héllo".as_bytes()).unwrap();
        let err = session.write_bytes(&[b'o', 0xc3]).unwrap_err();
        assert_eq!(err.phase(), crate::error::Phase::Write);
        session.write_bytes(b"\n").unwrap();
        session.finish().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "héllo\n");
    }

    #[test]
    fn test_write_bytes_in_binary_session() {
        let env = TestDir::new();
        let target = env.path("a.bin");

        let config = WriterConfig::default();
        let mut session = begin(&RenameReplacer, &config, &target, "wb");
        session.write_bytes(&[0xc3, 0x28]).unwrap();
        session.finish().unwrap();

        assert_eq!(fs::read(&target).unwrap(), vec![0xc3, 0x28]);
    }

    #[test]
    fn test_write_char_content() {
        let env = TestDir::new();
        let target = env.path("a.txt");

        let config = WriterConfig::default();
        let mut session = begin(&RenameReplacer, &config, &target, "w");
        session.write(&'€').unwrap();
        session.write(&'\n').unwrap();
        session.finish().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "€\n");
    }

    #[test]
    fn test_binary_session_accepts_any_bytes() {
        let env = TestDir::new();
        let target = env.path("a.bin");

        let config = WriterConfig::default();
        let mut session = begin(&RenameReplacer, &config, &target, "wb");
        session.write(&[0xffu8, 0x00, 0xfe][..]).unwrap();
        session.finish().unwrap();

        assert_eq!(fs::read(&target).unwrap(), vec![0xff, 0x00, 0xfe]);
    }

    #[test]
    fn test_append_seeds_existing_content() {
        let env = TestDir::new();
        let target = env.path("a.txt");
        fs::write(&target, "Hello, ").unwrap();

        let config = WriterConfig::default();
        let mut session = begin(&RenameReplacer, &config, &target, "a");
        session.write("world\n").unwrap();
        session.finish().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "Hello, world\n");
    }

    #[test]
    fn test_text_append_rejects_binary_target() {
        let env = TestDir::new();
        let target = env.path("a.txt");
        fs::write(&target, [0xffu8, 0xfe]).unwrap();

        let config = WriterConfig::default();
        let mode = WriteMode::new(OpenMode::Append, ContentKind::Text);
        let err = WriteSession::begin(&RenameReplacer, &config, &target, mode)
            .err()
            .unwrap();
        assert!(matches!(err, FatomicError::Seed { .. }));
        assert!(env.leftover_staging().is_empty());
    }

    #[test]
    fn test_seed_from_directory_fails() {
        let env = TestDir::new();
        let target = env.path("subdir");
        fs::create_dir(&target).unwrap();

        let config = WriterConfig::default();
        let mode = WriteMode::append(ContentKind::Binary);
        let err = WriteSession::begin(&RenameReplacer, &config, &target, mode)
            .err()
            .unwrap();
        assert!(matches!(err, FatomicError::Seed { .. }));
        assert!(env.leftover_staging().is_empty());
    }

    #[test]
    fn test_commit_failure_keeps_target_and_cleans_up() {
        let env = TestDir::new();
        let target = env.path("a.txt");
        fs::write(&target, "old").unwrap();

        let config = WriterConfig::default();
        let replacer = FailingReplacer::new(io::ErrorKind::PermissionDenied);
        let mode = WriteMode::write(ContentKind::Text);
        let mut session = WriteSession::begin(&replacer, &config, &target, mode).unwrap();
        session.write("new").unwrap();

        let err = session.finish().unwrap_err();
        assert!(matches!(err, FatomicError::Commit { .. }));
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert!(env.leftover_staging().is_empty());
    }

    #[test]
    fn test_io_write_composes_with_write_macro() {
        let env = TestDir::new();
        let target = env.path("a.txt");

        let config = WriterConfig::default();
        let mut session = begin(&RenameReplacer, &config, &target, "w");
        writeln!(session, "line {}", 1).unwrap();
        writeln!(session, "line {}", 2).unwrap();
        session.finish().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "line 1\nline 2\n");
    }
}
