//! # fatomic
//!
//! Atomic file replacement. New content is written to a staging file next to
//! the target and then renamed over it, so a reader of the target sees either
//! the complete old content or the complete new content, never a mix, even if
//! the writer crashes halfway.
//!
//! ## Layout
//!
//! - [`writer::AtomicWriter`]: opens sessions, owns config and replacer, and
//!   carries the `write_*` / `append_*` / `transform*` helpers.
//! - [`session::WriteSession`]: one staging file bound to one target.
//! - [`replace::Replacer`]: the atomic replace primitive, injected once.
//! - [`mode`]: explicit [`ContentKind`] and [`WriteMode`], plus inference.
//! - [`read`]: line and chunk readers used by transforms.
//! - [`helpers`]: free functions over a default writer.
//!
//! ## Guarantees
//!
//! - After a session ends, the target holds either the complete new content
//!   or exactly what it held before.
//! - Discarded and abandoned sessions leave no staging file behind.
//! - Concurrent sessions on one target never share a staging file, but the
//!   last one to commit wins. Serialize writers externally if that matters.
//! - Nothing is synced to the storage device; durability across power loss
//!   is not provided.
//!
//! ## Example
//!
//! ```no_run
//! use fatomic::{AtomicWriter, ContentKind, WriteMode};
//!
//! # fn main() -> fatomic::Result<()> {
//! fatomic::write_all("greeting.txt", "Hello, ", None)?;
//! fatomic::append_all("greeting.txt", "world\n", None)?;
//! fatomic::transform("greeting.txt", |line: String| line.replace("Hello", "Hi"))?;
//!
//! let writer = AtomicWriter::new();
//! writer.session("report.txt", WriteMode::write(ContentKind::Text), |session| {
//!     session.write("partial")?;
//!     session.discard();
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod helpers;
pub mod mode;
pub mod read;
pub mod replace;
pub mod session;
mod staging;
pub mod writer;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use config::WriterConfig;
pub use error::{FatomicError, Phase, Result};
pub use helpers::{
    append_all, append_chunks, append_lines, transform, transform_all, transform_chunks,
    with_session, write_all, write_chunks, write_lines,
};
pub use mode::{Content, ContentKind, OpenMode, WriteMode};
pub use read::{Chunks, Lines, Piece};
pub use replace::{RenameReplacer, Replacer};
pub use session::WriteSession;
pub use writer::AtomicWriter;
