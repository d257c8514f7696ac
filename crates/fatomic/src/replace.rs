use std::fs;
use std::io;
use std::path::Path;

/// Abstract interface for the atomic replace primitive.
///
/// `replace` must install `src` at `dst` as one indivisible filesystem
/// operation, whether or not `dst` exists. On failure `dst` must be left as
/// it was. `src` and `dst` are always in the same directory.
pub trait Replacer {
    fn replace(&self, src: &Path, dst: &Path) -> io::Result<()>;
}

/// Rename-based replace.
///
/// `std::fs::rename` overwrites atomically on POSIX and uses
/// `MoveFileExW(MOVEFILE_REPLACE_EXISTING)` on Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameReplacer;

impl Replacer for RenameReplacer {
    fn replace(&self, src: &Path, dst: &Path) -> io::Result<()> {
        fs::rename(src, dst)
    }
}

impl<R: Replacer + ?Sized> Replacer for &R {
    fn replace(&self, src: &Path, dst: &Path) -> io::Result<()> {
        (**self).replace(src, dst)
    }
}

impl<R: Replacer + ?Sized> Replacer for Box<R> {
    fn replace(&self, src: &Path, dst: &Path) -> io::Result<()> {
        (**self).replace(src, dst)
    }
}
