//! # Reading the Original File
//!
//! Transforms read the current target through [`Lines`] or [`Chunks`]. Both
//! are finite and cannot be restarted: once the input is exhausted, or a read
//! fails, they yield nothing more.
//!
//! The [`Piece`] type decides the kind. `String` pieces are text and must be
//! UTF-8. `Vec<u8>` pieces are raw bytes. Lines keep their `\n` terminator,
//! so writing every line back unchanged reproduces the file exactly.

use crate::mode::{Content, ContentKind};
use std::io::{self, BufRead, Read};
use std::marker::PhantomData;

/// A unit read from the original file: a line, a chunk, or the whole file.
pub trait Piece: Content + Sized {
    const KIND: ContentKind;

    fn read_line<B: BufRead>(reader: &mut B) -> io::Result<Option<Self>>;

    /// Read up to `size` units (characters or bytes). `None` at end of input.
    fn read_chunk<B: BufRead>(reader: &mut B, size: usize) -> io::Result<Option<Self>>;

    fn read_all<R: Read>(reader: &mut R) -> io::Result<Self>;
}

impl Piece for String {
    const KIND: ContentKind = ContentKind::Text;

    fn read_line<B: BufRead>(reader: &mut B) -> io::Result<Option<Self>> {
        let mut line = String::new();
        match reader.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }

    fn read_chunk<B: BufRead>(reader: &mut B, size: usize) -> io::Result<Option<Self>> {
        let mut buf = Vec::new();
        let mut chars = 0;
        let mut full = false;

        while !full {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                break;
            }
            let mut used = 0;
            for &byte in available {
                // Continuation bytes belong to the character already counted.
                if byte & 0xC0 != 0x80 {
                    if chars == size {
                        full = true;
                        break;
                    }
                    chars += 1;
                }
                used += 1;
            }
            buf.extend_from_slice(&available[..used]);
            reader.consume(used);
        }

        if buf.is_empty() {
            return Ok(None);
        }
        String::from_utf8(buf)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn read_all<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(text)
    }
}

impl Piece for Vec<u8> {
    const KIND: ContentKind = ContentKind::Binary;

    fn read_line<B: BufRead>(reader: &mut B) -> io::Result<Option<Self>> {
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }

    fn read_chunk<B: BufRead>(reader: &mut B, size: usize) -> io::Result<Option<Self>> {
        let mut buf = Vec::with_capacity(size);
        reader.by_ref().take(size as u64).read_to_end(&mut buf)?;
        if buf.is_empty() {
            Ok(None)
        } else {
            Ok(Some(buf))
        }
    }

    fn read_all<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// Iterator over the lines of a reader.
pub struct Lines<B, P> {
    reader: B,
    done: bool,
    _piece: PhantomData<P>,
}

impl<B: BufRead, P: Piece> Lines<B, P> {
    pub fn new(reader: B) -> Self {
        Self {
            reader,
            done: false,
            _piece: PhantomData,
        }
    }
}

impl<B: BufRead, P: Piece> Iterator for Lines<B, P> {
    type Item = io::Result<P>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = P::read_line(&mut self.reader).transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

/// Iterator over fixed-size chunks of a reader. The last chunk may be short.
pub struct Chunks<B, P> {
    reader: B,
    size: usize,
    done: bool,
    _piece: PhantomData<P>,
}

impl<B: BufRead, P: Piece> Chunks<B, P> {
    /// `size` must be non-zero.
    pub fn new(reader: B, size: usize) -> Self {
        Self {
            reader,
            size,
            done: size == 0,
            _piece: PhantomData,
        }
    }
}

impl<B: BufRead, P: Piece> Iterator for Chunks<B, P> {
    type Item = io::Result<P>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = P::read_chunk(&mut self.reader, self.size).transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}
