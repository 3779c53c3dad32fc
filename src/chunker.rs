//! Byte-oriented file chunking.
//!
//! Splits a byte stream into fixed-size chunks tagged with their position.
//! Chunking is purely byte-oriented: a chunk boundary may fall inside a
//! multi-byte character, and concatenating all chunks in order reproduces
//! the input exactly.

use std::borrow::Cow;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A slice of the input file, tagged with its position index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the original file, assigned at chunking time.
    pub index: usize,
    /// Raw bytes of the chunk.
    pub data: Vec<u8>,
}

impl Chunk {
    /// Lossy UTF-8 view of the chunk, used when building prompts and when
    /// falling back to the original text.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Chunk length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Lazy chunk reader over any byte stream.
///
/// Produces chunks of exactly `chunk_size` bytes except possibly the last.
/// Non-restartable: once the underlying reader hits EOF the chunker is
/// exhausted.
#[derive(Debug)]
pub struct Chunker<R> {
    reader: R,
    chunk_size: usize,
    next_index: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin> Chunker<R> {
    /// Create a chunker over `reader` producing chunks of at most
    /// `chunk_size` bytes.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size,
            next_index: 0,
            eof: false,
        }
    }

    /// Read the next chunk, or `None` once the stream is exhausted.
    ///
    /// Short reads are looped until the chunk is full or EOF, so chunk
    /// geometry does not depend on how the reader fragments its data.
    pub async fn next_chunk(&mut self) -> std::io::Result<Option<Chunk>> {
        if self.eof {
            return Ok(None);
        }

        let mut data = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < self.chunk_size {
            let n = self.reader.read(&mut data[filled..]).await?;
            if n == 0 {
                self.eof = true;
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        data.truncate(filled);
        let chunk = Chunk {
            index: self.next_index,
            data,
        };
        self.next_index += 1;
        Ok(Some(chunk))
    }

    /// Drain the stream into a vector of chunks, invoking `on_chunk` after
    /// each one (progress reporting).
    pub async fn read_all<F: FnMut(&Chunk)>(
        mut self,
        mut on_chunk: F,
    ) -> std::io::Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.next_chunk().await? {
            on_chunk(&chunk);
            chunks.push(chunk);
        }
        Ok(chunks)
    }
}

/// Number of chunks a stream of `total_bytes` will produce at `chunk_size`.
pub fn chunk_count(total_bytes: u64, chunk_size: usize) -> u64 {
    let size = chunk_size.max(1) as u64;
    total_bytes.div_ceil(size)
}
