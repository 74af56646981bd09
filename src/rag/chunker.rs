//! Recursive chunk splitter.
//!
//! Splits normalized text on the coarsest separator that yields at least two
//! pieces (paragraph, line, sentence, word, character), greedily packs the pieces
//! back into chunks of at most `chunk_size` characters, and recurses into any piece
//! that is too large on its own. Consecutive chunks from the same packing run share
//! up to `chunk_overlap` trailing characters, cut on piece boundaries.

use std::collections::VecDeque;

use serde_json::Value;

use super::document::{char_len, Chunk, RawDocument, CHUNK_INDEX_KEY, START_OFFSET_KEY};
use crate::core::config::ChunkingConfig;
use crate::core::errors::ChunkError;

/// Split granularities, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    Paragraph,
    Line,
    Sentence,
    Word,
    Character,
}

const SEPARATORS: [Separator; 5] = [
    Separator::Paragraph,
    Separator::Line,
    Separator::Sentence,
    Separator::Word,
    Separator::Character,
];

impl Separator {
    /// Text placed between pieces when they are packed back together.
    fn joiner(self) -> &'static str {
        match self {
            Separator::Paragraph => "\n\n",
            Separator::Line => "\n",
            Separator::Sentence | Separator::Word => " ",
            Separator::Character => "",
        }
    }

    /// Splits `text` into non-empty pieces.
    fn split(self, text: &str) -> Vec<&str> {
        let pieces: Vec<&str> = match self {
            Separator::Paragraph => text.split("\n\n").collect(),
            Separator::Line => text.split('\n').collect(),
            Separator::Sentence => split_sentences(text),
            Separator::Word => text.split(' ').collect(),
            Separator::Character => text
                .char_indices()
                .map(|(idx, ch)| &text[idx..idx + ch.len_utf8()])
                .collect(),
        };
        pieces.into_iter().filter(|piece| !piece.is_empty()).collect()
    }
}

/// Cuts after `.`, `!` or `?` when followed by a space. The punctuation stays with
/// its sentence; the space is the separator.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(space_idx, ' ')) = chars.peek() {
            pieces.push(&text[start..space_idx]);
            start = space_idx + 1;
            chars.next();
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Splits text into bounded, overlapping chunks.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkSplitter {
    /// Fails when `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn new(config: ChunkingConfig) -> Result<Self, ChunkError> {
        if config.chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                overlap: config.chunk_overlap,
                chunk_size: config.chunk_size,
            });
        }
        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        })
    }

    /// Splits one text. Every chunk is at most `chunk_size` characters and
    /// non-blank input always yields at least one chunk.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with_offsets(text)
            .into_iter()
            .map(|(_, content)| content)
            .collect()
    }

    /// Splits every document, tagging each chunk with the document's metadata
    /// plus its `chunk_index` and, when the chunk is a verbatim slice of the
    /// text, its `start_offset` in characters.
    /// Document order and chunk order are preserved.
    pub fn split_documents(&self, documents: &[RawDocument]) -> Vec<Chunk> {
        let mut all_chunks = Vec::new();
        for document in documents {
            let text = document.text.as_str();
            let pieces = self.split_with_offsets(text);

            for (chunk_index, (start, content)) in pieces.into_iter().enumerate() {
                let mut metadata = document.metadata.clone();
                metadata.insert(CHUNK_INDEX_KEY.to_string(), Value::from(chunk_index));
                if text[start..].starts_with(content.as_str()) {
                    metadata.insert(
                        START_OFFSET_KEY.to_string(),
                        Value::from(char_len(&text[..start])),
                    );
                }

                all_chunks.push(Chunk::new(content, metadata));
            }
        }

        tracing::info!(
            "Chunked {} documents into {} chunks (size {}, overlap {})",
            documents.len(),
            all_chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );
        all_chunks
    }

    /// Chunks paired with the byte offset in `text` where each one begins.
    fn split_with_offsets(&self, text: &str) -> Vec<(usize, String)> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if char_len(trimmed) <= self.chunk_size {
            return vec![(byte_offset(text, trimmed), trimmed.to_string())];
        }

        let mut chunks = Vec::new();
        self.split_recursive(text, text, 0, &mut chunks);
        chunks
    }

    fn split_recursive(
        &self,
        base: &str,
        text: &str,
        first_level: usize,
        chunks: &mut Vec<(usize, String)>,
    ) {
        let found = SEPARATORS
            .iter()
            .enumerate()
            .skip(first_level)
            .find_map(|(level, separator)| {
                let pieces = separator.split(text);
                (pieces.len() >= 2).then_some((level, *separator, pieces))
            });

        // Nothing splits further: at most one character is left.
        let Some((level, separator, pieces)) = found else {
            push_chunk(chunks, byte_offset(base, text), text);
            return;
        };

        let joiner = separator.joiner();
        let mut pending: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) <= self.chunk_size {
                pending.push(piece);
                continue;
            }
            self.merge_pieces(base, &pending, joiner, chunks);
            pending.clear();
            self.split_recursive(base, piece, level + 1, chunks);
        }
        self.merge_pieces(base, &pending, joiner, chunks);
    }

    /// Greedily packs pieces into chunks. After each emitted chunk the window keeps
    /// its trailing pieces while they total at most `chunk_overlap` characters.
    fn merge_pieces(
        &self,
        base: &str,
        pieces: &[&str],
        joiner: &str,
        chunks: &mut Vec<(usize, String)>,
    ) {
        let joiner_len = char_len(joiner);
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let gap = if window.is_empty() { 0 } else { joiner_len };

            if total + len + gap > self.chunk_size {
                if let Some(&head) = window.front() {
                    push_chunk(chunks, byte_offset(base, head), &join(&window, joiner));
                }

                // Drop leading pieces until the tail fits the overlap and the next piece fits.
                while let Some(&first) = window.front() {
                    let fits_overlap = total <= self.chunk_overlap;
                    let fits_next = total + len + joiner_len <= self.chunk_size;
                    if fits_overlap && fits_next {
                        break;
                    }
                    window.pop_front();
                    let dropped_gap = if window.is_empty() { 0 } else { joiner_len };
                    total -= char_len(first) + dropped_gap;
                }
            }

            let gap = if window.is_empty() { 0 } else { joiner_len };
            window.push_back(piece);
            total += len + gap;
        }

        if let Some(&head) = window.front() {
            push_chunk(chunks, byte_offset(base, head), &join(&window, joiner));
        }
    }
}

/// Byte position of `part` inside `base`. `part` is always a subslice of `base`.
fn byte_offset(base: &str, part: &str) -> usize {
    part.as_ptr() as usize - base.as_ptr() as usize
}

fn join(window: &VecDeque<&str>, joiner: &str) -> String {
    window
        .iter()
        .copied()
        .collect::<Vec<&str>>()
        .join(joiner)
}

/// Trims `text` and records it, shifting `start` past any leading whitespace.
fn push_chunk(chunks: &mut Vec<(usize, String)>, start: usize, text: &str) {
    let content = text.trim_start();
    let start = start + (text.len() - content.len());
    let content = content.trim_end();
    if !content.is_empty() {
        chunks.push((start, content.to_string()));
    }
}
