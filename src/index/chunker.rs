//! Recursive character splitting into overlapping windows.
//!
//! Text is split on the coarsest separator present (paragraph, line, word,
//! then single characters), pieces that still exceed the window size are
//! split again with the next separator, and small pieces are merged back
//! into windows of at most `chunk_size` characters that share up to
//! `chunk_overlap` characters with their predecessor.

use std::collections::VecDeque;

/// Separators tried in order, coarsest first. The empty separator splits
/// into characters.
const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// A window of document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    /// Path of the source document.
    pub source: String,
    /// Window position within its document.
    pub index: usize,
    /// Window text.
    pub text: String,
}

/// Chunking configuration.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Maximum window size in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows.
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Text chunker.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker with config.
    ///
    /// An overlap that is not smaller than the window size is clamped to
    /// `chunk_size - 1`.
    #[must_use]
    pub fn new(config: ChunkerConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            config: ChunkerConfig {
                chunk_size,
                chunk_overlap: config.chunk_overlap.min(chunk_size - 1),
            },
        }
    }

    /// Create a chunker with default config.
    #[must_use]
    pub fn default_chunker() -> Self {
        Self::new(ChunkerConfig::default())
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Split a document into windows tagged with `source`.
    #[must_use]
    pub fn chunk_document(&self, source: &str, text: &str) -> Vec<TextWindow> {
        self.split_text(text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| TextWindow {
                source: source.to_string(),
                index,
                text,
            })
            .collect()
    }

    /// Split text into window strings.
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // Pick the first separator present in the text; "" always matches.
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut windows = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) < self.config.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                windows.extend(self.merge(&pending, separator));
                pending.clear();
            }

            if finer.is_empty() {
                windows.push(piece.to_string());
            } else {
                windows.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            windows.extend(self.merge(&pending, separator));
        }

        windows
    }

    /// Greedily join pieces into windows, carrying an overlapping tail.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let ChunkerConfig {
            chunk_size,
            chunk_overlap,
        } = self.config;

        let mut windows = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joined_len = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { sep_len };

            if total + len + joined_len(&current) > chunk_size && !current.is_empty() {
                push_window(&mut windows, &current, separator);

                // Drop from the front until the tail fits the overlap and
                // leaves room for the next piece.
                while total > chunk_overlap
                    || (total + len + joined_len(&current) > chunk_size && total > 0)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if current.is_empty() { 0 } else { sep_len };
                }
            }

            total += len + joined_len(&current);
            current.push_back(piece);
        }

        push_window(&mut windows, &current, separator);
        windows
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::default_chunker()
    }
}

fn push_window(windows: &mut Vec<String>, pieces: &VecDeque<&str>, separator: &str) {
    let joined = pieces
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        windows.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
