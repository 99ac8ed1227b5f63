//! Raw-text mode: recursive separator splitting with token overlap.
//!
//! Pieces are tracked as byte ranges into the original text, so every chunk
//! knows exactly where it came from even when overlap repeats content.

use crate::chunker::Chunker;
use crate::token::TokenCounter;
use crate::types::Chunk;
use std::collections::VecDeque;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Tried in order; grapheme clusters are the last resort.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

impl<T: TokenCounter> Chunker<T> {
    /// Split one file's text into budget-sized chunks with global line spans
    pub fn chunk_text(&self, file: &str, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let lines = LineIndex::new(text);
        if self.tokens(text) <= self.config.token_budget {
            return vec![Chunk {
                file: file.to_string(),
                section: 1,
                content: text.to_string(),
                start_line: Some(1),
                end_line: Some(lines.line_count()),
                nodes: Vec::new(),
            }];
        }
        let ranges = self.split_range(text, 0..text.len(), 0);

        let mut chunks = Vec::with_capacity(ranges.len());
        for range in ranges {
            let Some(content) = text.get(range.clone()) else {
                continue;
            };
            if content.trim().is_empty() {
                continue;
            }

            let (start, end) = lines.span(text, &range).unwrap_or_else(|| {
                log::warn!("{file}: could not map chunk at byte {} to lines", range.start);
                (1, lines.line_count())
            });

            chunks.push(Chunk {
                file: file.to_string(),
                section: chunks.len() + 1,
                content: content.to_string(),
                start_line: Some(start),
                end_line: Some(end),
                nodes: Vec::new(),
            });
        }

        log::debug!("{file}: {} text chunk(s)", chunks.len());
        chunks
    }

    /// Split several files in order; sections restart at 1 for each file
    pub fn chunk_files<'a, I>(&self, files: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        files
            .into_iter()
            .flat_map(|(file, text)| self.chunk_text(file, text))
            .collect()
    }

    fn split_range(&self, text: &str, range: Range<usize>, level: usize) -> Vec<Range<usize>> {
        let slice = &text[range.clone()];
        let chosen = (level..SEPARATORS.len()).find(|&l| slice.contains(SEPARATORS[l]));
        let pieces = match chosen {
            Some(l) => split_keeping_separator(slice, range.start, SEPARATORS[l]),
            None => graphemes(slice, range.start),
        };

        let mut out = Vec::new();
        let mut fitting: Vec<Range<usize>> = Vec::new();
        for piece in pieces {
            if self.tokens(&text[piece.clone()]) < self.config.token_budget {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                out.extend(self.merge(text, &fitting));
                fitting.clear();
            }
            match chosen {
                Some(l) => out.extend(self.split_range(text, piece, l + 1)),
                // A single grapheme over budget is emitted as-is
                None => out.push(piece),
            }
        }
        if !fitting.is_empty() {
            out.extend(self.merge(text, &fitting));
        }
        out
    }

    /// Greedy merge; the tail of each chunk (up to the overlap) seeds the next.
    /// Every decision counts the joined text, so counters that are not
    /// additive across pieces still keep each chunk within the budget.
    fn merge(&self, text: &str, pieces: &[Range<usize>]) -> Vec<Range<usize>> {
        let budget = self.config.token_budget;
        let overlap = self.config.overlap_tokens;

        let mut out = Vec::new();
        let mut window: VecDeque<&Range<usize>> = VecDeque::new();

        for piece in pieces {
            let Some(start) = window.front().map(|r| r.start) else {
                window.push_back(piece);
                continue;
            };
            if self.tokens(&text[start..piece.end]) <= budget {
                window.push_back(piece);
                continue;
            }

            if let Some(range) = window_range(&window) {
                out.push(range);
            }
            while let Some(range) = window_range(&window) {
                let tail = self.tokens(&text[range.clone()]);
                let with_piece = self.tokens(&text[range.start..piece.end]);
                if tail <= overlap && with_piece <= budget {
                    break;
                }
                window.pop_front();
            }
            window.push_back(piece);
        }
        if let Some(range) = window_range(&window) {
            out.push(range);
        }
        out
    }
}

fn window_range(window: &VecDeque<&Range<usize>>) -> Option<Range<usize>> {
    Some(window.front()?.start..window.back()?.end)
}

/// Split at every occurrence of `sep`, the separator opening the next piece.
fn split_keeping_separator(slice: &str, base: usize, sep: &str) -> Vec<Range<usize>> {
    let mut cuts: Vec<usize> = vec![0];
    cuts.extend(slice.match_indices(sep).map(|(i, _)| i).filter(|&i| i > 0));
    cuts.push(slice.len());

    cuts.windows(2)
        .filter(|w| w[0] < w[1])
        .map(|w| base + w[0]..base + w[1])
        .collect()
}

fn graphemes(slice: &str, base: usize) -> Vec<Range<usize>> {
    slice
        .grapheme_indices(true)
        .map(|(i, g)| base + i..base + i + g.len())
        .collect()
}

/// Byte offset -> 1-based line lookup
struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            starts,
            len: text.len(),
        }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset)
    }

    fn line_count(&self) -> usize {
        // A trailing newline does not open another line
        match self.starts.last() {
            Some(&last) if last == self.len && self.starts.len() > 1 => self.starts.len() - 1,
            _ => self.starts.len(),
        }
    }

    /// Lines of the first visible and the last byte of `range`. A kept
    /// separator at the front belongs to the previous line.
    fn span(&self, text: &str, range: &Range<usize>) -> Option<(usize, usize)> {
        let content = text.get(range.clone())?;
        if content.is_empty() {
            return None;
        }
        let lead = content.len() - content.trim_start().len();
        Some((self.line_of(range.start + lead), self.line_of(range.end - 1)))
    }
}
