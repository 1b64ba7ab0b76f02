//! Fixed-size overlapping window chunking.
//!
//! Each page is cut into windows of at most `chunk_size` characters. A window
//! prefers to end just after whitespace so words stay whole; the next window
//! starts exactly `chunk_overlap` characters before the previous one ended.

use super::{Chunk, ChunkingConfig};
use crate::documents::Page;

/// Character-window chunker.
#[derive(Debug, Clone, Default)]
pub struct WindowChunker {
    config: ChunkingConfig,
}

impl WindowChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk pages in order. Blank pages produce nothing.
    pub fn chunk_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages {
            if page.text.trim().is_empty() {
                continue;
            }
            for (offset, text) in self.split_text(&page.text) {
                chunks.push(Chunk {
                    text,
                    source: page.source.clone(),
                    page: page.number,
                    offset,
                    order: chunks.len(),
                });
            }
        }

        chunks
    }

    /// Split text into `(char_offset, window)` pairs.
    pub fn split_text(&self, text: &str) -> Vec<(usize, String)> {
        let chars: Vec<char> = text.chars().collect();
        let size = self.config.effective_size();
        let overlap = self.config.effective_overlap();

        let mut windows = Vec::new();
        if chars.is_empty() {
            return windows;
        }

        let mut start = 0;
        loop {
            let hard_end = (start + size).min(chars.len());
            let end = if hard_end == chars.len() {
                hard_end
            } else {
                soft_end(&chars, start + overlap + 1, hard_end)
            };

            windows.push((start, chars[start..end].iter().collect()));

            if end == chars.len() {
                break;
            }
            start = end - overlap;
        }

        windows
    }
}

/// Latest end in `min_end..=hard_end` that falls just after whitespace, else `hard_end`.
fn soft_end(chars: &[char], min_end: usize, hard_end: usize) -> usize {
    (min_end..=hard_end)
        .rev()
        .find(|&end| chars[end - 1].is_whitespace())
        .unwrap_or(hard_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(windows: &[(usize, String)], overlap: usize) -> String {
        let mut text = String::new();
        for (i, (_, window)) in windows.iter().enumerate() {
            if i == 0 {
                text.push_str(window);
            } else {
                text.extend(window.chars().skip(overlap));
            }
        }
        text
    }

    fn sample_text() -> String {
        let sentence = "To reset your password open the login page and choose Forgot password. ";
        sentence.repeat(40)
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = WindowChunker::default();
        let windows = chunker.split_text("How do I update my billing address?");
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].0, 0);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = WindowChunker::default();
        assert!(chunker.split_text("").is_empty());
        assert!(chunker.chunk_pages(&[]).is_empty());
        assert!(chunker
            .chunk_pages(&[Page::new("blank.pdf", 1, "  \n\t ")])
            .is_empty());
    }

    #[test]
    fn test_windows_respect_size_and_overlap() {
        let config = ChunkingConfig::new(750, 100);
        let chunker = WindowChunker::new(config);
        let text = sample_text();
        let windows = chunker.split_text(&text);

        assert!(windows.len() > 1);
        for pair in windows.windows(2) {
            let (start_a, a) = &pair[0];
            let (start_b, _) = &pair[1];
            let end_a = start_a + a.chars().count();
            assert_eq!(end_a - start_b, 100, "consecutive chunks share exactly the overlap");
        }
        for (_, window) in &windows {
            let len = window.chars().count();
            assert!(len > 0 && len <= 750);
        }
    }

    #[test]
    fn test_reconstruction_across_sizes() {
        let text = sample_text();
        let sizes_and_overlaps = [(750, 100), (200, 0), (50, 10), (101, 100), (17, 3), (1, 0), (30, 30)];

        for (size, overlap) in sizes_and_overlaps {
            let config = ChunkingConfig::new(size, overlap);
            let chunker = WindowChunker::new(config);
            let windows = chunker.split_text(&text);

            assert!(windows.iter().all(|(_, w)| !w.is_empty()), "size {size} overlap {overlap}");
            assert_eq!(
                reconstruct(&windows, config.effective_overlap()),
                text,
                "size {size} overlap {overlap}"
            );
        }
    }

    #[test]
    fn test_prefers_whitespace_boundaries() {
        let chunker = WindowChunker::new(ChunkingConfig::new(20, 5));
        let windows = chunker.split_text("alpha beta gamma delta epsilon zeta eta theta");
        // Every window but the last ends after a space.
        for (_, window) in &windows[..windows.len() - 1] {
            assert!(window.ends_with(' '), "window {:?}", window);
        }
    }

    #[test]
    fn test_hard_cut_without_whitespace() {
        let chunker = WindowChunker::new(ChunkingConfig::new(10, 2));
        let text = "x".repeat(25);
        let windows = chunker.split_text(&text);
        assert_eq!(windows[0].1.len(), 10);
        assert_eq!(windows[1].0, 8);
        assert_eq!(reconstruct(&windows, 2), text);
    }

    #[test]
    fn test_multibyte_text() {
        let chunker = WindowChunker::new(ChunkingConfig::new(8, 2));
        let text = "Passwort zurücksetzen über Einstellungen – Konto ✓";
        let windows = chunker.split_text(text);
        assert_eq!(reconstruct(&windows, 2), text);
    }

    #[test]
    fn test_chunk_pages_keeps_source_order() {
        let chunker = WindowChunker::new(ChunkingConfig::new(40, 5));
        let pages = vec![
            Page::new("kb.pdf", 1, sample_text()),
            Page::new("kb.pdf", 2, "Short second page."),
            Page::new("faq.md", 1, "Refunds take five business days."),
        ];

        let chunks = chunker.chunk_pages(&pages);
        assert!(chunks.len() > 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i);
        }
        let last = chunks.last().unwrap();
        assert_eq!(last.source, "faq.md");
        assert_eq!(last.offset, 0);
        let second_page: Vec<_> = chunks.iter().filter(|c| c.page == 2).collect();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].text, "Short second page.");
    }
}
