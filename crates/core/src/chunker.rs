use crate::error::ChunkError;
use crate::extractor::PageText;
use crate::models::ChunkMeta;

pub const DEFAULT_TARGET_CHARS: usize = 500;
pub const DEFAULT_OVERLAP_CHARS: usize = 100;
pub const DEFAULT_MIN_CHARS: usize = 50;

// Window sizing when the character-per-word estimate degenerates to zero.
const FALLBACK_WORDS_PER_CHUNK: usize = 100;
const FALLBACK_OVERLAP_WORDS: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Approximate character budget per chunk.
    pub target_chars: usize,
    /// Approximate character overlap between consecutive chunks.
    pub overlap_chars: usize,
    /// Chunks at or below this trimmed length are dropped.
    pub min_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_chars: DEFAULT_TARGET_CHARS,
            overlap_chars: DEFAULT_OVERLAP_CHARS,
            min_chars: DEFAULT_MIN_CHARS,
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.target_chars == 0 {
            return Err(ChunkError::InvalidConfig(
                "target_chars must be positive".to_string(),
            ));
        }

        if self.overlap_chars >= self.target_chars {
            return Err(ChunkError::InvalidConfig(format!(
                "overlap_chars {} must be smaller than target_chars {}",
                self.overlap_chars, self.target_chars
            )));
        }

        Ok(())
    }
}

/// Splits each page's text into overlapping word windows sized to approximate
/// `target_chars`, tagging every kept chunk with its source page. Pages are
/// chunked independently and concatenated in page order; the two returned
/// sequences are positionally aligned.
pub fn chunk_pages(
    pages: &[PageText],
    config: ChunkerConfig,
) -> Result<(Vec<String>, Vec<ChunkMeta>), ChunkError> {
    config.validate()?;

    let mut chunks = Vec::new();
    let mut metadata = Vec::new();

    for page in pages {
        chunk_page(page, config, &mut chunks, &mut metadata);
    }

    Ok((chunks, metadata))
}

fn chunk_page(
    page: &PageText,
    config: ChunkerConfig,
    chunks: &mut Vec<String>,
    metadata: &mut Vec<ChunkMeta>,
) {
    let words: Vec<&str> = page.text.split_whitespace().collect();
    if words.is_empty() {
        return;
    }

    let chars_per_word = page.text.chars().count() as f64 / words.len() as f64;
    let (words_per_chunk, overlap_words) = if chars_per_word > 0.0 {
        (
            ((config.target_chars as f64 / chars_per_word) as usize).max(1),
            (config.overlap_chars as f64 / chars_per_word) as usize,
        )
    } else {
        (FALLBACK_WORDS_PER_CHUNK, FALLBACK_OVERLAP_WORDS)
    };

    // A stride below 1 would never advance the window.
    let stride = words_per_chunk.saturating_sub(overlap_words).max(1);

    let mut start = 0;
    while start < words.len() {
        let end = (start + words_per_chunk).min(words.len());
        let text = words[start..end].join(" ");

        if text.trim().chars().count() > config.min_chars {
            chunks.push(text);
            metadata.push(ChunkMeta::for_page(page.number));
        }

        start += stride;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, text: &str) -> PageText {
        PageText {
            number,
            text: text.to_string(),
        }
    }

    fn prose(chars: usize) -> String {
        let mut text = String::new();
        while text.chars().count() < chars {
            text.push_str("the quick brown fox jumps over the lazy dog again ");
        }
        text.truncate(chars);
        text
    }

    #[test]
    fn empty_page_yields_no_chunks() {
        let (chunks, metadata) =
            chunk_pages(&[page(1, "")], ChunkerConfig::default()).expect("chunking should succeed");
        assert!(chunks.is_empty());
        assert!(metadata.is_empty());
    }

    #[test]
    fn short_page_is_dropped_entirely() {
        // 36 characters, well below the 50-char minimum.
        let (chunks, _) = chunk_pages(
            &[page(1, "Paris est la capitale de la France.")],
            ChunkerConfig::default(),
        )
        .expect("chunking should succeed");
        assert!(chunks.is_empty());
    }

    #[test]
    fn every_kept_chunk_exceeds_minimum_length() {
        let (chunks, _) = chunk_pages(&[page(1, &prose(2000))], ChunkerConfig::default())
            .expect("chunking should succeed");
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.trim().chars().count() > DEFAULT_MIN_CHARS);
        }
    }

    #[test]
    fn pages_are_chunked_independently_in_page_order() {
        let pages = vec![page(1, &prose(2000)), page(2, ""), page(3, &prose(1500))];
        let (chunks, metadata) =
            chunk_pages(&pages, ChunkerConfig::default()).expect("chunking should succeed");

        assert_eq!(chunks.len(), metadata.len());
        assert!(!chunks.is_empty());

        let page_numbers: Vec<u32> = metadata.iter().filter_map(|meta| meta.page).collect();
        assert!(page_numbers.iter().all(|number| *number == 1 || *number == 3));
        assert!(page_numbers.contains(&1));
        assert!(page_numbers.contains(&3));

        // Page 1 chunks come before page 3 chunks.
        let first_page_3 = page_numbers
            .iter()
            .position(|number| *number == 3)
            .expect("page 3 should contribute chunks");
        assert!(page_numbers[..first_page_3]
            .iter()
            .all(|number| *number == 1));
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let (chunks, _) = chunk_pages(&[page(1, &prose(2000))], ChunkerConfig::default())
            .expect("chunking should succeed");
        assert!(chunks.len() >= 2);

        let tail_words: Vec<&str> = chunks[0].split_whitespace().rev().take(3).collect();
        for word in tail_words {
            assert!(chunks[1].split_whitespace().any(|candidate| candidate == word));
        }
    }

    #[test]
    fn single_overlong_word_still_yields_a_chunk() {
        let word = "x".repeat(600);
        let (chunks, metadata) = chunk_pages(
            &[page(4, &word)],
            ChunkerConfig::default(),
        )
        .expect("chunking should succeed");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], word);
        assert_eq!(metadata[0], ChunkMeta::for_page(4));
    }

    #[test]
    fn long_words_never_hang_the_window() {
        // 300-char words push both the window and the overlap to one word,
        // so the raw stride is zero; the clamp must keep the window advancing.
        let config = ChunkerConfig {
            target_chars: 500,
            overlap_chars: 400,
            min_chars: 50,
        };
        let text = (0..10).map(|_| "y".repeat(300)).collect::<Vec<_>>().join(" ");
        let (chunks, _) =
            chunk_pages(&[page(1, &text)], config).expect("chunking should succeed");
        assert_eq!(chunks.len(), 10);
    }

    #[test]
    fn overlap_at_or_above_target_is_rejected() {
        let config = ChunkerConfig {
            target_chars: 100,
            overlap_chars: 100,
            min_chars: 50,
        };
        assert!(matches!(
            chunk_pages(&[page(1, "text")], config),
            Err(ChunkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_target_is_rejected() {
        let config = ChunkerConfig {
            target_chars: 0,
            overlap_chars: 0,
            min_chars: 50,
        };
        assert!(chunk_pages(&[], config).is_err());
    }
}
