//! Token-bounded text chunking with declared overlap
//!
//! Chunks are byte-contiguous slices of the trimmed source text, so their
//! union (ignoring declared overlap) reconstructs the source without gaps.
//! Chunking is a pure function of its inputs: recomputing yields an
//! identical sequence.

use crate::error::ExtractorError;
use crate::token::TokenEstimator;

/// An ordered span of the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the chunk sequence
    pub index: usize,
    /// The chunk text
    pub text: String,
    /// Estimated token count of `text`
    pub token_count: usize,
    /// Byte offset of `text` within the trimmed source
    pub start_offset: usize,
    /// Estimated tokens shared with the previous chunk (0 for the first)
    pub overlap_with_previous: usize,
}

/// Splits text into overlapping, token-bounded segments
pub struct Chunker {
    estimator: TokenEstimator,
}

impl Chunker {
    /// Create a chunker over the given estimator
    pub fn new(estimator: TokenEstimator) -> Self {
        Self { estimator }
    }

    /// Validate chunk sizing parameters
    pub fn validate_params(target_tokens: usize, overlap_tokens: usize) -> Result<(), ExtractorError> {
        if target_tokens == 0 {
            return Err(ExtractorError::InvalidConfiguration(
                "target chunk size must be greater than 0 tokens".to_string(),
            ));
        }
        if overlap_tokens >= target_tokens {
            return Err(ExtractorError::InvalidConfiguration(format!(
                "overlap ({} tokens) must be smaller than the target chunk size ({} tokens)",
                overlap_tokens, target_tokens
            )));
        }
        Ok(())
    }

    /// Split `text` into chunks of at most `target_tokens` estimated tokens,
    /// each beginning `overlap_tokens` worth of text before the previous
    /// chunk's end
    ///
    /// Empty input yields an empty sequence. Input that already fits the
    /// budget yields a single trimmed chunk. The final chunk may be shorter
    /// than the target; a single word larger than the budget becomes its own
    /// over-budget chunk rather than looping.
    pub fn chunk(
        &self,
        text: &str,
        target_tokens: usize,
        overlap_tokens: usize,
        model_id: &str,
    ) -> Result<Vec<Chunk>, ExtractorError> {
        Self::validate_params(target_tokens, overlap_tokens)?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let total = self.estimator.estimate(text, model_id);
        if total <= target_tokens {
            return Ok(vec![Chunk {
                index: 0,
                text: text.to_string(),
                token_count: total,
                start_offset: 0,
                overlap_with_previous: 0,
            }]);
        }

        let words = word_spans(text);
        let mut chunks = Vec::new();
        let mut next_new = 0; // first word index not yet covered
        let mut start_byte = 0;
        let mut prev_end_byte = 0;

        loop {
            // Grow one word at a time while the slice fits the budget
            let mut end = next_new;
            while end + 1 < words.len() {
                let candidate = &text[start_byte..words[end + 1].1];
                if self.estimator.estimate(candidate, model_id) > target_tokens {
                    break;
                }
                end += 1;
            }

            let end_byte = words[end].1;
            let chunk_text = &text[start_byte..end_byte];
            let overlap = if start_byte < prev_end_byte {
                self.estimator
                    .estimate(&text[start_byte..prev_end_byte], model_id)
            } else {
                0
            };
            chunks.push(Chunk {
                index: chunks.len(),
                text: chunk_text.to_string(),
                token_count: self.estimator.estimate(chunk_text, model_id),
                start_offset: start_byte,
                overlap_with_previous: overlap,
            });

            if end + 1 >= words.len() {
                break;
            }
            next_new = end + 1;

            // Walk back from the chunk end to find where the overlap begins
            let mut overlap_start = next_new;
            while overlap_start > 0 {
                let candidate = &text[words[overlap_start - 1].0..end_byte];
                if self.estimator.estimate(candidate, model_id) > overlap_tokens {
                    break;
                }
                overlap_start -= 1;
            }

            prev_end_byte = end_byte;
            // No overlap words: start at the previous chunk's end so the
            // separating whitespace is not lost
            start_byte = if overlap_start < next_new {
                words[overlap_start].0
            } else {
                prev_end_byte
            };
        }

        Ok(chunks)
    }
}

/// Byte spans (start, end) of whitespace-delimited words
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}
