//! Token counting seam. The partitioner never tokenizes on its own.

/// Pure `text -> token count` capability
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize,
{
    fn count(&self, text: &str) -> usize {
        self(text)
    }
}

/// Rough estimate: 4 chars per token on average for code
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        (text.len() / 4).max(1)
    }
}

#[cfg(feature = "hf-tokenizer")]
pub use hf::HfTokenCounter;

#[cfg(feature = "hf-tokenizer")]
mod hf {
    use super::{HeuristicTokenCounter, TokenCounter};
    use crate::error::{ChunkerError, Result};
    use std::path::Path;
    use tokenizers::Tokenizer;

    /// Counts tokens with a HuggingFace `tokenizer.json`
    pub struct HfTokenCounter {
        tokenizer: Tokenizer,
    }

    impl HfTokenCounter {
        pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
            let tokenizer = Tokenizer::from_file(path.as_ref())
                .map_err(|e| ChunkerError::tokenizer(format!("{}: {e}", path.as_ref().display())))?;
            Ok(Self { tokenizer })
        }
    }

    impl TokenCounter for HfTokenCounter {
        fn count(&self, text: &str) -> usize {
            match self.tokenizer.encode(text, false) {
                Ok(encoding) => encoding.len(),
                Err(err) => {
                    log::warn!("Tokenizer failed ({err}); using heuristic count");
                    HeuristicTokenCounter.count(text)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_counters() {
        let words = |text: &str| text.split_whitespace().count();
        assert_eq!(words.count("a b  c"), 3);
    }

    #[test]
    fn heuristic_never_returns_zero() {
        assert_eq!(HeuristicTokenCounter.count(""), 1);
        assert_eq!(HeuristicTokenCounter.count("abcdefgh"), 2);
    }
}
