use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::token::{HeuristicTokenCounter, TokenCounter};

/// Main partitioner interface. Raw-text mode lives in `text_splitter`,
/// node-list mode in `node_packer`.
pub struct Chunker<T: TokenCounter = HeuristicTokenCounter> {
    pub(crate) config: ChunkerConfig,
    pub(crate) counter: T,
}

impl Chunker {
    /// Create a chunker that estimates tokens from byte length
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        Self::with_counter(config, HeuristicTokenCounter)
    }
}

impl<T: TokenCounter> Chunker<T> {
    /// Create a chunker with a caller-supplied token counter
    pub fn with_counter(config: ChunkerConfig, counter: T) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, counter })
    }

    /// Get configuration
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub(crate) fn tokens(&self, text: &str) -> usize {
        self.counter.count(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let config = ChunkerConfig {
            token_budget: 10,
            overlap_tokens: 10,
            ..Default::default()
        };
        assert!(Chunker::new(config).is_err());
    }

    #[test]
    fn uses_custom_counter() {
        let chunker =
            Chunker::with_counter(ChunkerConfig::with_budget(100), |t: &str| t.len()).unwrap();
        assert_eq!(chunker.tokens("abc"), 3);
    }
}
