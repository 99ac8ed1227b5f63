use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for partitioning behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in tokens
    pub token_budget: usize,

    /// Tokens repeated between consecutive raw-text chunks
    pub overlap_tokens: usize,

    /// Characters of code kept when rendering a node (0 = unbounded)
    pub code_max_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            token_budget: 8000,
            overlap_tokens: 50,
            code_max_chars: 400,
        }
    }
}

impl ChunkerConfig {
    /// Default settings with a different budget
    pub fn with_budget(token_budget: usize) -> Self {
        Self {
            token_budget,
            ..Default::default()
        }
    }

    /// Budget for analyzers with a ~32k context window
    pub fn for_large_context() -> Self {
        Self::with_budget(30_000)
    }

    /// Budget for analyzers with a small context window
    pub fn for_small_context() -> Self {
        Self::with_budget(6_000)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.token_budget == 0 {
            return Err(ChunkerError::invalid_config("token_budget must be > 0"));
        }

        if self.overlap_tokens >= self.token_budget {
            return Err(ChunkerError::invalid_config(format!(
                "overlap_tokens ({}) must be smaller than token_budget ({})",
                self.overlap_tokens, self.token_budget
            )));
        }

        Ok(())
    }
}
