//! Code analysis ports used during REFINE
//!
//! Both are optional collaborators. Their failures never abort a phase.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AnalysisError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Analysis failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait CodeAnalyzerPort: Send + Sync {
    async fn analyze_code(&self, code: &str) -> Result<Value, AnalysisError>;
}

#[async_trait]
pub trait AstTransformerPort: Send + Sync {
    /// Apply the named transformations and return the rewritten code
    async fn transform_code(
        &self,
        code: &str,
        transformations: &[String],
    ) -> Result<String, AnalysisError>;
}

/// Analyzer that reports only line and character counts
pub struct NoCodeAnalyzer;

#[async_trait]
impl CodeAnalyzerPort for NoCodeAnalyzer {
    async fn analyze_code(&self, code: &str) -> Result<Value, AnalysisError> {
        Ok(serde_json::json!({
            "analyzer": "none",
            "lines": code.lines().count(),
            "characters": code.chars().count(),
        }))
    }
}

#[async_trait]
impl AstTransformerPort for NoCodeAnalyzer {
    async fn transform_code(
        &self,
        code: &str,
        _transformations: &[String],
    ) -> Result<String, AnalysisError> {
        Ok(code.to_string())
    }
}
