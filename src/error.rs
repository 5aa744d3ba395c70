//! Error types for the dry-run deployer

use thiserror::Error;

/// Main error type for the deployer
#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("Chain connection error for {url}: {message}")]
    ChainConnection { url: String, message: String },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Chain state query {query} failed: {message}")]
    ChainState { query: &'static str, message: String },

    #[error("Chain ID mismatch: configured {expected}, node reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Cancelled by operator")]
    Cancelled,
}

impl DeployerError {
    /// Check if the error was caused by operator input rather than the node
    pub fn is_operator_error(&self) -> bool {
        matches!(
            self,
            DeployerError::ChainConnection { .. }
                | DeployerError::Wallet(_)
                | DeployerError::Contract(_)
                | DeployerError::ChainMismatch { .. }
        )
    }
}

/// Result type for deployer operations
pub type DeployerResult<T> = Result<T, DeployerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_errors() {
        assert!(DeployerError::Wallet("bad hex".into()).is_operator_error());
        assert!(DeployerError::ChainConnection {
            url: "not a url".into(),
            message: "relative URL without a base".into()
        }
        .is_operator_error());
        assert!(DeployerError::ChainMismatch {
            expected: 1,
            actual: 5
        }
        .is_operator_error());
        assert!(!DeployerError::GasEstimation("reverted".into()).is_operator_error());
        assert!(!DeployerError::Timeout {
            operation: "eth_gasPrice".into()
        }
        .is_operator_error());
    }

    #[test]
    fn test_chain_state_message() {
        let err = DeployerError::ChainState {
            query: "eth_chainId",
            message: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "Chain state query eth_chainId failed: connection refused"
        );
    }
}
