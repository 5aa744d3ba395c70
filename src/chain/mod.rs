//! Chain module - node connection and the chain state the deployment depends on
//!
//! This module provides:
//! - The `NodeClient` seam over the JSON-RPC calls the tool is allowed to make
//! - An HTTP-backed `ChainProvider` with per-request deadlines
//! - A one-shot `ChainState` snapshot (nonce, gas price, chain ID)

pub mod provider;

pub use provider::ChainProvider;

use crate::error::{DeployerError, DeployerResult};

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, U256};
use tracing::{debug, info};

/// Read-only view of a node.
///
/// Nothing here can broadcast a transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Next unused nonce for `address`, counting pending transactions
    async fn pending_nonce(&self, address: Address) -> DeployerResult<U256>;

    /// Suggested price per gas unit in wei
    async fn gas_price(&self) -> DeployerResult<U256>;

    /// Network chain identifier
    async fn chain_id(&self) -> DeployerResult<u64>;

    /// Simulate `tx` and return the gas units it would consume
    async fn estimate_gas(&self, tx: &TypedTransaction) -> DeployerResult<U256>;
}

/// Network conditions at the time of the run. Never refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    pub nonce: U256,
    pub gas_price: U256,
    pub chain_id: u64,
}

impl ChainState {
    /// Query nonce, gas price and chain ID, in that order.
    ///
    /// When `expected_chain_id` is set a different node chain ID is an error.
    pub async fn fetch<C: NodeClient + ?Sized>(
        client: &C,
        address: Address,
        expected_chain_id: Option<u64>,
    ) -> DeployerResult<Self> {
        let nonce = client.pending_nonce(address).await?;
        debug!("Pending nonce for {:?}: {}", address, nonce);

        let gas_price = client.gas_price().await?;
        debug!("Suggested gas price: {} wei", gas_price);

        let chain_id = client.chain_id().await?;
        if let Some(expected) = expected_chain_id {
            if expected != chain_id {
                return Err(DeployerError::ChainMismatch {
                    expected,
                    actual: chain_id,
                });
            }
        }

        info!(
            "Chain {} state: nonce {}, gas price {} wei",
            chain_id, nonce, gas_price
        );

        Ok(Self {
            nonce,
            gas_price,
            chain_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn node(nonce: u64, gas_price: u64, chain_id: u64) -> MockNodeClient {
        let mut client = MockNodeClient::new();
        client
            .expect_pending_nonce()
            .returning(move |_| Ok(U256::from(nonce)));
        client
            .expect_gas_price()
            .returning(move || Ok(U256::from(gas_price)));
        client.expect_chain_id().returning(move || Ok(chain_id));
        client
    }

    #[tokio::test]
    async fn test_fetch_snapshot() {
        let address = Address::repeat_byte(0xab);
        let mut client = MockNodeClient::new();
        client
            .expect_pending_nonce()
            .with(eq(address))
            .times(1)
            .returning(|_| Ok(U256::from(3u64)));
        client
            .expect_gas_price()
            .times(1)
            .returning(|| Ok(U256::from(1_000_000_000u64)));
        client.expect_chain_id().times(1).returning(|| Ok(1));

        let state = ChainState::fetch(&client, address, None).await.unwrap();
        assert_eq!(
            state,
            ChainState {
                nonce: U256::from(3u64),
                gas_price: U256::from(1_000_000_000u64),
                chain_id: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_expected_chain_id_matches() {
        let client = node(0, 1, 11155111);
        let state = ChainState::fetch(&client, Address::zero(), Some(11155111))
            .await
            .unwrap();
        assert_eq!(state.chain_id, 11155111);
    }

    #[tokio::test]
    async fn test_chain_mismatch() {
        let client = node(0, 1, 5);
        let err = ChainState::fetch(&client, Address::zero(), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployerError::ChainMismatch {
                expected: 1,
                actual: 5
            }
        ));
    }

    #[tokio::test]
    async fn test_nonce_failure_stops_further_queries() {
        let mut client = MockNodeClient::new();
        client.expect_pending_nonce().returning(|_| {
            Err(DeployerError::ChainState {
                query: "eth_getTransactionCount",
                message: "connection refused".to_string(),
            })
        });
        client.expect_gas_price().times(0);
        client.expect_chain_id().times(0);

        let err = ChainState::fetch(&client, Address::zero(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployerError::ChainState { .. }));
    }
}
