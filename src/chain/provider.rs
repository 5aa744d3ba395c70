//! Chain provider wrapping a single JSON-RPC endpoint

use crate::config::NodeConfig;
use crate::error::{DeployerError, DeployerResult};

use async_trait::async_trait;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider, ProviderError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockId, BlockNumber, U256};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use super::NodeClient;

/// Node connection with a per-request deadline
pub struct ChainProvider<P = Http> {
    /// Endpoint the provider was built for
    url: String,
    /// Underlying ethers provider
    provider: Provider<P>,
    /// Deadline applied to every request
    request_timeout: Duration,
}

impl ChainProvider<Http> {
    /// Create a provider for the configured HTTP endpoint.
    ///
    /// Only the URL is validated here; the first network round trip happens
    /// on the first query.
    pub fn connect(config: &NodeConfig) -> DeployerResult<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str()).map_err(|e| {
            DeployerError::ChainConnection {
                url: config.rpc_url.clone(),
                message: e.to_string(),
            }
        })?;

        debug!("Created HTTP provider for {}", config.rpc_url);

        Ok(Self::with_provider(
            config.rpc_url.clone(),
            provider,
            Duration::from_secs(config.request_timeout_secs),
        ))
    }
}

impl<P: JsonRpcClient> ChainProvider<P> {
    /// Wrap an existing ethers provider
    pub fn with_provider(url: String, provider: Provider<P>, request_timeout: Duration) -> Self {
        Self {
            url,
            provider,
            request_timeout,
        }
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run a request under the per-request deadline
    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        request: F,
    ) -> DeployerResult<Result<T, ProviderError>>
    where
        F: Future<Output = Result<T, ProviderError>> + Send,
    {
        debug!("Calling {} on {}", operation, self.url);
        timeout(self.request_timeout, request)
            .await
            .map_err(|_| DeployerError::Timeout {
                operation: operation.to_string(),
            })
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> NodeClient for ChainProvider<P> {
    async fn pending_nonce(&self, address: Address) -> DeployerResult<U256> {
        let pending = Some(BlockId::Number(BlockNumber::Pending));
        self.bounded(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address, pending),
        )
        .await?
        .map_err(|e| DeployerError::ChainState {
            query: "eth_getTransactionCount",
            message: e.to_string(),
        })
    }

    async fn gas_price(&self) -> DeployerResult<U256> {
        self.bounded("eth_gasPrice", self.provider.get_gas_price())
            .await?
            .map_err(|e| DeployerError::ChainState {
                query: "eth_gasPrice",
                message: e.to_string(),
            })
    }

    async fn chain_id(&self) -> DeployerResult<u64> {
        let chain_id = self
            .bounded("eth_chainId", self.provider.get_chainid())
            .await?
            .map_err(|e| DeployerError::ChainState {
                query: "eth_chainId",
                message: e.to_string(),
            })?;

        if chain_id > U256::from(u64::MAX) {
            return Err(DeployerError::ChainState {
                query: "eth_chainId",
                message: format!("chain ID {} does not fit in 64 bits", chain_id),
            });
        }

        Ok(chain_id.as_u64())
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> DeployerResult<U256> {
        self.bounded("eth_estimateGas", self.provider.estimate_gas(tx, None))
            .await?
            .map_err(|e| DeployerError::GasEstimation(e.to_string()))
    }
}
