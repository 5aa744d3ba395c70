//! Gas estimation for deployment transactions

use super::deploy::DeploymentTx;
use crate::chain::NodeClient;
use crate::error::{DeployerError, DeployerResult};

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{TransactionRequest, U256};
use tracing::debug;

/// Result of a dry-run gas query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimate {
    /// Gas units the node reported
    pub gas_limit: U256,
    /// `gas_limit` plus the configured buffer
    pub suggested_gas_limit: U256,
    /// Upper bound on fees at the snapshot gas price, in wei
    pub max_cost: U256,
}

/// Gas estimator for deployments
pub struct GasEstimator {
    /// Buffer percentage for gas limit (e.g., 20 = 20% buffer)
    gas_limit_buffer_percent: u64,
}

impl GasEstimator {
    /// Create a new gas estimator
    pub fn new(gas_limit_buffer_percent: u64) -> Self {
        Self {
            gas_limit_buffer_percent,
        }
    }

    /// Call message for `eth_estimateGas`: sender, no recipient, zero value, creation payload
    pub fn call_message(deployment: &DeploymentTx) -> TypedTransaction {
        let mut msg = TransactionRequest::new()
            .value(U256::zero())
            .data(deployment.data());
        msg.from = deployment.from();
        msg.gas_price = deployment.gas_price();
        msg.into()
    }

    /// Ask the node how much gas the deployment would consume
    pub async fn estimate<C: NodeClient + ?Sized>(
        &self,
        client: &C,
        deployment: &DeploymentTx,
    ) -> DeployerResult<GasEstimate> {
        let msg = Self::call_message(deployment);
        let gas_limit = client.estimate_gas(&msg).await?;

        if gas_limit.is_zero() {
            return Err(DeployerError::GasEstimation(
                "Node returned a zero gas estimate".to_string(),
            ));
        }

        let gas_price = deployment.gas_price().unwrap_or_default();
        let estimate = GasEstimate {
            gas_limit,
            suggested_gas_limit: self.buffered(gas_limit)?,
            max_cost: Self::calculate_cost(gas_limit, gas_price),
        };

        debug!("Gas estimate: {:?}", estimate);
        Ok(estimate)
    }

    fn buffered(&self, gas_limit: U256) -> DeployerResult<U256> {
        gas_limit
            .checked_mul(U256::from(self.gas_limit_buffer_percent))
            .map(|scaled| scaled / 100)
            .and_then(|buffer| gas_limit.checked_add(buffer))
            .ok_or_else(|| {
                DeployerError::GasEstimation(format!(
                    "Gas estimate {} overflows with a {}% buffer",
                    gas_limit, self.gas_limit_buffer_percent
                ))
            })
    }

    /// Calculate total cost in wei
    pub fn calculate_cost(gas_limit: U256, gas_price: U256) -> U256 {
        gas_limit.saturating_mul(gas_price)
    }
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self::new(20)
    }
}
