//! The dry-run deployment pipeline
//!
//! chain state -> authorization -> deployment build -> gas estimate -> local signature.
//! Every stage fails fast; nothing is ever broadcast.

use crate::account::Account;
use crate::chain::{ChainState, NodeClient};
use crate::contract::ContractArtifact;
use crate::error::DeployerResult;
use crate::tx::{Deployer, GasEstimate, GasEstimator, SignedDeployment, TransactOpts};

use ethers::utils::format_ether;
use std::fmt;
use tracing::info;

/// Everything learned from one dry run
#[derive(Debug, Clone)]
pub struct DryRunReport {
    pub chain: ChainState,
    pub gas: GasEstimate,
    pub deployment: SignedDeployment,
}

impl fmt::Display for DryRunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "estimated gas limit: {}", self.gas.gas_limit)
    }
}

/// One-shot dry-run deployment against a node
pub struct DryRun<'a, C: NodeClient + ?Sized> {
    client: &'a C,
    expected_chain_id: Option<u64>,
    gas_estimator: GasEstimator,
}

impl<'a, C: NodeClient + ?Sized> DryRun<'a, C> {
    pub fn new(
        client: &'a C,
        expected_chain_id: Option<u64>,
        gas_estimator: GasEstimator,
    ) -> Self {
        Self {
            client,
            expected_chain_id,
            gas_estimator,
        }
    }

    /// Build, estimate and sign a deployment of `artifact` from `account`
    pub async fn execute(
        &self,
        account: &Account,
        artifact: &ContractArtifact,
        constructor_args: &[String],
    ) -> DeployerResult<DryRunReport> {
        let chain =
            ChainState::fetch(self.client, account.address(), self.expected_chain_id).await?;

        let opts = TransactOpts::new(account, &chain)?;

        let deployment = Deployer::new(artifact, constructor_args).build(&opts)?;
        info!(
            "Prepared {} deployment, predicted address {:?}",
            artifact.name(),
            deployment.contract_address()
        );

        let gas = self.gas_estimator.estimate(self.client, &deployment).await?;
        info!(
            "Estimated {} gas (suggested limit {}), max fee {} ETH",
            gas.gas_limit,
            gas.suggested_gas_limit,
            format_ether(gas.max_cost)
        );

        let deployment = deployment.sign(&opts, gas.suggested_gas_limit).await?;

        Ok(DryRunReport {
            chain,
            gas,
            deployment,
        })
    }
}
