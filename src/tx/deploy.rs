//! Contract-creation transactions that are built and signed but never sent

use super::auth::TransactOpts;
use crate::contract::ContractArtifact;
use crate::error::{DeployerError, DeployerResult};

use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Signature, TransactionRequest, H256, U256};
use ethers::utils::get_contract_address;
use tracing::{debug, info};

/// Unsigned contract-creation transaction
#[derive(Debug, Clone)]
pub struct DeploymentTx {
    /// Legacy request with `to = None`
    tx: TransactionRequest,
    /// Address the contract would get if this transaction were mined
    contract_address: Address,
}

/// Deployment transaction sealed with a gas limit and a local signature
#[derive(Debug, Clone)]
pub struct SignedDeployment {
    pub tx: TypedTransaction,
    pub signature: Signature,
    /// RLP-encoded signed transaction, never broadcast
    pub raw: Bytes,
    pub hash: H256,
    pub contract_address: Address,
}

/// Builds deployment transactions for a single artifact
pub struct Deployer<'a> {
    artifact: &'a ContractArtifact,
    constructor_args: &'a [String],
}

impl<'a> Deployer<'a> {
    pub fn new(artifact: &'a ContractArtifact, constructor_args: &'a [String]) -> Self {
        Self {
            artifact,
            constructor_args,
        }
    }

    /// Build the creation transaction for `opts`. Nothing leaves the process.
    pub fn build(&self, opts: &TransactOpts) -> DeployerResult<DeploymentTx> {
        if !opts.no_send() {
            return Err(DeployerError::Contract(
                "Refusing to build a deployment that may be broadcast".to_string(),
            ));
        }

        let data = self.artifact.deployment_data(self.constructor_args)?;

        let tx = TransactionRequest::new()
            .from(opts.from())
            .nonce(opts.nonce())
            .gas_price(opts.gas_price())
            .value(U256::zero())
            .data(data)
            .chain_id(opts.chain_id());

        let contract_address = get_contract_address(opts.from(), opts.nonce());

        debug!(
            "Built {} deployment: {} bytes of calldata, predicted address {:?}",
            self.artifact.name(),
            tx.data.as_ref().map(|d| d.len()).unwrap_or_default(),
            contract_address
        );

        Ok(DeploymentTx {
            tx,
            contract_address,
        })
    }
}

impl DeploymentTx {
    pub fn from(&self) -> Option<Address> {
        self.tx.from
    }

    pub fn gas_price(&self) -> Option<U256> {
        self.tx.gas_price
    }

    /// Bytecode followed by encoded constructor arguments
    pub fn data(&self) -> Bytes {
        self.tx.data.clone().unwrap_or_default()
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    /// Set the gas limit and sign locally
    pub async fn sign(
        self,
        opts: &TransactOpts,
        gas_limit: U256,
    ) -> DeployerResult<SignedDeployment> {
        let tx = TypedTransaction::Legacy(self.tx.gas(gas_limit));

        let signature = opts
            .wallet()
            .sign_transaction(&tx)
            .await
            .map_err(|e| DeployerError::Wallet(format!("Failed to sign deployment: {}", e)))?;

        let raw = tx.rlp_signed(&signature);
        let hash = tx.hash(&signature);

        info!(
            "Signed deployment {:?} ({} bytes), not broadcasting",
            hash,
            raw.len()
        );

        Ok(SignedDeployment {
            tx,
            signature,
            raw,
            hash,
            contract_address: self.contract_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::tests::DEV_KEY;
    use crate::account::Account;
    use crate::chain::ChainState;
    use crate::contract::tests::URI_ARTIFACT;

    fn opts() -> TransactOpts {
        let account = Account::from_hex(DEV_KEY).unwrap();
        let state = ChainState {
            nonce: U256::zero(),
            gas_price: U256::from(1_000_000_000u64),
            chain_id: 31337,
        };
        TransactOpts::new(&account, &state).unwrap()
    }

    fn artifact() -> ContractArtifact {
        ContractArtifact::from_json("ERC1155Template", URI_ARTIFACT).unwrap()
    }

    #[test]
    fn test_build_contract_creation() {
        let artifact = artifact();
        let args = vec!["ipfs://metadata/{id}".to_string()];
        let opts = opts();

        let deployment = Deployer::new(&artifact, &args).build(&opts).unwrap();

        assert!(deployment.tx.to.is_none());
        assert_eq!(deployment.from(), Some(opts.from()));
        assert_eq!(deployment.gas_price(), Some(opts.gas_price()));
        assert_eq!(deployment.tx.value, Some(U256::zero()));
        assert_eq!(
            deployment.data(),
            artifact.deployment_data(&args).unwrap()
        );
    }

    #[test]
    fn test_predicted_address_for_first_nonce() {
        let artifact = artifact();
        let args = vec![String::new()];

        let deployment = Deployer::new(&artifact, &args).build(&opts()).unwrap();

        // CREATE address of the first dev account at nonce 0
        let expected: Address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
            .parse()
            .unwrap();
        assert_eq!(deployment.contract_address(), expected);
    }

    #[test]
    fn test_build_fails_on_bad_constructor_args() {
        let artifact = artifact();
        let args: Vec<String> = vec![];

        let err = Deployer::new(&artifact, &args).build(&opts()).unwrap_err();
        assert!(matches!(err, DeployerError::Contract(_)));
    }

    #[tokio::test]
    async fn test_sign_recovers_sender() {
        let artifact = artifact();
        let args = vec![String::new()];
        let opts = opts();
        let deployment = Deployer::new(&artifact, &args).build(&opts).unwrap();

        let signed = deployment
            .sign(&opts, U256::from(500_000u64))
            .await
            .unwrap();

        assert_eq!(signed.tx.gas(), Some(&U256::from(500_000u64)));
        assert_eq!(signed.hash, H256::from(ethers::utils::keccak256(&signed.raw)));
        let sighash = signed.tx.sighash();
        assert_eq!(signed.signature.recover(sighash).unwrap(), opts.from());
    }
}
