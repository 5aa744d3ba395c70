//! Transaction authorization context

use crate::account::Account;
use crate::chain::ChainState;
use crate::error::{DeployerError, DeployerResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use tracing::debug;

/// Everything needed to build and sign a transaction for one chain.
///
/// Transactions built from these options are never broadcast: `no_send` is
/// always set and there is no way to clear it.
#[derive(Debug, Clone)]
pub struct TransactOpts {
    /// Wallet bound to `chain_id` (EIP-155)
    wallet: LocalWallet,
    from: Address,
    nonce: U256,
    gas_price: U256,
    chain_id: u64,
    no_send: bool,
}

impl TransactOpts {
    /// Bind the account to the chain state snapshot
    pub fn new(account: &Account, state: &ChainState) -> DeployerResult<Self> {
        if state.chain_id == 0 {
            return Err(DeployerError::Wallet(
                "Cannot sign for chain ID 0".to_string(),
            ));
        }

        let wallet = account.wallet().clone().with_chain_id(state.chain_id);
        let opts = Self {
            from: wallet.address(),
            wallet,
            nonce: state.nonce,
            gas_price: state.gas_price,
            chain_id: state.chain_id,
            no_send: true,
        };

        debug!(
            "Authorized {:?} on chain {} (nonce {}, no_send)",
            opts.from, opts.chain_id, opts.nonce
        );
        Ok(opts)
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    pub fn from(&self) -> Address {
        self.from
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Whether broadcasting is suppressed. Always true.
    pub fn no_send(&self) -> bool {
        self.no_send
    }
}
