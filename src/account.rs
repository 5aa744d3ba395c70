//! Deployer account loading
//!
//! The key comes from an environment variable or an encrypted keystore; it is
//! never read from the config file and never logged.

use crate::config::WalletConfig;
use crate::error::{DeployerError, DeployerResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::env;
use tracing::info;

/// Signing key and the address derived from it
#[derive(Debug, Clone)]
pub struct Account {
    wallet: LocalWallet,
}

impl Account {
    /// Parse a hex-encoded secp256k1 private key, with or without `0x`
    pub fn from_hex(key: &str) -> DeployerResult<Self> {
        let wallet = key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| DeployerError::Wallet(format!("Invalid private key: {}", e)))?;

        Ok(Self { wallet })
    }

    /// Load the account from the environment, falling back to a keystore
    pub fn load(config: &WalletConfig) -> DeployerResult<Self> {
        if let Ok(key) = env::var(&config.private_key_env) {
            let account = Self::from_hex(&key)?;
            info!(
                "Loaded account {:?} from ${}",
                account.address(),
                config.private_key_env
            );
            return Ok(account);
        }

        if let (Some(path), Some(password_env)) =
            (&config.keystore_path, &config.keystore_password_env)
        {
            let password = env::var(password_env).map_err(|_| {
                DeployerError::Wallet(format!(
                    "Keystore password variable ${} is not set",
                    password_env
                ))
            })?;
            let wallet = LocalWallet::decrypt_keystore(path, password).map_err(|e| {
                DeployerError::Wallet(format!("Failed to decrypt keystore {:?}: {}", path, e))
            })?;
            let account = Self { wallet };
            info!("Loaded account {:?} from keystore {:?}", account.address(), path);
            return Ok(account);
        }

        Err(DeployerError::Wallet(format!(
            "No wallet configured. Set ${} or configure a keystore",
            config.private_key_env
        )))
    }

    /// Address derived from the public key
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Signing wallet
    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    /// First development account of the default Hardhat/Anvil mnemonic
    pub(crate) const DEV_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    pub(crate) const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_address_derivation_is_deterministic() {
        let expected: Address = DEV_ADDRESS.parse().unwrap();
        for _ in 0..3 {
            assert_eq!(Account::from_hex(DEV_KEY).unwrap().address(), expected);
        }
    }

    #[test]
    fn test_accepts_prefixed_key() {
        let prefixed = format!("0x{}", DEV_KEY);
        assert_eq!(
            Account::from_hex(&prefixed).unwrap().address(),
            Account::from_hex(DEV_KEY).unwrap().address()
        );
    }

    #[test]
    fn test_rejects_non_hex() {
        let err = Account::from_hex("not-a-private-key").unwrap_err();
        assert!(matches!(err, DeployerError::Wallet(_)));
    }

    #[test]
    fn test_rejects_empty_and_short_keys() {
        assert_err!(Account::from_hex(""));
        assert_err!(Account::from_hex("0x"));
        assert_err!(Account::from_hex(&DEV_KEY[..62]));
        assert_ok!(Account::from_hex(&format!("  {}\n", DEV_KEY)));
    }

    #[test]
    fn test_rejects_zero_scalar() {
        let zero = "0".repeat(64);
        assert!(matches!(
            Account::from_hex(&zero).unwrap_err(),
            DeployerError::Wallet(_)
        ));
    }

    #[test]
    fn test_load_from_env() {
        env::set_var("DEPLOYER_TEST_KEY_LOAD", DEV_KEY);
        let config = WalletConfig {
            private_key_env: "DEPLOYER_TEST_KEY_LOAD".to_string(),
            keystore_path: None,
            keystore_password_env: None,
        };

        let account = Account::load(&config).unwrap();
        assert_eq!(account.address(), DEV_ADDRESS.parse::<Address>().unwrap());
    }

    #[test]
    fn test_load_without_any_source() {
        let config = WalletConfig {
            private_key_env: "DEPLOYER_TEST_KEY_UNSET".to_string(),
            keystore_path: None,
            keystore_password_env: None,
        };

        let err = Account::load(&config).unwrap_err();
        assert!(err.to_string().contains("DEPLOYER_TEST_KEY_UNSET"));
    }

    #[test]
    fn test_load_from_keystore() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = ethers::core::rand::thread_rng();
        let (wallet, _) =
            LocalWallet::new_keystore(dir.path(), &mut rng, "hunter2", Some("deployer.json"))
                .unwrap();
        env::set_var("DEPLOYER_TEST_KEYSTORE_PASSWORD", "hunter2");

        let config = WalletConfig {
            private_key_env: "DEPLOYER_TEST_KEY_UNSET_KEYSTORE".to_string(),
            keystore_path: Some(dir.path().join("deployer.json")),
            keystore_password_env: Some("DEPLOYER_TEST_KEYSTORE_PASSWORD".to_string()),
        };

        let account = Account::load(&config).unwrap();
        assert_eq!(account.address(), wallet.address());
    }
}
