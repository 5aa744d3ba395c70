//! Compiled contract artifacts and constructor encoding
//!
//! Accepts Hardhat artifacts (`bytecode` is a hex string) and Foundry
//! artifacts (`bytecode.object` is a hex string).

use crate::error::{DeployerError, DeployerResult};

use ethers::abi::token::{LenientTokenizer, Tokenizer};
use ethers::abi::{Abi, Param, Token};
use ethers::types::Bytes;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    abi: Abi,
    bytecode: BytecodeField,
}

/// ABI and creation bytecode of a compiled contract
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    name: String,
    abi: Abi,
    bytecode: Bytes,
}

impl ContractArtifact {
    /// Read an artifact JSON file
    pub fn load(path: &Path) -> DeployerResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DeployerError::Contract(format!("Failed to read artifact {:?}: {}", path, e))
        })?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "contract".to_string());

        Self::from_json(&fallback, &json)
    }

    /// Parse artifact JSON; `fallback_name` is used when the artifact has no `contractName`
    pub fn from_json(fallback_name: &str, json: &str) -> DeployerResult<Self> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| DeployerError::Contract(format!("Invalid artifact JSON: {}", e)))?;

        let code = match raw.bytecode {
            BytecodeField::Hex(code) | BytecodeField::Object { object: code } => code,
        };
        let bytecode = decode_bytecode(&code)?;
        let name = raw.contract_name.unwrap_or_else(|| fallback_name.to_string());

        debug!("Loaded artifact {} ({} bytes of bytecode)", name, bytecode.len());

        Ok(Self {
            name,
            abi: raw.abi,
            bytecode,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    /// Constructor parameters, empty when the ABI declares no constructor
    pub fn constructor_inputs(&self) -> &[Param] {
        self.abi
            .constructor()
            .map(|c| c.inputs.as_slice())
            .unwrap_or(&[])
    }

    /// Creation payload: bytecode followed by the ABI-encoded constructor arguments.
    ///
    /// `args` must match the constructor arity exactly and each one must parse as
    /// its parameter type.
    pub fn deployment_data(&self, args: &[String]) -> DeployerResult<Bytes> {
        let tokens = self.tokenize_args(args)?;

        match self.abi.constructor() {
            Some(constructor) => constructor
                .encode_input(self.bytecode.to_vec(), &tokens)
                .map(Bytes::from)
                .map_err(|e| {
                    DeployerError::Contract(format!("Failed to encode constructor: {}", e))
                }),
            None => Ok(self.bytecode.clone()),
        }
    }

    fn tokenize_args(&self, args: &[String]) -> DeployerResult<Vec<Token>> {
        let inputs = self.constructor_inputs();
        if inputs.len() != args.len() {
            return Err(DeployerError::Contract(format!(
                "{} constructor takes {} argument(s), {} configured",
                self.name,
                inputs.len(),
                args.len()
            )));
        }

        inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                LenientTokenizer::tokenize(&param.kind, arg).map_err(|e| {
                    DeployerError::Contract(format!(
                        "Constructor argument {} ({}) is not a valid {}: {}",
                        param.name, arg, param.kind, e
                    ))
                })
            })
            .collect()
    }
}

fn decode_bytecode(code: &str) -> DeployerResult<Bytes> {
    let code = code.trim();
    let code = code.strip_prefix("0x").unwrap_or(code);

    if code.is_empty() {
        return Err(DeployerError::Contract(
            "Artifact has no bytecode (abstract contract or interface?)".to_string(),
        ));
    }
    if code.contains("__") {
        return Err(DeployerError::Contract(
            "Artifact bytecode has unlinked library placeholders".to_string(),
        ));
    }

    hex::decode(code)
        .map(Bytes::from)
        .map_err(|e| DeployerError::Contract(format!("Invalid bytecode hex: {}", e)))
}
