use std::path::Path;

use config::{Config, Environment, File};
use contracts::ContractName;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Where the bridge talks to and which contracts it drives.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    #[serde(default = "default_node_url")]
    pub node_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default)]
    pub token_contract: Option<String>,
    #[serde(default)]
    pub faucet_contract: Option<String>,
}

fn default_node_url() -> String {
    "http://localhost:4321".to_string()
}

fn default_chain_id() -> u64 {
    1337
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            chain_id: default_chain_id(),
            token_contract: None,
            faucet_contract: None,
        }
    }
}

impl BridgeConfig {
    /// Optional `file`, then `FAUCET_UI_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self, ClientError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(false));
        }
        builder
            .add_source(Environment::with_prefix("FAUCET_UI"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ClientError::Configuration(format!("Invalid configuration: {e}")))
    }

    pub fn token_contract(&self) -> Result<ContractName, ClientError> {
        configured(&self.token_contract)
            .ok_or_else(|| ClientError::Configuration("Token address not configured".into()))
    }

    pub fn faucet_contract(&self) -> Result<ContractName, ClientError> {
        configured(&self.faucet_contract)
            .ok_or_else(|| ClientError::Configuration("Faucet address not configured".into()))
    }

    pub fn to_toml(&self) -> Result<String, ClientError> {
        toml::to_string(self)
            .map_err(|e| ClientError::Configuration(format!("Could not write configuration: {e}")))
    }
}

fn configured(name: &Option<String>) -> Option<ContractName> {
    name.as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ContractName::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_contracts_are_configuration_errors() {
        let config = BridgeConfig {
            faucet_contract: Some("  ".into()),
            ..Default::default()
        };
        let err = config.token_contract().unwrap_err();
        assert_eq!(err.to_string(), "Token address not configured");
        let err = config.faucet_contract().unwrap_err();
        assert_eq!(err.to_string(), "Faucet address not configured");
    }

    #[test]
    fn written_file_loads_back() {
        let config = BridgeConfig {
            node_url: "http://127.0.0.1:9000".into(),
            chain_id: 7,
            token_contract: Some("jan".into()),
            faucet_contract: Some("faucet".into()),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui.toml");
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = BridgeConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.faucet_contract().unwrap(), ContractName::from("faucet"));
    }

    #[test]
    fn escapes_survive_a_round_trip() {
        let config = BridgeConfig {
            node_url: r#"http://host/a\b"quoted""#.into(),
            chain_id: 1337,
            token_contract: Some("jan".into()),
            faucet_contract: None,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui.toml");
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = BridgeConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.node_url, r#"http://host/a\b"quoted""#);
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = BridgeConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(loaded.node_url, "http://localhost:4321");
        assert_eq!(loaded.chain_id, 1337);
    }
}
