//! Configuration

use alloy_primitives::{address, Address};
use arbius_core::format::CID_PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, env, fs, path::Path, time::Duration};
use tracing::warn;

use crate::error::HostError;
use crate::templates::TemplateRegistry;

/// Arbius engine on Arbitrum Nova
pub const NOVA_ENGINE: Address = address!("3bf6050327fa280ee1b5f3e8fd5ea2efe8a6472a");

/// Explorer configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chain JSON-RPC URL
    pub rpc_url: String,
    /// Engine contract address
    pub engine_address: Address,
    /// GraphQL endpoint of the indexing service
    pub subgraph_url: String,
    /// Network discriminator for indexed votes
    pub vote_network: String,
    /// Content gateway template; `%C` is replaced by the cid
    pub ipfs_gateway: String,
    /// Block explorer base URL for address links
    pub explorer_url: String,
    /// Token whose balance is shown for the viewer account
    pub token_address: Option<Address>,
    /// Event poll interval in seconds
    pub poll_interval_secs: u64,
    /// Upper bound for event poll backoff in seconds
    pub max_backoff_secs: u64,
    /// Page server listen address
    pub listen_addr: String,
    /// Model id to template name; unlisted models use the default template
    pub model_templates: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            engine_address: NOVA_ENGINE,
            subgraph_url: "https://squid.subsquid.io/arbius-core/v/v1/graphql".to_string(),
            vote_network: "nova".to_string(),
            ipfs_gateway: "https://ipfs.io/ipfs/%C".to_string(),
            explorer_url: "https://nova.arbiscan.io".to_string(),
            token_address: None,
            poll_interval_secs: 4,
            max_backoff_secs: 60,
            listen_addr: "0.0.0.0:3000".to_string(),
            model_templates: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HostError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// File (if given) first, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, HostError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(|key| env::var(key).ok()))
    }

    /// Apply overrides from a key lookup (environment variable names)
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("RPC_URL") {
            self.rpc_url = url;
        }
        if let Some(addr) = lookup("ENGINE_ADDRESS") {
            match addr.parse() {
                Ok(addr) => self.engine_address = addr,
                Err(e) => warn!(value = %addr, error = %e, "Ignoring invalid ENGINE_ADDRESS"),
            }
        }
        if let Some(url) = lookup("SUBGRAPH_URL") {
            self.subgraph_url = url;
        }
        if let Some(network) = lookup("VOTE_NETWORK") {
            self.vote_network = network;
        }
        if let Some(template) = lookup("IPFS_GATEWAY_CSTR") {
            self.ipfs_gateway = template;
        }
        if let Some(url) = lookup("EXPLORER_URL") {
            self.explorer_url = url;
        }
        if let Some(addr) = lookup("TOKEN_ADDRESS") {
            match addr.parse() {
                Ok(addr) => self.token_address = Some(addr),
                Err(e) => warn!(value = %addr, error = %e, "Ignoring invalid TOKEN_ADDRESS"),
            }
        }
        if let Some(secs) = lookup("POLL_INTERVAL").and_then(|s| s.parse().ok()) {
            self.poll_interval_secs = secs;
        }
        if let Some(secs) = lookup("MAX_BACKOFF").and_then(|s| s.parse().ok()) {
            self.max_backoff_secs = secs;
        }
        if let Some(addr) = lookup("LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        self
    }

    /// Reject settings no read can succeed with
    pub fn validate(&self) -> Result<(), HostError> {
        if self.rpc_url.trim().is_empty() {
            return Err(HostError::Config("rpc_url is empty".to_string()));
        }
        if self.engine_address == Address::ZERO {
            return Err(HostError::Config("engine_address is not set".to_string()));
        }
        if !self.ipfs_gateway.contains(CID_PLACEHOLDER) {
            return Err(HostError::Config(format!(
                "ipfs_gateway {:?} has no {CID_PLACEHOLDER} placeholder",
                self.ipfs_gateway
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(HostError::Config("poll_interval_secs must be positive".to_string()));
        }
        TemplateRegistry::from_config(self)?;
        Ok(())
    }

    /// Event poll interval
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Event poll backoff ceiling, never below the poll interval
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs.max(self.poll_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENGINE: &str = "0x3bf6050327fa280ee1b5f3e8fd5ea2efe8a6472a";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.vote_network, "nova");
        assert_eq!(config.poll_interval(), Duration::from_secs(4));
        assert_eq!(config.engine_address, ENGINE.parse::<Address>().unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_engine_rejected() {
        let config = Config { engine_address: Address::ZERO, ..Config::default() };
        assert!(matches!(config.validate(), Err(HostError::Config(_))));
    }

    #[test]
    fn test_unknown_model_template_rejected() {
        let mut config = Config::default();
        config.model_templates.insert(format!("0x{}", "42".repeat(32)), "sdxl".to_string());
        assert!(matches!(config.validate(), Err(HostError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(lookup(&[
            ("RPC_URL", "http://rpc.example:8547"),
            ("ENGINE_ADDRESS", ENGINE),
            ("IPFS_GATEWAY_CSTR", "https://gw.example/ipfs/%C"),
            ("POLL_INTERVAL", "12"),
            ("TOKEN_ADDRESS", "not-an-address"),
        ]));

        assert_eq!(config.rpc_url, "http://rpc.example:8547");
        assert_eq!(config.engine_address, ENGINE.parse::<Address>().unwrap());
        assert_eq!(config.ipfs_gateway, "https://gw.example/ipfs/%C");
        assert_eq!(config.poll_interval_secs, 12);
        assert_eq!(config.token_address, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gateway_without_placeholder_rejected() {
        let config = Config {
            engine_address: ENGINE.parse().unwrap(),
            ipfs_gateway: "https://gw.example/ipfs/".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(HostError::Config(_))));
    }

    #[test]
    fn test_max_backoff_not_below_interval() {
        let config = Config { poll_interval_secs: 30, max_backoff_secs: 5, ..Config::default() };
        assert_eq!(config.max_backoff(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "rpc_url": "http://rpc.example", "vote_network": "arbitrum",
                "model_templates": {{ "0x{model}": "zeroscopev2" }} }}"#,
            model = "77".repeat(32)
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.engine_address, ENGINE.parse::<Address>().unwrap());
        assert_eq!(config.vote_network, "arbitrum");
        assert_eq!(config.rpc_url, "http://rpc.example");
        assert_eq!(config.ipfs_gateway, Config::default().ipfs_gateway);
        assert_eq!(config.model_templates.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(HostError::Io(_))));
    }
}
