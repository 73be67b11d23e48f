//! ENS client configuration

use crate::address::Address;
use crate::transaction::SendOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Registry contract on Ethereum mainnet
pub const MAINNET_REGISTRY_ADDRESS: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

/// ENS client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsConfig {
    /// Registry contract address
    pub registry_address: Address,
    /// Options applied to every send unless overridden per call
    pub default_send_options: SendOptions,
    /// Lifecycle tracking settings
    pub lifecycle: LifecycleConfig,
}

impl Default for EnsConfig {
    fn default() -> Self {
        Self {
            registry_address: Address::new(MAINNET_REGISTRY_ADDRESS),
            default_send_options: SendOptions::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

impl EnsConfig {
    /// Configuration for a registry deployed at `registry_address`
    pub fn with_registry(registry_address: Address) -> Self {
        Self {
            registry_address,
            ..Default::default()
        }
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EnsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.registry_address.is_zero() {
            return Err(Error::Config(format!(
                "Registry address {} is not set",
                self.registry_address
            )));
        }
        if let Err(e) = self.registry_address.as_str().parse::<Address>() {
            return Err(Error::Config(format!("Invalid registry address: {}", e)));
        }
        if self.lifecycle.confirmation_target == Some(0) {
            return Err(Error::Config(
                "Confirmation target must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle tracking settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Stop broadcasting confirmation events after this many.
    ///
    /// The operation keeps waiting for the receipt either way.
    pub confirmation_target: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EnsConfig::default();
        assert_eq!(config.registry_address, Address::new(MAINNET_REGISTRY_ADDRESS));
        assert!(config.default_send_options.is_empty());
        assert_eq!(config.lifecycle.confirmation_target, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let registry = Address::new("0x314159265dd8dbb310642f98f50c066173c1259b");
        let mut config = EnsConfig::with_registry(registry);
        config.default_send_options = SendOptions::new().gas(90_000);
        config.lifecycle.confirmation_target = Some(12);

        let json = config.to_json().unwrap();
        let parsed = EnsConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EnsConfig::from_json(r#"{"lifecycle":{"confirmation_target":3}}"#).unwrap();
        assert_eq!(config.registry_address, Address::new(MAINNET_REGISTRY_ADDRESS));
        assert_eq!(config.lifecycle.confirmation_target, Some(3));
    }

    #[test]
    fn test_validate_rejects_zero_registry() {
        let config = EnsConfig::with_registry(Address::zero());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let err = EnsConfig::from_json(r#"{"registry_address":"0x0"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_registry_is_config_error() {
        for json in [
            r#"{"registry_address":""}"#,
            r#"{"registry_address":"x"}"#,
            r#"{"registry_address":"0x1234"}"#,
        ] {
            let err = EnsConfig::from_json(json).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{}", json);
        }
    }

    #[test]
    fn test_checksummed_registry_matches_normalized() {
        let json = format!(r#"{{"registry_address":"{}"}}"#, MAINNET_REGISTRY_ADDRESS);
        let config = EnsConfig::from_json(&json).unwrap();
        assert_eq!(config.registry_address, Address::new(MAINNET_REGISTRY_ADDRESS));
        assert_eq!(config, EnsConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_confirmation_target() {
        let mut config = EnsConfig::default();
        config.lifecycle.confirmation_target = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EnsConfig::from_json("{not json"),
            Err(Error::Serialization(_))
        ));
    }
}
