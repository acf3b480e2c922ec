//! Account-level billing settings
//!
//! Labour policy and GST defaults are passed explicitly into pricing instead of
//! being read from global state. They can be built directly or loaded from the
//! environment.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::tax::gst::{is_valid_gstin, state_code_from_gstin, GstDefaults};
use crate::types::LabourChargePolicy;
use crate::utils::numeric::parse_decimal_strict;

pub const ENV_LABOUR_CHARGE_MODE: &str = "JEWEL_LABOUR_CHARGE_MODE";
pub const ENV_GST_RATE: &str = "JEWEL_GST_RATE";
pub const ENV_SELLER_GSTIN: &str = "JEWEL_SELLER_GSTIN";
pub const ENV_SELLER_STATE_CODE: &str = "JEWEL_SELLER_STATE_CODE";

/// Settings that shape how vouchers are priced
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BillingSettings {
    pub labour_charge_policy: LabourChargePolicy,
    pub gst_defaults: GstDefaults,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl BillingSettings {
    pub fn new(labour_charge_policy: LabourChargePolicy, gst_defaults: GstDefaults) -> Self {
        Self {
            labour_charge_policy,
            gst_defaults,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let labour_charge_policy = match env_map
            .get(ENV_LABOUR_CHARGE_MODE)
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
            .unwrap_or("flat")
        {
            "flat" => LabourChargePolicy::Flat,
            "per_gram" | "per-gram" | "pergram" => LabourChargePolicy::PerGram,
            other => {
                return Err(ConfigError::InvalidValue(
                    ENV_LABOUR_CHARGE_MODE.to_string(),
                    format!("must be flat or per_gram, got {}", other),
                ))
            }
        };

        let rate_percent = match env_map.get(ENV_GST_RATE) {
            Some(raw) => {
                let rate = parse_decimal_strict(raw).ok_or_else(|| {
                    ConfigError::InvalidValue(
                        ENV_GST_RATE.to_string(),
                        format!("must be a decimal percentage, got {}", raw),
                    )
                })?;
                if rate < BigDecimal::from(0) || rate > BigDecimal::from(100) {
                    return Err(ConfigError::InvalidValue(
                        ENV_GST_RATE.to_string(),
                        format!("must be between 0 and 100, got {}", raw),
                    ));
                }
                rate
            }
            None => GstDefaults::jewellery_rate(),
        };

        let seller_state_code = match env_map.get(ENV_SELLER_GSTIN) {
            Some(raw) => {
                let gstin = raw.trim().to_ascii_uppercase();
                if !is_valid_gstin(&gstin) {
                    return Err(ConfigError::InvalidValue(
                        ENV_SELLER_GSTIN.to_string(),
                        format!("not a valid GSTIN: {}", raw),
                    ));
                }
                state_code_from_gstin(&gstin).map(str::to_string)
            }
            None => env_map
                .get(ENV_SELLER_STATE_CODE)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };

        if seller_state_code.is_none() {
            tracing::warn!("No seller state code configured; GST tax type will stay undetermined");
        }

        tracing::debug!(
            policy = ?labour_charge_policy,
            gst_rate = %rate_percent,
            seller_state = ?seller_state_code,
            "Loaded billing settings"
        );

        Ok(Self {
            labour_charge_policy,
            gst_defaults: GstDefaults::new(rate_percent, seller_state_code),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = BillingSettings::from_env_map(HashMap::new()).unwrap();
        assert_eq!(settings.labour_charge_policy, LabourChargePolicy::Flat);
        assert_eq!(settings.gst_defaults.rate_percent, BigDecimal::from(3));
        assert_eq!(settings.gst_defaults.seller_state_code, None);
    }

    #[test]
    fn test_full_environment() {
        let settings = BillingSettings::from_env_map(env(&[
            (ENV_LABOUR_CHARGE_MODE, "PER_GRAM"),
            (ENV_GST_RATE, "1.5"),
            (ENV_SELLER_GSTIN, "33abcde1234f1z5"),
        ]))
        .unwrap();
        assert_eq!(settings.labour_charge_policy, LabourChargePolicy::PerGram);
        assert_eq!(
            settings.gst_defaults.rate_percent,
            BigDecimal::from_str("1.5").unwrap()
        );
        assert_eq!(settings.gst_defaults.seller_state_code.as_deref(), Some("33"));
    }

    #[test]
    fn test_state_code_without_gstin() {
        let settings =
            BillingSettings::from_env_map(env(&[(ENV_SELLER_STATE_CODE, " 29 ")])).unwrap();
        assert_eq!(settings.gst_defaults.seller_state_code.as_deref(), Some("29"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(BillingSettings::from_env_map(env(&[(ENV_LABOUR_CHARGE_MODE, "hourly")])).is_err());
        assert!(BillingSettings::from_env_map(env(&[(ENV_GST_RATE, "three")])).is_err());
        assert!(BillingSettings::from_env_map(env(&[(ENV_GST_RATE, "120")])).is_err());
        assert!(
            BillingSettings::from_env_map(env(&[(ENV_GST_RATE, "3e-400000000")])).is_err()
        );
        assert!(BillingSettings::from_env_map(env(&[(ENV_SELLER_GSTIN, "12345")])).is_err());
    }
}
