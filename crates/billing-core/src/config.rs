//! Billing Configuration

use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};

/// Static billing configuration
///
/// Only holds what the components cannot learn from their collaborators:
/// the list of gateway identifiers the operator has switched on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Enabled gateway identifiers, matched case-insensitively against
    /// registered implementations
    pub enabled_gateways: Vec<String>,
}

impl BillingConfig {
    pub fn new(enabled_gateways: Vec<String>) -> Self {
        Self { enabled_gateways }
    }

    /// Create from environment variables
    ///
    /// `BILLING_GATEWAYS` is a comma-separated list, e.g. `stripe,paypal`.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var("BILLING_GATEWAYS")
            .map_err(|_| BillingError::Config("BILLING_GATEWAYS not set".into()))?;

        let enabled_gateways: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        if enabled_gateways.is_empty() {
            return Err(BillingError::Config("BILLING_GATEWAYS is empty".into()));
        }

        Ok(Self { enabled_gateways })
    }
}
