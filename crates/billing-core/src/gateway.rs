//! Gateway Registry
//!
//! Resolves the set of enabled payment gateways from configuration and
//! answers naming, exclusivity and currency-support queries. Independent of
//! the customer resolver; the two share no data.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::model::TenantId;

/// Reserved gateway key for trial periods; has no implementation behind it
pub const TRIAL_GATEWAY_KEY: &str = "trial";

/// A payment gateway implementation descriptor
///
/// Every registered gateway must be able to report its own key and display
/// name; that is the whole capability the registry requires.
pub trait Gateway: Send + Sync {
    /// Stable lowercase registry key, e.g. `stripe`
    fn key(&self) -> &str;

    /// Human-readable name, e.g. `Stripe`
    fn display_name(&self) -> &str;
}

/// An active gateway as exposed by the registry
#[derive(Clone)]
pub struct GatewayEntry {
    pub display_name: String,
    pub gateway: Arc<dyn Gateway>,
}

impl std::fmt::Debug for GatewayEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayEntry")
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Records which gateway a tenant last paid through
pub trait GatewayHistory: Send + Sync {
    fn last_gateway(&self, tenant: TenantId) -> Option<String>;
}

/// In-memory gateway history (for development and tests)
#[derive(Default)]
pub struct MemoryGatewayHistory {
    last_used: RwLock<HashMap<TenantId, String>>,
}

impl MemoryGatewayHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_use(&self, tenant: TenantId, key: &str) {
        self.last_used
            .write()
            .expect("history lock")
            .insert(tenant, key.to_lowercase());
    }
}

impl GatewayHistory for MemoryGatewayHistory {
    fn last_gateway(&self, tenant: TenantId) -> Option<String> {
        self.last_used
            .read()
            .expect("history lock")
            .get(&tenant)
            .cloned()
    }
}

/// Currency code to supporting gateway keys
#[derive(Clone, Debug)]
pub struct CurrencyTable {
    supporters: HashMap<String, Vec<String>>,
}

impl Default for CurrencyTable {
    fn default() -> Self {
        let mut supporters = HashMap::new();
        for code in ["USD", "EUR", "GBP", "CAD", "AUD", "JPY"] {
            supporters.insert(
                code.to_string(),
                vec!["stripe".to_string(), "paypal".to_string()],
            );
        }
        for code in ["SGD", "HKD", "NZD", "CHF", "SEK", "NOK", "DKK"] {
            supporters.insert(code.to_string(), vec!["stripe".to_string()]);
        }
        Self { supporters }
    }
}

impl CurrencyTable {
    pub fn new(supporters: HashMap<String, Vec<String>>) -> Self {
        Self { supporters }
    }

    /// True iff the currency is known and lists the gateway as a supporter
    pub fn supports(&self, currency_code: &str, gateway_key: &str) -> bool {
        self.supporters
            .get(&currency_code.to_uppercase())
            .is_some_and(|keys| keys.iter().any(|k| k == &gateway_key.to_lowercase()))
    }
}

/// Registry of enabled payment gateways
pub struct GatewayRegistry {
    active: BTreeMap<String, GatewayEntry>,
    history: Arc<dyn GatewayHistory>,
    currencies: CurrencyTable,
}

impl GatewayRegistry {
    /// Build the registry from known implementations and the configured
    /// enabled list
    ///
    /// Enabled identifiers with no registered implementation are silently
    /// skipped.
    pub fn new(
        known: Vec<Arc<dyn Gateway>>,
        enabled: &[String],
        history: Arc<dyn GatewayHistory>,
        currencies: CurrencyTable,
    ) -> Self {
        let known: HashMap<String, Arc<dyn Gateway>> = known
            .into_iter()
            .map(|g| (g.key().to_lowercase(), g))
            .collect();

        let mut active = BTreeMap::new();
        for key in enabled {
            let key = key.to_lowercase();
            match known.get(&key) {
                Some(gateway) => {
                    active.insert(
                        key,
                        GatewayEntry {
                            display_name: gateway.display_name().to_string(),
                            gateway: gateway.clone(),
                        },
                    );
                }
                None => {
                    tracing::debug!(gateway = %key, "Enabled gateway has no implementation, skipping");
                }
            }
        }

        Self {
            active,
            history,
            currencies,
        }
    }

    /// Build the registry straight from configuration
    pub fn from_config(
        known: Vec<Arc<dyn Gateway>>,
        config: &crate::config::BillingConfig,
        history: Arc<dyn GatewayHistory>,
        currencies: CurrencyTable,
    ) -> Self {
        Self::new(known, &config.enabled_gateways, history, currencies)
    }

    /// All active gateways keyed by registry key
    pub fn active_gateways(&self) -> &BTreeMap<String, GatewayEntry> {
        &self.active
    }

    /// Display name for a gateway key, case-insensitive
    ///
    /// The reserved `trial` key resolves to the literal `Trial` label;
    /// unknown keys echo back unchanged.
    pub fn nice_name(&self, key: &str) -> String {
        let lower = key.to_lowercase();
        if lower == TRIAL_GATEWAY_KEY {
            return "Trial".to_string();
        }
        match self.active.get(&lower) {
            Some(entry) => entry.display_name.clone(),
            None => key.to_string(),
        }
    }

    /// True iff exactly one gateway is active and it matches `key`
    pub fn is_only_active(&self, key: &str) -> bool {
        self.active.len() == 1 && self.active.contains_key(&key.to_lowercase())
    }

    /// True iff the tenant's recorded last-used gateway equals `key`
    pub fn is_last_gateway_used(&self, tenant: TenantId, key: &str) -> bool {
        self.history
            .last_gateway(tenant)
            .is_some_and(|last| last == key.to_lowercase())
    }

    /// True iff the currency lists the gateway as a supporter
    pub fn supports_currency(&self, currency_code: &str, gateway_key: &str) -> bool {
        self.currencies.supports(currency_code, gateway_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestGateway {
        key: &'static str,
        name: &'static str,
    }

    impl Gateway for TestGateway {
        fn key(&self) -> &str {
            self.key
        }

        fn display_name(&self) -> &str {
            self.name
        }
    }

    fn registry(enabled: &[&str]) -> (GatewayRegistry, Arc<MemoryGatewayHistory>) {
        let history = Arc::new(MemoryGatewayHistory::new());
        let known: Vec<Arc<dyn Gateway>> = vec![
            Arc::new(TestGateway {
                key: "stripe",
                name: "Stripe",
            }),
            Arc::new(TestGateway {
                key: "paypal",
                name: "PayPal Express",
            }),
        ];
        let enabled: Vec<String> = enabled.iter().map(|s| (*s).to_string()).collect();
        let registry =
            GatewayRegistry::new(known, &enabled, history.clone(), CurrencyTable::default());
        (registry, history)
    }

    #[test]
    fn test_unknown_enabled_identifier_is_skipped() {
        let (registry, _) = registry(&["stripe", "manual"]);
        assert_eq!(registry.active_gateways().len(), 1);
        assert!(registry.active_gateways().contains_key("stripe"));
    }

    #[test]
    fn test_nice_name_is_case_insensitive() {
        let (registry, _) = registry(&["stripe"]);
        assert_eq!(registry.nice_name("STRIPE"), "Stripe");
        assert_eq!(registry.nice_name("stripe"), "Stripe");
    }

    #[test]
    fn test_trial_label_is_reserved() {
        let (registry, _) = registry(&["stripe"]);
        assert_eq!(registry.nice_name("TRIAL"), "Trial");
        assert_eq!(registry.nice_name("trial"), "Trial");
    }

    #[test]
    fn test_unknown_key_echoes_back() {
        let (registry, _) = registry(&["stripe"]);
        assert_eq!(registry.nice_name("2checkout"), "2checkout");
    }

    #[test]
    fn test_is_only_active() {
        let (only_stripe, _) = registry(&["stripe"]);
        assert!(only_stripe.is_only_active("stripe"));
        assert!(!only_stripe.is_only_active("paypal"));

        let (both, _) = registry(&["stripe", "paypal"]);
        assert!(!both.is_only_active("stripe"));
    }

    #[test]
    fn test_last_gateway_used() {
        let (registry, history) = registry(&["stripe", "paypal"]);
        assert!(!registry.is_last_gateway_used(TenantId(9), "stripe"));

        history.record_use(TenantId(9), "Stripe");
        assert!(registry.is_last_gateway_used(TenantId(9), "stripe"));
        assert!(!registry.is_last_gateway_used(TenantId(9), "paypal"));
    }

    #[test]
    fn test_from_config() {
        let config = crate::config::BillingConfig::new(vec!["Stripe".into()]);
        let registry = GatewayRegistry::from_config(
            vec![Arc::new(TestGateway {
                key: "stripe",
                name: "Stripe",
            })],
            &config,
            Arc::new(MemoryGatewayHistory::new()),
            CurrencyTable::default(),
        );
        assert!(registry.is_only_active("stripe"));
    }

    #[test]
    fn test_supports_currency() {
        let (registry, _) = registry(&["stripe", "paypal"]);
        assert!(registry.supports_currency("usd", "stripe"));
        assert!(registry.supports_currency("SGD", "stripe"));
        assert!(!registry.supports_currency("SGD", "paypal"));
        assert!(!registry.supports_currency("XYZ", "stripe"));
    }
}
