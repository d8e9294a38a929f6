//! Stripe Gateway Descriptor

use billing_core::gateway::Gateway;

/// Registry descriptor for the Stripe gateway
pub struct StripeGateway;

impl Gateway for StripeGateway {
    fn key(&self) -> &str {
        "stripe"
    }

    fn display_name(&self) -> &str {
        "Stripe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor() {
        let gateway = StripeGateway;
        assert_eq!(gateway.key(), "stripe");
        assert_eq!(gateway.display_name(), "Stripe");
    }
}
