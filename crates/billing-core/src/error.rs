//! Billing Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, BillingError>;

/// Billing-related errors
///
/// Vendor failures are split into distinct categories so callers can apply
/// differentiated retry policy instead of folding everything into one
/// failure sentinel.
#[derive(Error, Debug)]
pub enum BillingError {
    /// Transient vendor API error (network, rate limit, 5xx)
    #[error("Vendor error: {0}")]
    Vendor(String),

    /// The requested record does not exist on the vendor side
    #[error("Not found: {0}")]
    NotFound(String),

    /// The vendor rejected the request (bad parameters, declined card)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Binding store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Cache backend error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BillingError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::Vendor(_) | BillingError::Storage(_))
    }

    /// Check if this error means "the record does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(self, BillingError::NotFound(_))
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            BillingError::Vendor(_) => "Payment processing failed. Please try again.",
            BillingError::NotFound(_) => "The requested billing record was not found.",
            BillingError::Validation(_) => "The payment details were rejected.",
            BillingError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(BillingError::Vendor("timeout".into()).is_retryable());
        assert!(BillingError::Storage("deadlock".into()).is_retryable());
        assert!(!BillingError::NotFound("cus_x".into()).is_retryable());
        assert!(!BillingError::Validation("bad token".into()).is_retryable());
    }

    #[test]
    fn test_not_found_is_distinct() {
        assert!(BillingError::NotFound("cus_x".into()).is_not_found());
        assert!(!BillingError::Vendor("down".into()).is_not_found());
    }
}
