//! Stripe Vendor Integration
//!
//! Implements the vendor seam over the official Stripe SDK. Every call is a
//! single synchronous round-trip; retries belong to the caller, guided by
//! `BillingError::is_retryable`.

use async_trait::async_trait;
use chrono::DateTime;
use stripe::{
    Client, CreateCustomer, Customer, CustomerId, Expandable, Invoice, InvoiceStatus,
    ListCustomers, ListInvoices, Object, PaymentSource, PaymentSourceParams,
    RetrieveUpcomingInvoice, TokenId, UpdateCustomer,
};

use billing_core::error::{BillingError, Result};
use billing_core::model::{CardRecord, CustomerRecord, InvoiceRecord};
use billing_core::vendor::{CreateCustomerParams, CustomerFields, CustomerVendor};

/// Stripe-backed customer vendor
pub struct StripeVendor {
    client: Client,
}

impl StripeVendor {
    /// Create a new Stripe vendor client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| BillingError::Config("STRIPE_SECRET_KEY not set".into()))?;
        Ok(Self::new(&secret_key))
    }

    /// Get the underlying Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

fn parse_customer_id(id: &str) -> Result<CustomerId> {
    id.parse::<CustomerId>()
        .map_err(|_| BillingError::Validation(format!("invalid customer id: {id}")))
}

fn parse_token(token: &str) -> Result<TokenId> {
    token
        .parse::<TokenId>()
        .map_err(|_| BillingError::Validation(format!("invalid payment token: {token}")))
}

/// Map a Stripe SDK error onto the billing taxonomy
fn map_stripe_error(err: stripe::StripeError) -> BillingError {
    match &err {
        stripe::StripeError::Stripe(request) => {
            let message = request
                .message
                .clone()
                .unwrap_or_else(|| err.to_string());
            match request.http_status {
                404 => BillingError::NotFound(message),
                400 | 402 => BillingError::Validation(message),
                _ => BillingError::Vendor(message),
            }
        }
        _ => BillingError::Vendor(err.to_string()),
    }
}

fn to_customer_record(customer: Customer) -> CustomerRecord {
    CustomerRecord {
        id: customer.id.to_string(),
        email: customer.email,
        description: customer.description,
        default_source: customer.default_source.as_ref().map(|s| s.id().to_string()),
        created: customer.created.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        metadata: customer.metadata.unwrap_or_default(),
    }
}

fn to_invoice_record(invoice: Invoice, customer_id: &str) -> InvoiceRecord {
    InvoiceRecord {
        id: invoice.id.to_string(),
        customer_id: invoice
            .customer
            .as_ref()
            .map(|c| c.id().to_string())
            .unwrap_or_else(|| customer_id.to_string()),
        amount_due: invoice.amount_due.unwrap_or(0),
        currency: invoice.currency.map(|c| c.to_string()),
        created: invoice.created.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        paid: invoice.paid.unwrap_or(false),
    }
}

fn to_card_record(source: &PaymentSource) -> Result<CardRecord> {
    match source {
        PaymentSource::Card(card) => Ok(CardRecord {
            id: card.id.to_string(),
            brand: card.brand.clone(),
            last4: card.last4.clone(),
            exp_month: card.exp_month,
            exp_year: card.exp_year,
        }),
        other => Err(BillingError::Validation(format!(
            "unsupported payment source type for {}",
            other.id()
        ))),
    }
}

#[async_trait]
impl CustomerVendor for StripeVendor {
    async fn create_customer(&self, params: CreateCustomerParams) -> Result<CustomerRecord> {
        let source = params
            .source_token
            .as_deref()
            .map(parse_token)
            .transpose()?
            .map(PaymentSourceParams::Token);

        let mut create = CreateCustomer::new();
        create.email = Some(&params.email);
        create.description = params.description.as_deref();
        create.source = source;
        if !params.metadata.is_empty() {
            create.metadata = Some(params.metadata.clone());
        }

        let customer = Customer::create(&self.client, create)
            .await
            .map_err(map_stripe_error)?;

        tracing::info!(customer_id = %customer.id, "Created Stripe customer");
        Ok(to_customer_record(customer))
    }

    async fn get_customer(&self, id: &str) -> Result<CustomerRecord> {
        let customer_id = parse_customer_id(id)?;
        let customer = Customer::retrieve(&self.client, &customer_id, &[])
            .await
            .map_err(map_stripe_error)?;

        if customer.deleted {
            return Err(BillingError::NotFound(format!("customer {id} is deleted")));
        }

        Ok(to_customer_record(customer))
    }

    async fn update_customer(&self, id: &str, fields: CustomerFields) -> Result<CustomerRecord> {
        let customer_id = parse_customer_id(id)?;

        let source = fields
            .source_token
            .as_deref()
            .map(parse_token)
            .transpose()?
            .map(PaymentSourceParams::Token);

        let mut update = UpdateCustomer::new();
        update.email = fields.email.as_deref();
        update.description = fields.description.as_deref();
        update.source = source;
        update.metadata = fields.metadata.clone();

        let customer = Customer::update(&self.client, &customer_id, update)
            .await
            .map_err(map_stripe_error)?;

        tracing::info!(customer_id = %id, "Updated Stripe customer");
        Ok(to_customer_record(customer))
    }

    async fn delete_customer(&self, id: &str) -> Result<()> {
        let customer_id = parse_customer_id(id)?;
        Customer::delete(&self.client, &customer_id)
            .await
            .map_err(map_stripe_error)?;

        tracing::info!(customer_id = %id, "Deleted Stripe customer");
        Ok(())
    }

    async fn list_customers(&self, email: &str, limit: u64) -> Result<Vec<CustomerRecord>> {
        let mut list = ListCustomers::new();
        list.email = Some(email);
        list.limit = Some(limit);

        let customers = Customer::list(&self.client, &list)
            .await
            .map_err(map_stripe_error)?;

        Ok(customers.data.into_iter().map(to_customer_record).collect())
    }

    async fn list_invoices(&self, customer_id: &str, limit: u64) -> Result<Vec<InvoiceRecord>> {
        let id = parse_customer_id(customer_id)?;

        let mut list = ListInvoices::new();
        list.customer = Some(id);
        list.limit = Some(limit);
        // Settled invoices only; open and draft invoices are not "last"
        list.status = Some(InvoiceStatus::Paid);

        let invoices = Invoice::list(&self.client, &list)
            .await
            .map_err(map_stripe_error)?;

        Ok(invoices
            .data
            .into_iter()
            .map(|invoice| to_invoice_record(invoice, customer_id))
            .collect())
    }

    async fn upcoming_invoice(&self, customer_id: &str) -> Result<InvoiceRecord> {
        let id = parse_customer_id(customer_id)?;
        let invoice = Invoice::upcoming(&self.client, RetrieveUpcomingInvoice::new(id))
            .await
            .map_err(map_stripe_error)?;

        Ok(to_invoice_record(invoice, customer_id))
    }

    async fn get_source(&self, customer_id: &str, source_id: &str) -> Result<CardRecord> {
        let id = parse_customer_id(customer_id)?;
        let customer = Customer::retrieve(&self.client, &id, &["default_source"])
            .await
            .map_err(map_stripe_error)?;

        match customer.default_source {
            Some(Expandable::Object(source)) if source.id().to_string() == source_id => {
                to_card_record(&source)
            }
            _ => Err(BillingError::NotFound(format!(
                "source {source_id} not attached to customer {customer_id}"
            ))),
        }
    }

    fn name(&self) -> &str {
        "Stripe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_malformed_customer_id_is_validation_error() {
        let vendor = StripeVendor::new("sk_test_offline");
        let err = vendor.get_customer("not a customer id").await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_malformed_token_is_validation_error() {
        let vendor = StripeVendor::new("sk_test_offline");
        let err = vendor
            .create_customer(CreateCustomerParams {
                email: "a@example.com".into(),
                source_token: Some("not a token".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[test]
    fn test_card_record_conversion() {
        let source: PaymentSource = serde_json::from_value(serde_json::json!({
            "object": "card",
            "id": "card_1",
            "brand": "Visa",
            "last4": "4242",
            "exp_month": 12,
            "exp_year": 2030
        }))
        .unwrap();

        assert_eq!(source.id().to_string(), "card_1");

        let card = to_card_record(&source).unwrap();
        assert_eq!(card.id, "card_1");
        assert_eq!(card.last4.as_deref(), Some("4242"));
        assert_eq!(card.exp_month, Some(12));
    }

    #[test]
    fn test_customer_record_conversion() {
        let customer: Customer = serde_json::from_value(serde_json::json!({
            "id": "cus_123",
            "email": "owner@example.com",
            "description": "Example Site",
            "created": 1_700_000_000,
            "metadata": { "username": "owner" }
        }))
        .unwrap();

        let record = to_customer_record(customer);
        assert_eq!(record.id, "cus_123");
        assert_eq!(record.email.as_deref(), Some("owner@example.com"));
        assert_eq!(record.metadata.get("username").map(String::as_str), Some("owner"));
        assert!(record.default_source.is_none());
    }
}
