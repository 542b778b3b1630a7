use async_trait::async_trait;
use secrecy::SecretString;
use std::time::Duration;

use crate::{
    app_error::AppResult,
    application::ports::payment_gateway::{
        AccountLink, ConnectedAccount, ConnectedAccountRequest, CreateIntentRequest,
        GatewayIntent, PaymentGatewayPort, Transfer, TransferRequest,
    },
    infra::stripe_client::StripeClient,
};

/// Adapter that wraps StripeClient to implement PaymentGatewayPort.
///
/// Translates port requests into Stripe's form-encoded parameters.
#[derive(Clone)]
pub struct StripeGateway {
    client: StripeClient,
}

impl StripeGateway {
    pub fn new(secret_key: SecretString, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: StripeClient::new(secret_key, timeout)?,
        })
    }

    fn intent_params(request: &CreateIntentRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.to_lowercase()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        if let Some(description) = &request.description {
            params.push(("description".to_string(), description.clone()));
        }
        if let (Some(fee), Some(destination)) =
            (request.application_fee, &request.destination_account)
        {
            params.push(("application_fee_amount".to_string(), fee.to_string()));
            params.push(("transfer_data[destination]".to_string(), destination.clone()));
        }
        for (key, value) in request.metadata.to_pairs() {
            params.push((format!("metadata[{}]", key), value));
        }
        params
    }

    fn account_params(request: &ConnectedAccountRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("type".to_string(), "express".to_string()),
            ("country".to_string(), request.country.to_uppercase()),
            ("email".to_string(), request.email.clone()),
            ("business_type".to_string(), request.business_type.clone()),
            (
                "capabilities[card_payments][requested]".to_string(),
                "true".to_string(),
            ),
            (
                "capabilities[transfers][requested]".to_string(),
                "true".to_string(),
            ),
            (
                "metadata[creator_id]".to_string(),
                request.creator_id.to_string(),
            ),
        ];
        if let Some(phone) = &request.phone {
            let holder = if request.business_type == "individual" {
                "individual"
            } else {
                "company"
            };
            params.push((format!("{}[phone]", holder), phone.clone()));
        }
        params
    }
}

#[async_trait]
impl PaymentGatewayPort for StripeGateway {
    async fn create_payment_intent(&self, request: &CreateIntentRequest) -> AppResult<GatewayIntent> {
        let intent = self
            .client
            .create_payment_intent(
                &Self::intent_params(request),
                request.idempotency_key.as_deref(),
            )
            .await?;
        intent.try_into()
    }

    async fn retrieve_payment_intent(&self, intent_id: &str) -> AppResult<GatewayIntent> {
        self.client
            .retrieve_payment_intent(intent_id)
            .await?
            .try_into()
    }

    async fn create_connected_account(
        &self,
        request: &ConnectedAccountRequest,
    ) -> AppResult<ConnectedAccount> {
        let idempotency_key = format!("connect-{}", request.creator_id);
        let account = self
            .client
            .create_account(&Self::account_params(request), Some(&idempotency_key))
            .await?;
        Ok(ConnectedAccount { id: account.id })
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> AppResult<AccountLink> {
        let params = vec![
            ("account".to_string(), account_id.to_string()),
            ("refresh_url".to_string(), refresh_url.to_string()),
            ("return_url".to_string(), return_url.to_string()),
            ("type".to_string(), "account_onboarding".to_string()),
        ];
        let link = self.client.create_account_link(&params).await?;
        Ok(AccountLink { url: link.url })
    }

    async fn create_transfer(&self, request: &TransferRequest) -> AppResult<Transfer> {
        let params = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.to_lowercase()),
            ("destination".to_string(), request.destination_account.clone()),
            (
                "metadata[payout_id]".to_string(),
                request.payout_id.to_string(),
            ),
        ];
        let transfer = self
            .client
            .create_transfer(&params, &request.idempotency_key)
            .await?;
        Ok(Transfer { id: transfer.id })
    }
}
