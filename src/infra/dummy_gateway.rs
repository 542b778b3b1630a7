use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{
        AccountLink, ConnectedAccount, ConnectedAccountRequest, CreateIntentRequest,
        GatewayIntent, GatewayIntentStatus, PaymentGatewayPort, Transfer, TransferRequest,
    },
};

/// Outcome the dummy gateway simulates for new intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DummyScenario {
    /// Intents are created and report `succeeded`.
    #[default]
    Success,
    /// Intents are created, then report `requires_payment_method`.
    Decline,
    /// Intents are created, then stay `processing`.
    Processing,
    /// Every call fails as if the provider were down.
    Unavailable,
    /// Calls are applied but the response never arrives.
    LostResponse,
}

impl DummyScenario {
    fn intent_status(&self) -> GatewayIntentStatus {
        match self {
            DummyScenario::Success | DummyScenario::Unavailable | DummyScenario::LostResponse => {
                GatewayIntentStatus::Succeeded
            }
            DummyScenario::Decline => GatewayIntentStatus::RequiresPaymentMethod,
            DummyScenario::Processing => GatewayIntentStatus::Processing,
        }
    }
}

#[derive(Default)]
struct DummyState {
    scenario: DummyScenario,
    intents: HashMap<String, GatewayIntent>,
    by_idempotency_key: HashMap<String, String>,
    requests: Vec<(String, CreateIntentRequest)>,
    accounts: Vec<ConnectedAccountRequest>,
    transfers: Vec<TransferRequest>,
}

/// Payment gateway that keeps everything in memory.
///
/// Used for local development and as the gateway in tests. Idempotency keys
/// behave like the real provider: a repeated key returns the original intent.
#[derive(Default)]
pub struct DummyGateway {
    state: Mutex<DummyState>,
}

impl DummyGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scenario(scenario: DummyScenario) -> Self {
        let gateway = Self::new();
        gateway.set_scenario(scenario);
        gateway
    }

    fn state(&self) -> MutexGuard<'_, DummyState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_scenario(&self, scenario: DummyScenario) {
        self.state().scenario = scenario;
    }

    /// Makes an intent retrievable without going through creation.
    pub fn register_intent(&self, id: &str, amount: i64, status: GatewayIntentStatus) {
        self.state().intents.insert(
            id.to_string(),
            GatewayIntent {
                id: id.to_string(),
                client_secret: Some(format!("{id}_secret_dummy")),
                status,
                amount,
                metadata: HashMap::new(),
            },
        );
    }

    pub fn intents_created(&self) -> usize {
        self.state().intents.len()
    }

    pub fn last_request(&self) -> Option<CreateIntentRequest> {
        self.state().requests.last().map(|(_, r)| r.clone())
    }

    pub fn last_request_intent_id(&self) -> Option<String> {
        self.state().requests.last().map(|(id, _)| id.clone())
    }

    pub fn accounts_created(&self) -> usize {
        self.state().accounts.len()
    }

    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.state().transfers.clone()
    }

    fn ensure_available(state: &DummyState) -> AppResult<()> {
        if state.scenario == DummyScenario::Unavailable {
            return Err(AppError::gateway("Payment gateway unavailable", "dummy gateway unavailable"));
        }
        Ok(())
    }

    /// Hands back the result of an already applied call, unless the
    /// scenario drops it on the way back.
    fn respond<T>(state: &DummyState, value: T) -> AppResult<T> {
        if state.scenario == DummyScenario::LostResponse {
            return Err(AppError::gateway_outcome_unknown(
                "Payment gateway unavailable",
                "dummy gateway response lost",
            ));
        }
        Ok(value)
    }
}

#[async_trait]
impl PaymentGatewayPort for DummyGateway {
    async fn create_payment_intent(&self, request: &CreateIntentRequest) -> AppResult<GatewayIntent> {
        let mut state = self.state();
        Self::ensure_available(&state)?;

        if let Some(key) = &request.idempotency_key
            && let Some(existing) = state
                .by_idempotency_key
                .get(key)
                .and_then(|id| state.intents.get(id))
        {
            return Self::respond(&state, existing.clone());
        }

        let id = format!("pi_dummy_{}", Uuid::new_v4().simple());
        let intent = GatewayIntent {
            id: id.clone(),
            client_secret: Some(format!("{id}_secret_{}", Uuid::new_v4().simple())),
            status: state.scenario.intent_status(),
            amount: request.amount,
            metadata: request.metadata.to_pairs().into_iter().collect(),
        };
        state.intents.insert(id.clone(), intent.clone());
        if let Some(key) = &request.idempotency_key {
            state.by_idempotency_key.insert(key.clone(), id.clone());
        }
        state.requests.push((id, request.clone()));
        Self::respond(&state, intent)
    }

    async fn retrieve_payment_intent(&self, intent_id: &str) -> AppResult<GatewayIntent> {
        let state = self.state();
        Self::ensure_available(&state)?;
        state
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Payment intent not found".into()))
    }

    async fn create_connected_account(
        &self,
        request: &ConnectedAccountRequest,
    ) -> AppResult<ConnectedAccount> {
        let mut state = self.state();
        Self::ensure_available(&state)?;
        state.accounts.push(request.clone());
        let account = ConnectedAccount {
            id: format!("acct_dummy_{}", request.creator_id.simple()),
        };
        Self::respond(&state, account)
    }

    async fn create_account_link(
        &self,
        account_id: &str,
        _refresh_url: &str,
        return_url: &str,
    ) -> AppResult<AccountLink> {
        let state = self.state();
        Self::ensure_available(&state)?;
        Ok(AccountLink {
            url: format!("{return_url}&account={account_id}"),
        })
    }

    async fn create_transfer(&self, request: &TransferRequest) -> AppResult<Transfer> {
        let mut state = self.state();
        Self::ensure_available(&state)?;
        // Same key, same transfer: a replay moves no money.
        if !state
            .transfers
            .iter()
            .any(|t| t.idempotency_key == request.idempotency_key)
        {
            state.transfers.push(request.clone());
        }
        let transfer = Transfer {
            id: format!("tr_dummy_{}", request.payout_id.simple()),
        };
        Self::respond(&state, transfer)
    }
}
