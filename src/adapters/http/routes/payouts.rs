use std::sync::Arc;

use super::common::*;
use crate::application::use_cases::payouts::PayoutUseCases;

pub fn router() -> Router<AppState> {
    Router::new().route("/request", post(request_payout))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayoutRequestPayload {
    creator_id: Uuid,
}

/// POST /api/payouts/request
async fn request_payout(
    State(payouts): State<Arc<PayoutUseCases>>,
    Json(payload): Json<PayoutRequestPayload>,
) -> AppResult<impl IntoResponse> {
    let receipt = payouts.request_payout(payload.creator_id).await?;
    Ok(Json(json!({
        "success": true,
        "payoutId": receipt.payout_id,
        "amount": receipt.amount,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    use crate::{
        domain::entities::payout_status::{PayoutAccountStatus, PayoutStatus},
        infra::dummy_gateway::DummyScenario,
        test_utils::{TestAppStateBuilder, create_test_creator, create_test_payout},
    };

    fn server(app_state: AppState) -> TestServer {
        TestServer::new(router().with_state(app_state)).unwrap()
    }

    fn onboarded(earnings: i64) -> crate::application::use_cases::ledger::CreatorProfile {
        create_test_creator(|c| {
            c.total_earnings = earnings;
            c.payout_account_id = Some("acct_test_1".into());
            c.payout_account_status = Some(PayoutAccountStatus::Verified);
        })
    }

    #[tokio::test]
    async fn pays_out_pending_balance() {
        let creator = onboarded(12_500);
        let creator_id = creator.id;
        let (app_state, ledger, gateway) = TestAppStateBuilder::new()
            .with_creator(creator)
            .build_with_mocks();
        let server = server(app_state);

        let response = server
            .post("/request")
            .json(&json!({ "creatorId": creator_id }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["amount"], 12_500);

        let transfers = gateway.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].destination_account, "acct_test_1");
        let payouts = ledger.payouts();
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].status, PayoutStatus::Pending);
        assert!(payouts[0].transfer_id.is_some());
    }

    #[tokio::test]
    async fn balance_below_minimum_is_rejected() {
        let creator = onboarded(8_000);
        let creator_id = creator.id;
        let server = server(
            TestAppStateBuilder::new()
                .with_creator(creator)
                .with_payout(create_test_payout(creator_id, |p| {
                    p.amount = 5_000;
                    p.transfer_id = Some("tr_earlier".into());
                }))
                .build(),
        );

        let response = server
            .post("/request")
            .json(&json!({ "creatorId": creator_id }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Minimum payout amount is $50");
    }

    #[tokio::test]
    async fn creator_without_verified_account_is_rejected() {
        let creator = create_test_creator(|c| c.total_earnings = 10_000);
        let creator_id = creator.id;
        let server = server(TestAppStateBuilder::new().with_creator(creator).build());

        let response = server
            .post("/request")
            .json(&json!({ "creatorId": creator_id }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Creator not onboarded");
    }

    #[tokio::test]
    async fn failed_transfer_returns_502_and_marks_payout_failed() {
        let creator = onboarded(10_000);
        let creator_id = creator.id;
        let (app_state, ledger, _gateway) = TestAppStateBuilder::new()
            .with_creator(creator)
            .with_scenario(DummyScenario::Unavailable)
            .build_with_mocks();
        let server = server(app_state);

        server
            .post("/request")
            .json(&json!({ "creatorId": creator_id }))
            .await
            .assert_status(StatusCode::BAD_GATEWAY);

        let payouts = ledger.payouts();
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].status, PayoutStatus::Failed);
    }

    #[tokio::test]
    async fn lost_transfer_response_keeps_payout_pending_for_retry() {
        let creator = onboarded(10_000);
        let creator_id = creator.id;
        let (app_state, ledger, gateway) = TestAppStateBuilder::new()
            .with_creator(creator)
            .with_scenario(DummyScenario::LostResponse)
            .build_with_mocks();
        let server = server(app_state);
        let request = json!({ "creatorId": creator_id });

        let response = server.post("/request").json(&request).await;
        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Payout failed");
        assert_eq!(ledger.payouts()[0].status, PayoutStatus::Pending);

        gateway.set_scenario(DummyScenario::Success);
        let response = server.post("/request").json(&request).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["amount"], 10_000);

        assert_eq!(ledger.payouts().len(), 1);
        assert_eq!(gateway.transfers().len(), 1);
    }

    #[tokio::test]
    async fn unknown_creator_returns_404() {
        let server = server(TestAppStateBuilder::new().build());

        server
            .post("/request")
            .json(&json!({ "creatorId": Uuid::new_v4() }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
