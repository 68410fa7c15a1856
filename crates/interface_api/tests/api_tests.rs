//! HTTP API tests against the in-memory claim store

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use core_kernel::ProductId;
use domain_claims::{ClaimLedger, ClaimStatus, InMemoryClaimStore, OpenClaimRequest};
use interface_api::{create_router, AppState};
use test_utils::{ClauseFixtures, EngineFixtures, FactFixtures};

struct Harness {
    server: TestServer,
    store: Arc<InMemoryClaimStore>,
    product_id: ProductId,
}

async fn harness() -> Harness {
    let store = Arc::new(InMemoryClaimStore::new());
    let product_id = ProductId::new_v7();
    store.insert_clauses(ClauseFixtures::standard_catalog(product_id)).await;

    let ledger = ClaimLedger::new(store.clone(), store.clone(), Arc::new(EngineFixtures::default_engine()));
    let server = TestServer::new(create_router(AppState::new(ledger))).unwrap();

    Harness {
        server,
        store,
        product_id,
    }
}

impl Harness {
    /// Seeds a diagnosis and receipt and returns the request body
    async fn claim_body(&self, admission_days: u32, total: i64) -> Value {
        let mut diagnosis = FactFixtures::inpatient_fracture();
        diagnosis.admission_days = admission_days;
        let receipt = FactFixtures::receipt(total);

        let request = OpenClaimRequest {
            product_id: self.product_id,
            diagnosis_id: diagnosis.id,
            receipt_id: receipt.id,
            claim_reason: Some("Slipped on stairs".to_string()),
        };
        self.store.insert_diagnosis(diagnosis).await;
        self.store.insert_receipt(receipt).await;

        json!({
            "product_id": request.product_id.as_uuid(),
            "diagnosis_id": request.diagnosis_id.as_uuid(),
            "receipt_id": request.receipt_id.as_uuid(),
            "claim_reason": request.claim_reason,
        })
    }

    async fn submit(&self, admission_days: u32, total: i64) -> Value {
        let body = self.claim_body(admission_days, total).await;
        let response = self.server.post("/api/v1/claims").json(&body).await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }
}

// ============================================================================
// Health
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoints() {
        let h = harness().await;

        h.server.get("/health").await.assert_status_ok();

        let ready = h.server.get("/health/ready").await;
        ready.assert_status_ok();
        assert_eq!(ready.json::<Value>()["repository"]["adapter_id"], "in-memory-claim-store");
    }
}

// ============================================================================
// Claims
// ============================================================================

mod claims_tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_claim_calculates() {
        let h = harness().await;

        let body = h.submit(5, 800_000).await;

        assert_eq!(body["claim"]["status"], "approved");
        assert_eq!(body["claim"]["currency"], "KRW");
        assert_eq!(body["calculation"]["currency"], "KRW");
        // hospital daily 250,000 plus the fracture diagnosis 200,000
        assert_eq!(body["calculation"]["line_items"].as_array().unwrap().len(), 2);
        assert!(body["calculation"]["reduction_percentage"].is_null());
    }

    #[tokio::test]
    async fn test_get_claim_detail_and_summary() {
        let h = harness().await;
        let body = h.submit(0, 100_000).await;
        let id = body["claim"]["id"].as_str().unwrap().to_string();

        let detail = h.server.get(&format!("/api/v1/claims/{}", id)).await;
        detail.assert_status_ok();
        let detail = detail.json::<Value>();
        assert_eq!(detail["line_items"].as_array().unwrap().len(), 2);

        let summary = h.server.get(&format!("/api/v1/claims/{}/summary", id)).await;
        summary.assert_status_ok();
        let narrative = summary.json::<Value>()["narrative"].as_str().unwrap().to_string();
        assert!(narrative.contains("is approved with ₩100,000"));
    }

    #[tokio::test]
    async fn test_recalculate() {
        let h = harness().await;
        let body = h.submit(5, 800_000).await;
        let id = body["claim"]["id"].as_str().unwrap().to_string();

        let response = h.server.post(&format!("/api/v1/claims/{}/calculate", id)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["total_amount"], body["calculation"]["total_amount"]);
    }

    #[tokio::test]
    async fn test_paid_claim_conflicts() {
        let h = harness().await;
        let body = h.submit(5, 800_000).await;
        let id: uuid::Uuid = body["claim"]["id"].as_str().unwrap().parse().unwrap();
        h.store
            .set_status(core_kernel::ClaimId::from_uuid(id), ClaimStatus::Paid)
            .await
            .unwrap();

        let response = h.server.post(&format!("/api/v1/claims/{}/calculate", id)).await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "conflict");
    }

    #[tokio::test]
    async fn test_unknown_claim_is_404() {
        let h = harness().await;
        let response = h
            .server
            .get(&format!("/api/v1/claims/{}", uuid::Uuid::now_v7()))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_patient_mismatch_is_400() {
        let h = harness().await;
        let mut body = h.claim_body(0, 100_000).await;

        let other = test_utils::ReceiptBuilder::new().with_patient_name("Lee Jiyoung").build();
        body["receipt_id"] = json!(other.id.as_uuid());
        h.store.insert_receipt(other).await;

        let response = h.server.post("/api/v1/claims").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_body_is_422() {
        let h = harness().await;
        let mut body = h.claim_body(0, 100_000).await;
        body["claim_reason"] = json!("x".repeat(2001));

        let response = h.server.post("/api/v1/claims").json(&body).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_delete_claim_hides_it() {
        let h = harness().await;
        let submitted = h.submit(5, 800_000).await;
        let path = format!("/api/v1/claims/{}", submitted["claim"]["id"].as_str().unwrap());

        h.server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);

        h.server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
        h.server.delete(&path).await.assert_status(StatusCode::NOT_FOUND);
        h.server
            .post(&format!("{}/calculate", path))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let listed = h.server.get("/api/v1/claims").await.json::<Value>();
        assert!(listed.as_array().unwrap().is_empty());
        let stats = h.server.get("/api/v1/claims/statistics").await.json::<Value>();
        assert_eq!(stats["total_claims"], 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_patient_name() {
        let h = harness().await;
        h.submit(0, 100_000).await;

        let found = h
            .server
            .get("/api/v1/claims")
            .add_query_param("patient_name", "minsu")
            .await;
        found.assert_status_ok();
        assert_eq!(found.json::<Value>().as_array().unwrap().len(), 1);

        let missing = h
            .server
            .get("/api/v1/claims")
            .add_query_param("patient_name", "Lee")
            .await
            .json::<Value>();
        assert!(missing.as_array().unwrap().is_empty());

        let empty = h.server.get("/api/v1/claims").add_query_param("patient_name", "").await;
        empty.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_list_and_statistics() {
        let h = harness().await;
        h.submit(5, 800_000).await;
        h.submit(0, 100_000).await;

        let listed = h
            .server
            .get("/api/v1/claims")
            .add_query_param("status", "approved")
            .add_query_param("limit", 1)
            .await;
        listed.assert_status_ok();
        assert_eq!(listed.json::<Value>().as_array().unwrap().len(), 1);

        let bad = h.server.get("/api/v1/claims").add_query_param("status", "closed").await;
        bad.assert_status(StatusCode::BAD_REQUEST);

        let stats = h.server.get("/api/v1/claims/statistics").await;
        stats.assert_status_ok();
        let stats = stats.json::<Value>();
        assert_eq!(stats["total_claims"], 2);
        assert_eq!(stats["approved"], 2);
    }
}
