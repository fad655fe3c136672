use actix_web::{web, HttpResponse};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::{ApiError, ErrorResponse};
use crate::blockchain::{submit_proof, Block, Ledger, MiningOutcome};

/// State shared by every request handler
#[derive(Debug)]
pub struct NodeState {
    /// Identifier of this node, generated at startup
    pub node_id: String,

    /// The ledger served by this node
    pub ledger: Ledger,
}

impl NodeState {
    /// Wraps a ledger together with a freshly generated node identifier
    pub fn new(ledger: Ledger) -> Self {
        NodeState {
            node_id: Uuid::new_v4().simple().to_string(),
            ledger,
        }
    }
}

/// Data structure for the node state
pub type NodeData = web::Data<NodeState>;

/// Request for the mine endpoint.
///
/// Both fields are optional at the type level so a missing one is reported
/// as such instead of as a generic parse failure.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineRequest {
    /// The proof found by the miner
    pub proof: Option<i64>,

    /// The miner's identifier
    pub id: Option<String>,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    /// The message
    pub message: String,

    /// The newly forged block, absent when the proof was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
}

/// Response for the chain endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChainResponse {
    /// The length of the chain
    pub length: usize,

    /// The blocks in the chain
    pub chain: Vec<Block>,
}

/// Response for the last block endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct LastBlockResponse {
    /// The current tip of the chain
    pub last_block: Block,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PendingTransactionsResponse {
    /// Transactions waiting for the next block
    #[schema(value_type = Vec<Object>)]
    pub pending_transactions: Vec<Value>,
}

/// Submit a proof of work
///
/// Checks the proof against the current last block and forges a new block
/// when it is valid. An invalid or replayed proof is not an error.
#[utoipa::path(
    post,
    path = "/mine",
    request_body = MineRequest,
    responses(
        (status = 200, description = "Block forged, or proof rejected", body = MineResponse),
        (status = 400, description = "Malformed request or missing fields", body = ErrorResponse),
        (status = 500, description = "Ledger invariant violated", body = ErrorResponse)
    )
)]
pub async fn mine(
    state: NodeData,
    mine_req: web::Json<MineRequest>,
) -> Result<HttpResponse, ApiError> {
    let (proof, miner_id) = match mine_req.into_inner() {
        MineRequest {
            proof: Some(proof),
            id: Some(id),
        } => (proof, id),
        _ => return Err(ApiError::MissingFields),
    };

    info!("Miner {} submitted proof {}", miner_id, proof);

    let response = match submit_proof(&state.ledger, proof)? {
        MiningOutcome::Forged(block) => MineResponse {
            message: "New Block Forged".to_string(),
            block: Some(block),
        },
        MiningOutcome::Rejected => MineResponse {
            message: "Proof invalid or already submitted".to_string(),
            block: None,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Get the full chain
#[utoipa::path(
    get,
    path = "/chain",
    responses(
        (status = 200, description = "Chain retrieved successfully", body = ChainResponse)
    )
)]
pub async fn full_chain(state: NodeData) -> Result<HttpResponse, ApiError> {
    let chain = state.ledger.chain()?;

    Ok(HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        chain,
    }))
}

/// Get the last block
///
/// Miners fetch this block and search for a proof against it
#[utoipa::path(
    get,
    path = "/last_block",
    responses(
        (status = 200, description = "Last block retrieved successfully", body = LastBlockResponse)
    )
)]
pub async fn last_block(state: NodeData) -> Result<HttpResponse, ApiError> {
    let last_block = state.ledger.last_block()?;

    Ok(HttpResponse::Ok().json(LastBlockResponse { last_block }))
}

/// Check if the chain is valid
#[utoipa::path(
    get,
    path = "/validate",
    responses(
        (status = 200, description = "Chain validation status", body = ValidateResponse)
    )
)]
pub async fn validate_chain(state: NodeData) -> Result<HttpResponse, ApiError> {
    let valid = state.ledger.is_valid()?;

    Ok(HttpResponse::Ok().json(ValidateResponse { valid }))
}

/// Get all pending transactions
#[utoipa::path(
    get,
    path = "/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions retrieved successfully", body = PendingTransactionsResponse)
    )
)]
pub async fn get_pending_transactions(state: NodeData) -> Result<HttpResponse, ApiError> {
    let pending_transactions = state.ledger.pending_transactions()?;

    Ok(HttpResponse::Ok().json(PendingTransactionsResponse {
        pending_transactions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::configure_routes;
    use crate::blockchain::{hash_block, proof_of_work, valid_proof, GENESIS_PREVIOUS_HASH};
    use actix_web::http::header::ContentType;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    fn node() -> NodeData {
        web::Data::new(NodeState::new(Ledger::new()))
    }

    fn tip_proof(state: &NodeData) -> i64 {
        proof_of_work(&state.ledger.last_block().unwrap().canonical_string())
    }

    #[actix_web::test]
    async fn test_get_chain() {
        let state = node();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/chain").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["length"], 1);
        assert_eq!(body["chain"][0]["index"], 1);
        assert_eq!(body["chain"][0]["proof"], 100);
        assert_eq!(body["chain"][0]["previous_hash"], GENESIS_PREVIOUS_HASH);
        assert_eq!(body["chain"][0]["transactions"], json!([]));
        assert!(body["chain"][0]["timestamp"].is_f64());
    }

    #[actix_web::test]
    async fn test_get_last_block() {
        let state = node();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/last_block").to_request();
        let body: LastBlockResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.last_block, state.ledger.last_block().unwrap());
    }

    #[actix_web::test]
    async fn test_mine_valid_proof() {
        let state = node();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
        let genesis = state.ledger.last_block().unwrap();
        let proof = tip_proof(&state);

        let req = test::TestRequest::post()
            .uri("/mine")
            .set_json(json!({"proof": proof, "id": "miner-1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "New Block Forged");
        assert_eq!(body["block"]["index"], 2);
        assert_eq!(body["block"]["proof"], proof);
        assert_eq!(body["block"]["previous_hash"], hash_block(&genesis));

        let req = test::TestRequest::get().uri("/chain").to_request();
        let body: ChainResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.length, 2);
    }

    #[actix_web::test]
    async fn test_mine_invalid_proof() {
        let state = node();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
        let block_string = state.ledger.last_block().unwrap().canonical_string();
        let proof = (0..).find(|p| !valid_proof(&block_string, *p)).unwrap();

        let req = test::TestRequest::post()
            .uri("/mine")
            .set_json(json!({"proof": proof, "id": "miner-1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"message": "Proof invalid or already submitted"}));
        assert_eq!(state.ledger.len().unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_mine_negative_proof_is_rejected_not_malformed() {
        let state = node();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
        let block_string = state.ledger.last_block().unwrap().canonical_string();
        let proof = (1..).map(|p: i64| -p).find(|p| !valid_proof(&block_string, *p)).unwrap();

        let req = test::TestRequest::post()
            .uri("/mine")
            .set_json(json!({"proof": proof, "id": "miner-1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"message": "Proof invalid or already submitted"}));
        assert_eq!(state.ledger.len().unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_mine_replayed_proof() {
        let state = node();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;
        let proof = tip_proof(&state);

        let submit = || {
            test::TestRequest::post()
                .uri("/mine")
                .set_json(json!({"proof": proof, "id": "miner-1"}))
                .to_request()
        };

        let first: Value = test::call_and_read_body_json(&app, submit()).await;
        assert_eq!(first["message"], "New Block Forged");

        if valid_proof(&state.ledger.last_block().unwrap().canonical_string(), proof) {
            return;
        }
        let second: Value = test::call_and_read_body_json(&app, submit()).await;
        assert_eq!(second["message"], "Proof invalid or already submitted");
        assert_eq!(state.ledger.len().unwrap(), 2);
    }

    #[actix_web::test]
    async fn test_mine_missing_fields() {
        let state = node();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        for payload in [json!({"proof": 1}), json!({"id": "miner-1"}), json!({})] {
            let req = test::TestRequest::post().uri("/mine").set_json(payload).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "Missing proof or id");
        }

        assert_eq!(state.ledger.len().unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_mine_malformed_body() {
        let state = node();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::post()
            .uri("/mine")
            .insert_header(ContentType::json())
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Malformed request body"));

        let req = test::TestRequest::post()
            .uri("/mine")
            .set_json(json!({"proof": "twelve", "id": "miner-1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.ledger.len().unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_validate_and_pending() {
        let state = node();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/validate").to_request();
        let body: ValidateResponse = test::call_and_read_body_json(&app, req).await;
        assert!(body.valid);

        let req = test::TestRequest::get().uri("/transactions/pending").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"pending_transactions": []}));
    }
}
