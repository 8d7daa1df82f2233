//! Axum REST API handlers.
//!
//! Reads come from two places: contract state is read straight from the
//! live [`Chain`], event history from the SQLite index. Writes are
//! forwarded to the chain with the caller named in the request body.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use wakaf_protocol::types::amount_serde;
use wakaf_protocol::{
    Address, Amount, Chain, Deployment, MoneyOutRecord, Receipt, TokenInfo, MAX_REASON_LEN,
};

use crate::db;
use crate::errors::{IndexerError, Result};
use crate::events::{ApprovalRow, MoneyOutRow, NazirEventRow, OwnershipRow, TransferRow};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    pub chain: Arc<Chain>,
    pub deployment: Deployment,
}

pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/token", get(get_token))
        .route("/balances/:address", get(get_balance))
        .route("/allowances/:owner/:spender", get(get_allowance))
        .route("/nazirs/:address", get(get_nazir))
        .route("/nazirs/:address/money-out", get(get_money_out_records))
        .route("/nazirs/:address/money-out/:index", get(get_money_out))
        .route("/events/transfers", get(get_transfer_events))
        .route("/events/approvals", get(get_approval_events))
        .route("/events/money-out", get(get_money_out_events))
        .route("/events/nazirs", get(get_nazir_events))
        .route("/events/ownership", get(get_ownership_events))
        .route("/tx/mint", post(mint))
        .route("/tx/burn", post(burn))
        .route("/tx/transfer", post(transfer))
        .route("/tx/approve", post(approve))
        .route("/tx/transfer-from", post(transfer_from))
        .route("/tx/transfer-ownership", post(transfer_ownership))
        .route("/tx/add-nazir", post(add_nazir))
        .route("/tx/remove-nazir", post(remove_nazir))
        .route("/tx/money-out", post(money_out))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u32,
}

impl IndexerError {
    pub fn status(&self) -> StatusCode {
        match self {
            IndexerError::Ledger(e) => match e.code() {
                1 => StatusCode::FORBIDDEN,
                5 | 8 => StatusCode::NOT_FOUND,
                6 => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            IndexerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IndexerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub block_number: u64,
    pub token: Address,
    pub wakaf: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub address: Address,
    #[serde(with = "amount_serde")]
    pub balance: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllowanceResponse {
    pub owner: Address,
    pub spender: Address,
    #[serde(with = "amount_serde")]
    pub allowance: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NazirResponse {
    pub address: Address,
    pub is_nazir: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoneyOutRecordsResponse {
    pub nazir: Address,
    pub count: usize,
    pub records: Vec<MoneyOutRecord>,
}

#[derive(Serialize)]
pub struct EventsResponse<T> {
    pub count: usize,
    pub events: Vec<T>,
}

impl<T> From<Vec<T>> for EventsResponse<T> {
    fn from(events: Vec<T>) -> Self {
        Self {
            count: events.len(),
            events,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoneyOutResponse {
    pub record: MoneyOutRecord,
    pub receipt: Receipt,
}

// ─────────────────────────────────────────────────────────
// Request shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MintRequest {
    pub caller: Address,
    pub to: Address,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BurnRequest {
    pub caller: Address,
    pub from: Address,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub caller: Address,
    pub to: Address,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub caller: Address,
    pub spender: Address,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferFromRequest {
    pub caller: Address,
    pub from: Address,
    pub to: Address,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnershipTarget {
    Token,
    Wakaf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferOwnershipRequest {
    pub caller: Address,
    pub target: OwnershipTarget,
    pub new_owner: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NazirRequest {
    pub caller: Address,
    pub nazir: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoneyOutRequest {
    pub caller: Address,
    #[serde(with = "amount_serde")]
    pub amount: Amount,
    pub send_to: Address,
    /// Defaults to the genesis token.
    #[serde(default)]
    pub token: Option<Address>,
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransferFilter {
    pub address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MoneyOutFilter {
    pub nazir: Option<Address>,
}

// ─────────────────────────────────────────────────────────
// Read handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        block_number: state.chain.block_number(),
        token: state.deployment.token,
        wakaf: state.deployment.wakaf,
    })
}

/// `GET /token`
pub async fn get_token(State(state): State<Arc<ApiState>>) -> Result<Json<TokenInfo>> {
    Ok(Json(state.chain.token_info(state.deployment.token)?))
}

/// `GET /balances/:address`
pub async fn get_balance(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<Address>,
) -> Result<Json<BalanceResponse>> {
    let balance = state.chain.balance_of(state.deployment.token, address)?;
    Ok(Json(BalanceResponse { address, balance }))
}

/// `GET /allowances/:owner/:spender`
pub async fn get_allowance(
    State(state): State<Arc<ApiState>>,
    Path((owner, spender)): Path<(Address, Address)>,
) -> Result<Json<AllowanceResponse>> {
    let allowance = state
        .chain
        .allowance(state.deployment.token, owner, spender)?;
    Ok(Json(AllowanceResponse {
        owner,
        spender,
        allowance,
    }))
}

/// `GET /nazirs/:address`
pub async fn get_nazir(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<Address>,
) -> Result<Json<NazirResponse>> {
    let is_nazir = state.chain.get_nazir(state.deployment.wakaf, address)?;
    Ok(Json(NazirResponse { address, is_nazir }))
}

/// `GET /nazirs/:address/money-out`
///
/// Full ledger-side history for one nazir, in append order.
pub async fn get_money_out_records(
    State(state): State<Arc<ApiState>>,
    Path(nazir): Path<Address>,
) -> Result<Json<MoneyOutRecordsResponse>> {
    let records = state
        .chain
        .money_out_records(state.deployment.wakaf, nazir)?;
    Ok(Json(MoneyOutRecordsResponse {
        nazir,
        count: records.len(),
        records,
    }))
}

/// `GET /nazirs/:address/money-out/:index`
pub async fn get_money_out(
    State(state): State<Arc<ApiState>>,
    Path((nazir, index)): Path<(Address, u64)>,
) -> Result<Json<MoneyOutRecord>> {
    Ok(Json(
        state
            .chain
            .get_money_out(state.deployment.wakaf, nazir, index)?,
    ))
}

/// `GET /events/transfers?address=`
pub async fn get_transfer_events(
    State(state): State<Arc<ApiState>>,
    Query(filter): Query<TransferFilter>,
) -> Result<Json<EventsResponse<TransferRow>>> {
    let address = filter.address.map(|a| a.to_string());
    let rows = db::list_transfers(&state.pool, address.as_deref()).await?;
    Ok(Json(rows.into()))
}

/// `GET /events/approvals`
pub async fn get_approval_events(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<EventsResponse<ApprovalRow>>> {
    Ok(Json(db::list_approvals(&state.pool).await?.into()))
}

/// `GET /events/money-out?nazir=`
pub async fn get_money_out_events(
    State(state): State<Arc<ApiState>>,
    Query(filter): Query<MoneyOutFilter>,
) -> Result<Json<EventsResponse<MoneyOutRow>>> {
    let nazir = filter.nazir.map(|a| a.to_string());
    let rows = db::list_money_out(&state.pool, nazir.as_deref()).await?;
    Ok(Json(rows.into()))
}

/// `GET /events/nazirs`
pub async fn get_nazir_events(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<EventsResponse<NazirEventRow>>> {
    Ok(Json(db::list_nazir_events(&state.pool).await?.into()))
}

/// `GET /events/ownership`
pub async fn get_ownership_events(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<EventsResponse<OwnershipRow>>> {
    Ok(Json(db::list_ownership_transfers(&state.pool).await?.into()))
}

// ─────────────────────────────────────────────────────────
// Write handlers
// ─────────────────────────────────────────────────────────

pub async fn mint(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<MintRequest>,
) -> Result<Json<Receipt>> {
    let token = state.deployment.token;
    Ok(Json(state.chain.mint(token, req.caller, req.to, req.amount)?))
}

pub async fn burn(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<BurnRequest>,
) -> Result<Json<Receipt>> {
    let token = state.deployment.token;
    Ok(Json(state.chain.burn(token, req.caller, req.from, req.amount)?))
}

pub async fn transfer(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TransferRequest>,
) -> Result<Json<Receipt>> {
    let token = state.deployment.token;
    Ok(Json(
        state.chain.transfer(token, req.caller, req.to, req.amount)?,
    ))
}

pub async fn approve(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<Receipt>> {
    let token = state.deployment.token;
    Ok(Json(
        state
            .chain
            .approve(token, req.caller, req.spender, req.amount)?,
    ))
}

pub async fn transfer_from(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TransferFromRequest>,
) -> Result<Json<Receipt>> {
    let token = state.deployment.token;
    Ok(Json(state.chain.transfer_from(
        token, req.caller, req.from, req.to, req.amount,
    )?))
}

pub async fn transfer_ownership(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TransferOwnershipRequest>,
) -> Result<Json<Receipt>> {
    let contract = match req.target {
        OwnershipTarget::Token => state.deployment.token,
        OwnershipTarget::Wakaf => state.deployment.wakaf,
    };
    let receipt = state
        .chain
        .transfer_ownership(contract, req.caller, req.new_owner)?;
    info!(%contract, new_owner = %req.new_owner, "ownership transferred");
    Ok(Json(receipt))
}

pub async fn add_nazir(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<NazirRequest>,
) -> Result<Json<Receipt>> {
    let wakaf = state.deployment.wakaf;
    let receipt = state.chain.add_nazir(wakaf, req.caller, req.nazir)?;
    info!(nazir = %req.nazir, "nazir added");
    Ok(Json(receipt))
}

pub async fn remove_nazir(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<NazirRequest>,
) -> Result<Json<Receipt>> {
    let wakaf = state.deployment.wakaf;
    let receipt = state.chain.remove_nazir(wakaf, req.caller, req.nazir)?;
    info!(nazir = %req.nazir, "nazir removed");
    Ok(Json(receipt))
}

/// `POST /tx/money-out`
///
/// The ledger accepts any reason; this endpoint caps it at
/// [`MAX_REASON_LEN`] characters as the dashboard does.
pub async fn money_out(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<MoneyOutRequest>,
) -> Result<Json<MoneyOutResponse>> {
    let length = req.reason.chars().count();
    if length > MAX_REASON_LEN {
        return Err(IndexerError::BadRequest(format!(
            "reason is {length} characters, at most {MAX_REASON_LEN} allowed"
        )));
    }

    let token = req.token.unwrap_or(state.deployment.token);
    let (record, receipt) = state.chain.money_out(
        state.deployment.wakaf,
        req.caller,
        token,
        req.amount,
        req.send_to,
        req.reason,
    )?;
    info!(
        nazir = %req.caller,
        index = record.index,
        amount = %record.amount,
        "money out"
    );
    Ok(Json(MoneyOutResponse { record, receipt }))
}
