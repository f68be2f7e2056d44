//! HTTP routes: thin JSON handlers over the ledger core.
//!
//! Handlers validate the payload, call exactly one ledger operation, and map
//! the result into the `{ok, ...}` envelope. No business logic lives here.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stakehub_core::types::{BetDirection, Currency};
use stakehub_core::WebhookOutcome;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/staking/open", post(open_stake))
        .route("/founder/join", post(join_founder))
        .route("/trading/join", post(join_trading))
        .route("/trading/bet", post(place_bet))
        .route("/wallet/request-deposit", post(request_deposit))
        .route("/wallet/request-withdraw", post(request_withdraw))
        .route("/wallet/deposit-address", get(deposit_address))
        .route("/wallet/webhook", post(webhook))
        .with_state(state)
}

// ════════════════════════════════════════════════════════════════════════════
// REQUEST / RESPONSE TYPES
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct OpenStakeReq {
    amount: Decimal,
    tier: String,
    #[serde(default, rename = "autoCompound")]
    auto_compound: bool,
}

#[derive(Debug, Serialize)]
struct OpenStakeResp {
    ok: bool,
    #[serde(rename = "stakeId")]
    stake_id: String,
    #[serde(rename = "dailyPct")]
    daily_pct: Decimal,
}

#[derive(Debug, Serialize)]
struct MessageResp {
    ok: bool,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BetReq {
    #[serde(rename = "sessionId")]
    session_id: String,
    direction: String,
    amount: Decimal,
}

#[derive(Debug, Serialize)]
struct BetResp {
    ok: bool,
    #[serde(rename = "betId")]
    bet_id: String,
}

#[derive(Debug, Deserialize)]
struct DepositReq {
    amount: Decimal,
    currency: String,
    #[serde(rename = "txHash")]
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
struct WithdrawReq {
    amount: Decimal,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct AddressQuery {
    currency: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddressResp {
    ok: bool,
    address: String,
}

#[derive(Debug, Serialize)]
struct HealthResp {
    healthy: bool,
    version: String,
    uptime_secs: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// HANDLERS
// ════════════════════════════════════════════════════════════════════════════

async fn health(State(state): State<AppState>) -> Json<HealthResp> {
    let uptime_secs = stakehub_core::types::now_ms().saturating_sub(state.started_at) / 1000;
    Json(HealthResp {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs,
    })
}

async fn open_stake(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    Json(req): Json<OpenStakeReq>,
) -> Result<Json<OpenStakeResp>, ApiError> {
    let opened = state
        .ledger
        .open_stake(&uid, req.amount, &req.tier, req.auto_compound)?;
    Ok(Json(OpenStakeResp {
        ok: true,
        stake_id: opened.stake_id,
        daily_pct: opened.daily_pct,
    }))
}

async fn join_founder(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
) -> Result<Json<MessageResp>, ApiError> {
    let cost = state.ledger.become_founder(&uid)?;
    Ok(Json(MessageResp {
        ok: true,
        message: format!("Founder membership activated for {cost} USDT."),
    }))
}

async fn join_trading(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
) -> Result<Json<MessageResp>, ApiError> {
    let outcome = state.ledger.join_trading_hub(&uid)?;
    let message = if outcome.joined_now {
        format!("Joined the trading hub with a {} bonus.", outcome.gift)
    } else {
        "Already a trading hub member.".to_string()
    };
    Ok(Json(MessageResp { ok: true, message }))
}

async fn place_bet(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    Json(req): Json<BetReq>,
) -> Result<Json<BetResp>, ApiError> {
    let direction = BetDirection::parse(&req.direction).ok_or_else(ApiError::invalid_payload)?;
    if req.session_id.is_empty() {
        return Err(ApiError::invalid_payload());
    }
    let bet_id = state
        .ledger
        .place_bet(&uid, &req.session_id, direction, req.amount)?;
    Ok(Json(BetResp { ok: true, bet_id }))
}

async fn request_deposit(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    Json(req): Json<DepositReq>,
) -> Result<Json<MessageResp>, ApiError> {
    let currency = Currency::parse(&req.currency).ok_or_else(ApiError::invalid_payload)?;
    state
        .ledger
        .request_deposit(&uid, req.amount, currency, &req.tx_hash)?;
    Ok(Json(MessageResp {
        ok: true,
        message: format!(
            "Your deposit request for {} {} has been submitted for review.",
            req.amount,
            currency.code()
        ),
    }))
}

async fn request_withdraw(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    Json(req): Json<WithdrawReq>,
) -> Result<Json<MessageResp>, ApiError> {
    let currency = Currency::parse(&req.currency).ok_or_else(ApiError::invalid_payload)?;
    state.ledger.request_withdrawal(&uid, req.amount, currency)?;
    Ok(Json(MessageResp {
        ok: true,
        message: format!(
            "Your withdrawal request for {} {} has been submitted for review.",
            req.amount,
            currency.code()
        ),
    }))
}

async fn deposit_address(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    Query(query): Query<AddressQuery>,
) -> Result<Json<AddressResp>, ApiError> {
    let currency = match query.currency.as_deref() {
        Some(code) => Currency::parse(code).ok_or_else(ApiError::invalid_payload)?,
        None => Currency::Usdt,
    };
    let account = state
        .ledger
        .store()
        .account(&uid)
        .ok_or_else(ApiError::not_found)?;
    let address = account
        .wallets
        .get(&currency)
        .cloned()
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(AddressResp { ok: true, address }))
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get("x-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError {
            status: axum::http::StatusCode::UNAUTHORIZED,
            code: "invalid_signature",
        })?;
    let outcome = state.webhook.process(&body, signature)?;
    let body = match outcome {
        WebhookOutcome::Credited { user_id, .. } => {
            serde_json::json!({ "ok": true, "message": format!("Processed deposit for user {user_id}") })
        }
        WebhookOutcome::Ignored(reason) => {
            serde_json::json!({ "ok": true, "message": reason })
        }
    };
    Ok(Json(body))
}
