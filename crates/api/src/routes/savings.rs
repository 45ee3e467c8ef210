//! Savings ledger routes (simpanan, penarikan).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use koperasi_core::savings::{
    DepositInput, HistoryEntry, SavingsSummary, SavingsTransaction, SavingsType, Withdrawal,
    WithdrawalInput,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{member_number, savings_type};
use crate::{AppState, error::ApiResult, middleware::AuthUser, money::Amount};

/// Creates the savings routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/savings/deposits", post(record_deposit))
        .route("/members/{number}/savings", get(savings_summary))
        .route("/members/{number}/savings/{savings_type}/balance", get(savings_balance))
        .route("/members/{number}/savings/{savings_type}/history", get(savings_history))
        .route(
            "/members/{number}/savings/{savings_type}/withdrawals",
            post(record_withdrawal),
        )
        .route("/members/{number}/social-fund-required", get(social_fund_required))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a deposit.
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    /// Depositing member.
    pub member_number: String,
    /// Savings type.
    pub savings_type: SavingsType,
    /// Value date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Amount deposited.
    pub amount: Amount,
    /// Social fund paid alongside.
    #[serde(default)]
    pub social_fund: Option<Amount>,
}

/// Request body for a withdrawal.
#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    /// Value date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Amount withdrawn.
    pub amount: Amount,
}

/// Optional single-date filter.
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Only entries on this date.
    pub date: Option<NaiveDate>,
}

/// Balance of one savings type.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Savings type.
    pub savings_type: SavingsType,
    /// Ledger-derived balance.
    pub balance: Decimal,
}

/// Whether a wajib deposit needs a social fund amount.
#[derive(Debug, Serialize)]
pub struct SocialFundRequiredResponse {
    /// True for the first wajib deposit of the month.
    pub required: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/savings/deposits` - Record a deposit.
async fn record_deposit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<DepositRequest>,
) -> ApiResult<(StatusCode, Json<SavingsTransaction>)> {
    let number = member_number(&request.member_number)?;
    let input = DepositInput {
        savings_type: request.savings_type,
        date: request.date,
        amount: request.amount.into(),
        social_fund: request.social_fund.map_or(Decimal::ZERO, Decimal::from),
    };

    let transaction = state.savings().deposit(&auth.actor, &number, &input).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// POST `/members/{number}/savings/{type}/withdrawals` - Record a withdrawal.
async fn record_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((number, savings_type_raw)): Path<(String, String)>,
    Json(request): Json<WithdrawalRequest>,
) -> ApiResult<(StatusCode, Json<Withdrawal>)> {
    let number = member_number(&number)?;
    let savings_type = savings_type(&savings_type_raw)?;
    let input = WithdrawalInput {
        date: request.date,
        amount: request.amount.into(),
    };

    let withdrawal = state
        .savings()
        .withdraw(&auth.actor, &number, savings_type, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(withdrawal)))
}

/// GET `/members/{number}/savings` - Per-type balances and social fund total.
async fn savings_summary(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<SavingsSummary>> {
    let number = member_number(&number)?;
    Ok(Json(state.savings().summary(&number).await?))
}

/// GET `/members/{number}/savings/{type}/balance` - Balance of one savings type.
async fn savings_balance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((number, savings_type_raw)): Path<(String, String)>,
) -> ApiResult<Json<BalanceResponse>> {
    let number = member_number(&number)?;
    let savings_type = savings_type(&savings_type_raw)?;
    let balance = state.savings().balance(&number, savings_type).await?;
    Ok(Json(BalanceResponse {
        savings_type,
        balance,
    }))
}

/// GET `/members/{number}/savings/{type}/history` - History entries, newest first.
async fn savings_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((number, savings_type_raw)): Path<(String, String)>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    let number = member_number(&number)?;
    let savings_type = savings_type(&savings_type_raw)?;
    Ok(Json(
        state
            .savings()
            .history(&number, savings_type, query.date)
            .await?,
    ))
}

/// GET `/members/{number}/social-fund-required?date=` - Social fund check for wajib.
async fn social_fund_required(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(number): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<SocialFundRequiredResponse>> {
    let number = member_number(&number)?;
    let required = state
        .savings()
        .social_fund_required(&number, query.date)
        .await?;
    Ok(Json(SocialFundRequiredResponse { required }))
}
