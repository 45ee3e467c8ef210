//! Loan and installment routes (pinjaman, angsuran).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use koperasi_core::installment::{
    BatchInstallmentInput, BatchPosting, Installment, InstallmentKind, PostInstallmentInput,
    Posting,
};
use koperasi_core::loan::{
    CreateLoanInput, FeeCategory, LoanOverview, LoanRefresh, LoanSummary, LoanType, MemberLoans,
    Origination,
};
use koperasi_shared::types::{LoanId, PageRequest, PageResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::member_number;
use crate::{
    AppState,
    error::ApiResult,
    middleware::AuthUser,
    money::{Amount, Rate},
};

/// Creates the loan routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loans", post(create_loan))
        .route("/loans/{id}", get(get_loan))
        .route("/loans/{id}/refresh", post(refresh_loan))
        .route(
            "/loans/{id}/installments",
            get(list_installments).post(post_installment),
        )
        .route("/loans/{id}/installments/batch", post(post_installments))
        .route("/members/{number}/loans", get(member_loans))
        .route("/members/{number}/loan-summary", get(loan_summary))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating a loan.
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    /// Borrowing member.
    pub member_number: String,
    /// Product category (`reguler`, `khusus`, `barang`).
    pub loan_type: LoanType,
    /// Fee computation mode (`flat`, `turunan`).
    pub fee_category: FeeCategory,
    /// Principal requested.
    pub principal: Amount,
    /// Principal repaid per installment.
    pub installment_amount: Amount,
    /// Monthly fee rate in percent.
    #[serde(default)]
    pub rate: Option<Rate>,
    /// Term in months.
    pub term_months: u32,
    /// Origination date; defaults to today.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Request body for posting one installment.
#[derive(Debug, Deserialize)]
pub struct PostInstallmentRequest {
    /// Payment date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Amount recorded; defaults to the total due.
    #[serde(default)]
    pub amount: Option<Amount>,
    /// `cicilan` (principal and fee) or `jasa` (fee only).
    #[serde(default = "default_kind")]
    pub kind: InstallmentKind,
}

fn default_kind() -> InstallmentKind {
    InstallmentKind::PrincipalAndFee
}

/// Request body for paying several months at once.
#[derive(Debug, Deserialize)]
pub struct BatchInstallmentRequest {
    /// Months to pay.
    pub months: u32,
    /// Payment date; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Amount recorded per month; defaults to each month's total due.
    #[serde(default)]
    pub amount_per_month: Option<Amount>,
}

/// Query parameters for the installment history.
#[derive(Debug, Deserialize)]
pub struct ListInstallmentsQuery {
    /// Only installments on this date.
    pub date: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 20, max: 100).
    pub per_page: Option<u32>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/loans` - Create a loan, merging any active loan of the same type.
async fn create_loan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateLoanRequest>,
) -> ApiResult<(StatusCode, Json<Origination>)> {
    let number = member_number(&request.member_number)?;
    let input = CreateLoanInput {
        loan_type: request.loan_type,
        fee_category: request.fee_category,
        principal: request.principal.into(),
        installment_amount: request.installment_amount.into(),
        rate: request.rate.map(Into::into),
        term_months: request.term_months,
        start_date: request.start_date,
    };

    let origination = state.loans().create(&auth.actor, &number, &input).await?;
    Ok((StatusCode::CREATED, Json(origination)))
}

/// GET `/loans/{id}` - Loan with ledger-derived balance, fee and amount due.
async fn get_loan(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LoanOverview>> {
    Ok(Json(state.loans().overview(LoanId::from_uuid(id)).await?))
}

/// POST `/loans/{id}/refresh` - Re-derive the cached balance and status.
async fn refresh_loan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LoanRefresh>> {
    Ok(Json(
        state
            .loans()
            .refresh(&auth.actor, LoanId::from_uuid(id))
            .await?,
    ))
}

/// GET `/loans/{id}/installments` - Installment history, newest first.
async fn list_installments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ListInstallmentsQuery>,
) -> ApiResult<Json<PageResponse<Installment>>> {
    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    Ok(Json(
        state
            .loans()
            .installments(LoanId::from_uuid(id), query.date, &page)
            .await?,
    ))
}

/// POST `/loans/{id}/installments` - Post one installment.
async fn post_installment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<PostInstallmentRequest>,
) -> ApiResult<(StatusCode, Json<Posting>)> {
    let input = PostInstallmentInput {
        date: request.date,
        amount: request.amount.map(Into::into),
        kind: request.kind,
    };

    let posting = state
        .loans()
        .post_installment(&auth.actor, LoanId::from_uuid(id), &input)
        .await?;
    Ok((StatusCode::CREATED, Json(posting)))
}

/// POST `/loans/{id}/installments/batch` - Pay several months, stopping once paid.
async fn post_installments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<BatchInstallmentRequest>,
) -> ApiResult<(StatusCode, Json<BatchPosting>)> {
    let input = BatchInstallmentInput {
        date: request.date,
        months: request.months,
        amount_per_month: request.amount_per_month.map(Into::into),
    };

    let batch = state
        .loans()
        .post_installments(&auth.actor, LoanId::from_uuid(id), &input)
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// GET `/members/{number}/loans` - A member's loans split into current and settled.
async fn member_loans(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<MemberLoans>> {
    let number = member_number(&number)?;
    Ok(Json(state.loans().member_loans(&number).await?))
}

/// GET `/members/{number}/loan-summary` - Remaining balance of active loans per type.
async fn loan_summary(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<LoanSummary>> {
    let number = member_number(&number)?;
    Ok(Json(state.loans().summary(&number).await?))
}
