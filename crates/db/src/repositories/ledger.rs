//! Locked loads and plan persistence shared by the repositories.
//!
//! Lock order is always member row first, then loan rows. Manual installment
//! posting locks only the loan row, so no cycle exists.

use chrono::{Datelike, NaiveDate};
use koperasi_core::CoreError;
use koperasi_core::installment::Installment;
use koperasi_core::loan::{Loan, LoanLedger, LoanRefresh, LoanStatus};
use koperasi_core::member::Member;
use koperasi_core::savings::{BalanceTotals, DepositPlan, SavingsType};
use koperasi_shared::types::{LoanId, MemberNumber};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::{installments, loans, members, savings_history, savings_transactions};
use crate::error::db_err;

use super::convert::{
    history_active_model, history_kind_from_str, installment_active_model, installment_from_model,
    loan_from_model, member_from_model, savings_type_from_str, transaction_active_model,
};

// ============================================================================
// Members
// ============================================================================

/// Loads a member, optionally taking a row lock.
pub(crate) async fn find_member<C: ConnectionTrait>(
    conn: &C,
    number: &MemberNumber,
    lock: bool,
) -> Result<Member, CoreError> {
    let mut query = members::Entity::find_by_id(number.as_str());
    if lock {
        query = query.lock_exclusive();
    }

    let model = query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::MemberNotFound(number.to_string()))?;

    member_from_model(model)
}

// ============================================================================
// Savings balances
// ============================================================================

/// Deposit and withdrawal totals for one (member, savings type) pair.
pub(crate) async fn balance_totals<C: ConnectionTrait>(
    conn: &C,
    number: &MemberNumber,
    savings_type: SavingsType,
) -> Result<BalanceTotals, CoreError> {
    let rows: Vec<(String, Decimal)> = savings_history::Entity::find()
        .select_only()
        .column(savings_history::Column::Kind)
        .column(savings_history::Column::Amount)
        .filter(savings_history::Column::MemberNumber.eq(number.as_str()))
        .filter(savings_history::Column::SavingsType.eq(savings_type.as_str()))
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err)?;

    rows.into_iter()
        .try_fold(BalanceTotals::default(), |acc, (kind, amount)| -> Result<_, CoreError> {
            Ok(acc.with(history_kind_from_str(&kind)?, amount))
        })
}

/// Deposit and withdrawal totals for every savings type of a member.
pub(crate) async fn balances_by_type<C: ConnectionTrait>(
    conn: &C,
    number: &MemberNumber,
) -> Result<Vec<(SavingsType, BalanceTotals)>, CoreError> {
    let rows: Vec<(String, String, Decimal)> = savings_history::Entity::find()
        .select_only()
        .column(savings_history::Column::SavingsType)
        .column(savings_history::Column::Kind)
        .column(savings_history::Column::Amount)
        .filter(savings_history::Column::MemberNumber.eq(number.as_str()))
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err)?;

    let mut totals: Vec<(SavingsType, BalanceTotals)> = SavingsType::ALL
        .iter()
        .map(|&t| (t, BalanceTotals::default()))
        .collect();
    for (savings_type, kind, amount) in rows {
        let savings_type = savings_type_from_str(&savings_type)?;
        let kind = history_kind_from_str(&kind)?;
        if let Some((_, entry)) = totals.iter_mut().find(|(t, _)| *t == savings_type) {
            *entry = entry.with(kind, amount);
        }
    }

    Ok(totals)
}

/// Whether the member already has a wajib deposit in the month of `date`.
pub(crate) async fn has_periodic_deposit_in_month<C: ConnectionTrait>(
    conn: &C,
    number: &MemberNumber,
    date: NaiveDate,
) -> Result<bool, CoreError> {
    let (first, last) = month_bounds(date);

    let existing = savings_transactions::Entity::find()
        .filter(savings_transactions::Column::MemberNumber.eq(number.as_str()))
        .filter(
            savings_transactions::Column::SavingsType.eq(SavingsType::MandatoryPeriodic.as_str()),
        )
        .filter(savings_transactions::Column::Amount.gt(Decimal::ZERO))
        .filter(savings_transactions::Column::Date.gte(first))
        .filter(savings_transactions::Column::Date.lte(last))
        .one(conn)
        .await
        .map_err(db_err)?;

    Ok(existing.is_some())
}

/// First and last day of the month containing `date`.
pub(crate) fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date);
    (first, last)
}

/// Appends a savings transaction and its mirrored history entry.
pub(crate) async fn insert_deposit<C: ConnectionTrait>(
    conn: &C,
    plan: &DepositPlan,
) -> Result<(), CoreError> {
    transaction_active_model(&plan.transaction)
        .insert(conn)
        .await
        .map_err(db_err)?;
    history_active_model(&plan.history)
        .insert(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

// ============================================================================
// Loans
// ============================================================================

/// Attaches installments to loan rows.
pub(crate) async fn load_ledgers<C: ConnectionTrait>(
    conn: &C,
    models: Vec<loans::Model>,
) -> Result<Vec<LoanLedger>, CoreError> {
    if models.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let rows = installments::Entity::find()
        .filter(installments::Column::LoanId.is_in(ids))
        .order_by_desc(installments::Column::Date)
        .all(conn)
        .await
        .map_err(db_err)?;

    let mut all: Vec<Installment> = rows
        .into_iter()
        .map(installment_from_model)
        .collect::<Result<_, _>>()?;

    models
        .into_iter()
        .map(|model| -> Result<LoanLedger, CoreError> {
            let loan = loan_from_model(model)?;
            let (own, rest): (Vec<_>, Vec<_>) =
                std::mem::take(&mut all).into_iter().partition(|i| i.loan_id == loan.id);
            all = rest;
            Ok(LoanLedger::new(loan, own))
        })
        .collect()
}

/// Loads one loan with its installments, optionally locking the loan row.
pub(crate) async fn find_ledger<C: ConnectionTrait>(
    conn: &C,
    id: LoanId,
    lock: bool,
) -> Result<LoanLedger, CoreError> {
    let mut query = loans::Entity::find_by_id(id.into_inner());
    if lock {
        query = query.lock_exclusive();
    }

    let model = query
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(CoreError::LoanNotFound(id))?;

    load_ledgers(conn, vec![model])
        .await?
        .pop()
        .ok_or(CoreError::LoanNotFound(id))
}

/// Loads a member's loans in origination order, optionally filtered by status.
pub(crate) async fn member_ledgers<C: ConnectionTrait>(
    conn: &C,
    number: &MemberNumber,
    status: Option<LoanStatus>,
    lock: bool,
) -> Result<Vec<LoanLedger>, CoreError> {
    let mut query = loans::Entity::find()
        .filter(loans::Column::MemberNumber.eq(number.as_str()))
        .order_by_asc(loans::Column::StartDate)
        .order_by_asc(loans::Column::CreatedAt);
    if let Some(status) = status {
        query = query.filter(loans::Column::Status.eq(status.as_str()));
    }
    if lock {
        query = query.lock_exclusive();
    }

    let models = query.all(conn).await.map_err(db_err)?;
    load_ledgers(conn, models).await
}

/// Appends installments.
pub(crate) async fn insert_installments<C: ConnectionTrait>(
    conn: &C,
    installments: &[Installment],
) -> Result<(), CoreError> {
    for installment in installments {
        installment_active_model(installment)
            .insert(conn)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

/// Writes a refreshed cache onto a loan row and bumps its version.
///
/// Fails with `ConcurrencyConflict` if the row's version moved since `loan`
/// was read.
pub(crate) async fn save_refresh<C: ConnectionTrait>(
    conn: &C,
    loan: &Loan,
    refresh: &LoanRefresh,
) -> Result<i64, CoreError> {
    bump_version(
        conn,
        loan.id,
        loan.version,
        loans::Entity::update_many()
            .col_expr(loans::Column::Remaining, Expr::value(refresh.remaining))
            .col_expr(loans::Column::Status, Expr::value(refresh.status.as_str())),
    )
    .await
}

/// Marks a loan merged into `target`, carrying its version check.
pub(crate) async fn mark_merged<C: ConnectionTrait>(
    conn: &C,
    id: LoanId,
    version: i64,
    target: LoanId,
) -> Result<i64, CoreError> {
    bump_version(
        conn,
        id,
        version,
        loans::Entity::update_many()
            .col_expr(loans::Column::Status, Expr::value(LoanStatus::Merged.as_str()))
            .col_expr(loans::Column::MergedInto, Expr::value(target.into_inner())),
    )
    .await
}

async fn bump_version<C: ConnectionTrait>(
    conn: &C,
    id: LoanId,
    version: i64,
    update: sea_orm::UpdateMany<loans::Entity>,
) -> Result<i64, CoreError> {
    let result = update
        .col_expr(loans::Column::Version, Expr::col(loans::Column::Version).add(1))
        .filter(loans::Column::Id.eq(id.into_inner()))
        .filter(loans::Column::Version.eq(version))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        return Err(CoreError::ConcurrencyConflict(format!("loan {id}")));
    }

    Ok(version + 1)
}
