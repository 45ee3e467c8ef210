//! Conversions between entity models and core types.
//!
//! Enum columns are stored as their lowercase Indonesian names; an unknown
//! value in the store is an internal error, never a validation error.

use koperasi_core::CoreError;
use koperasi_core::installment::{Installment, InstallmentKind};
use koperasi_core::loan::{FeeCategory, Loan, LoanStatus, LoanType};
use koperasi_core::member::{Member, MemberStatus};
use koperasi_core::savings::{
    HistoryEntry, HistoryKind, SavingsTransaction, SavingsType, Withdrawal,
};
use koperasi_shared::types::{HistoryEntryId, InstallmentId, LoanId, MemberNumber, StaffId};
use sea_orm::Set;

use crate::entities::{
    installments, loans, members, savings_history, savings_transactions, withdrawals,
};

fn corrupt(column: &str, value: &str) -> CoreError {
    CoreError::Internal(format!("unexpected {column} value in store: {value:?}"))
}

fn member_number(raw: &str) -> Result<MemberNumber, CoreError> {
    MemberNumber::parse(raw).ok_or_else(|| corrupt("member_number", raw))
}

fn now() -> sea_orm::prelude::DateTimeWithTimeZone {
    chrono::Utc::now().into()
}

// ============================================================================
// Members
// ============================================================================

pub(crate) fn member_from_model(model: members::Model) -> Result<Member, CoreError> {
    Ok(Member {
        number: member_number(&model.number)?,
        status: MemberStatus::parse(&model.status).ok_or_else(|| corrupt("status", &model.status))?,
        name: model.name,
        joined_on: model.joined_on,
        deactivation_reason: model.deactivation_reason,
        deactivated_on: model.deactivated_on,
    })
}

pub(crate) fn member_active_model(member: &Member) -> members::ActiveModel {
    let now = now();
    members::ActiveModel {
        number: Set(member.number.as_str().to_string()),
        name: Set(member.name.clone()),
        status: Set(member.status.as_str().to_string()),
        joined_on: Set(member.joined_on),
        deactivation_reason: Set(member.deactivation_reason.clone()),
        deactivated_on: Set(member.deactivated_on),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

// ============================================================================
// Loans
// ============================================================================

pub(crate) fn loan_from_model(model: loans::Model) -> Result<Loan, CoreError> {
    Ok(Loan {
        id: LoanId::from_uuid(model.id),
        member: member_number(&model.member_number)?,
        loan_type: LoanType::parse(&model.loan_type)
            .ok_or_else(|| corrupt("loan_type", &model.loan_type))?,
        fee_category: FeeCategory::parse(&model.fee_category)
            .ok_or_else(|| corrupt("fee_category", &model.fee_category))?,
        admin_id: StaffId::from_uuid(model.admin_id),
        principal: model.principal,
        installment_amount: model.installment_amount,
        rate: model.rate,
        term_months: u32::try_from(model.term_months)
            .map_err(|_| corrupt("term_months", &model.term_months.to_string()))?,
        start_date: model.start_date,
        status: LoanStatus::parse(&model.status).ok_or_else(|| corrupt("status", &model.status))?,
        remaining: model.remaining,
        fee_amount: model.fee_amount,
        merged_into: model.merged_into.map(LoanId::from_uuid),
        version: model.version,
    })
}

pub(crate) fn loan_active_model(loan: &Loan) -> loans::ActiveModel {
    let now = now();
    loans::ActiveModel {
        id: Set(loan.id.into_inner()),
        member_number: Set(loan.member.as_str().to_string()),
        loan_type: Set(loan.loan_type.as_str().to_string()),
        fee_category: Set(loan.fee_category.as_str().to_string()),
        admin_id: Set(loan.admin_id.into_inner()),
        principal: Set(loan.principal),
        installment_amount: Set(loan.installment_amount),
        rate: Set(loan.rate),
        term_months: Set(i32::try_from(loan.term_months).unwrap_or(i32::MAX)),
        start_date: Set(loan.start_date),
        status: Set(loan.status.as_str().to_string()),
        remaining: Set(loan.remaining),
        fee_amount: Set(loan.fee_amount),
        merged_into: Set(loan.merged_into.map(LoanId::into_inner)),
        version: Set(loan.version),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

// ============================================================================
// Installments
// ============================================================================

pub(crate) fn installment_from_model(model: installments::Model) -> Result<Installment, CoreError> {
    Ok(Installment {
        id: InstallmentId::from_uuid(model.id),
        loan_id: LoanId::from_uuid(model.loan_id),
        admin_id: model.admin_id.map(StaffId::from_uuid),
        date: model.date,
        amount: model.amount,
        kind: InstallmentKind::parse(&model.kind).ok_or_else(|| corrupt("kind", &model.kind))?,
    })
}

pub(crate) fn installment_active_model(installment: &Installment) -> installments::ActiveModel {
    installments::ActiveModel {
        id: Set(installment.id.into_inner()),
        loan_id: Set(installment.loan_id.into_inner()),
        admin_id: Set(installment.admin_id.map(StaffId::into_inner)),
        date: Set(installment.date),
        amount: Set(installment.amount),
        kind: Set(installment.kind.as_str().to_string()),
        created_at: Set(now()),
    }
}

// ============================================================================
// Savings
// ============================================================================

pub(crate) fn savings_type_from_str(raw: &str) -> Result<SavingsType, CoreError> {
    SavingsType::parse(raw).ok_or_else(|| corrupt("savings_type", raw))
}

pub(crate) fn history_kind_from_str(raw: &str) -> Result<HistoryKind, CoreError> {
    HistoryKind::parse(raw).ok_or_else(|| corrupt("kind", raw))
}

pub(crate) fn history_from_model(model: savings_history::Model) -> Result<HistoryEntry, CoreError> {
    Ok(HistoryEntry {
        id: HistoryEntryId::from_uuid(model.id),
        member: member_number(&model.member_number)?,
        savings_type: savings_type_from_str(&model.savings_type)?,
        date: model.date,
        kind: history_kind_from_str(&model.kind)?,
        amount: model.amount,
    })
}

pub(crate) fn history_active_model(entry: &HistoryEntry) -> savings_history::ActiveModel {
    savings_history::ActiveModel {
        id: Set(entry.id.into_inner()),
        member_number: Set(entry.member.as_str().to_string()),
        savings_type: Set(entry.savings_type.as_str().to_string()),
        date: Set(entry.date),
        kind: Set(entry.kind.as_str().to_string()),
        amount: Set(entry.amount),
        created_at: Set(now()),
    }
}

pub(crate) fn transaction_active_model(
    transaction: &SavingsTransaction,
) -> savings_transactions::ActiveModel {
    savings_transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        member_number: Set(transaction.member.as_str().to_string()),
        savings_type: Set(transaction.savings_type.as_str().to_string()),
        admin_id: Set(transaction.admin_id.into_inner()),
        date: Set(transaction.date),
        amount: Set(transaction.amount),
        social_fund: Set(transaction.social_fund),
        created_at: Set(now()),
    }
}

pub(crate) fn withdrawal_active_model(withdrawal: &Withdrawal) -> withdrawals::ActiveModel {
    withdrawals::ActiveModel {
        id: Set(withdrawal.id.into_inner()),
        member_number: Set(withdrawal.member.as_str().to_string()),
        savings_type: Set(withdrawal.savings_type.as_str().to_string()),
        admin_id: Set(withdrawal.admin_id.into_inner()),
        date: Set(withdrawal.date),
        amount: Set(withdrawal.amount),
        created_at: Set(now()),
    }
}

