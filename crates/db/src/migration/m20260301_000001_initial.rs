//! Initial database migration.
//!
//! Creates the member, staff, loan, installment and savings tables with
//! their constraints, indexes and append-only triggers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: REGISTRY
        // ============================================================
        db.execute_unprepared(STAFF_SQL).await?;
        db.execute_unprepared(MEMBERS_SQL).await?;

        // ============================================================
        // PART 2: LOANS & INSTALLMENTS
        // ============================================================
        db.execute_unprepared(LOANS_SQL).await?;
        db.execute_unprepared(INSTALLMENTS_SQL).await?;

        // ============================================================
        // PART 3: SAVINGS LEDGER
        // ============================================================
        db.execute_unprepared(SAVINGS_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(WITHDRAWALS_SQL).await?;
        db.execute_unprepared(SAVINGS_HISTORY_SQL).await?;

        // ============================================================
        // PART 4: FUNCTIONS & TRIGGERS
        // ============================================================
        db.execute_unprepared(FUNCTIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const STAFF_SQL: &str = r"
CREATE TABLE staff (
    id UUID PRIMARY KEY,
    username VARCHAR(100) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    role VARCHAR(20) NOT NULL
        CHECK (role IN ('admin', 'ketua', 'sekretaris', 'bendahara')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const MEMBERS_SQL: &str = r"
CREATE TABLE members (
    number VARCHAR(50) PRIMARY KEY CHECK (btrim(number) <> ''),
    name VARCHAR(255) NOT NULL CHECK (btrim(name) <> ''),
    status VARCHAR(20) NOT NULL DEFAULT 'aktif'
        CHECK (status IN ('aktif', 'nonaktif')),
    joined_on DATE NOT NULL,
    deactivation_reason TEXT,
    deactivated_on DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- Inactive members always carry a reason and date
    CONSTRAINT chk_member_deactivation CHECK (
        status = 'aktif'
        OR (deactivation_reason IS NOT NULL AND deactivated_on IS NOT NULL)
    )
);

CREATE INDEX idx_members_status ON members(status);
";

const LOANS_SQL: &str = r"
CREATE TABLE loans (
    id UUID PRIMARY KEY,
    member_number VARCHAR(50) NOT NULL REFERENCES members(number) ON DELETE RESTRICT,
    loan_type VARCHAR(20) NOT NULL CHECK (loan_type IN ('reguler', 'khusus', 'barang')),
    fee_category VARCHAR(20) NOT NULL CHECK (fee_category IN ('flat', 'turunan')),
    admin_id UUID NOT NULL REFERENCES staff(id) ON DELETE RESTRICT,
    principal NUMERIC(15, 2) NOT NULL CHECK (principal > 0),
    installment_amount NUMERIC(15, 2) NOT NULL CHECK (installment_amount > 0),
    rate NUMERIC(5, 2) CHECK (rate IS NULL OR (rate >= 0 AND rate <= 100)),
    term_months INTEGER NOT NULL CHECK (term_months BETWEEN 1 AND 36),
    start_date DATE NOT NULL,
    status VARCHAR(20) NOT NULL DEFAULT 'aktif'
        CHECK (status IN ('aktif', 'digabung', 'lunas')),
    -- Cache only; the installment ledger is authoritative
    remaining NUMERIC(15, 2) NOT NULL CHECK (remaining >= 0),
    fee_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    -- Deferred so the old loan can point at the new one before it is inserted
    merged_into UUID REFERENCES loans(id) DEFERRABLE INITIALLY DEFERRED,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_loan_merged_target CHECK (
        (status = 'digabung') = (merged_into IS NOT NULL)
    )
);

-- At most one active loan per member and type
CREATE UNIQUE INDEX uq_loans_active_member_type
    ON loans(member_number, loan_type) WHERE status = 'aktif';
CREATE INDEX idx_loans_member ON loans(member_number, start_date);
CREATE INDEX idx_loans_status ON loans(status);
";

const INSTALLMENTS_SQL: &str = r"
CREATE TABLE installments (
    id UUID PRIMARY KEY,
    loan_id UUID NOT NULL REFERENCES loans(id) ON DELETE RESTRICT,
    -- History survives staff removal
    admin_id UUID REFERENCES staff(id) ON DELETE SET NULL,
    date DATE NOT NULL,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    kind VARCHAR(20) NOT NULL CHECK (kind IN ('cicilan', 'jasa')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_installments_loan_date ON installments(loan_id, date DESC);
";

const SAVINGS_TRANSACTIONS_SQL: &str = r"
CREATE TABLE savings_transactions (
    id UUID PRIMARY KEY,
    member_number VARCHAR(50) NOT NULL REFERENCES members(number) ON DELETE RESTRICT,
    savings_type VARCHAR(20) NOT NULL CHECK (savings_type IN ('pokok', 'wajib', 'sukarela')),
    admin_id UUID NOT NULL REFERENCES staff(id) ON DELETE RESTRICT,
    date DATE NOT NULL,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount <> 0),
    social_fund NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (social_fund >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_savings_transactions_member
    ON savings_transactions(member_number, savings_type, date);
";

const WITHDRAWALS_SQL: &str = r"
CREATE TABLE withdrawals (
    id UUID PRIMARY KEY,
    member_number VARCHAR(50) NOT NULL REFERENCES members(number) ON DELETE RESTRICT,
    savings_type VARCHAR(20) NOT NULL CHECK (savings_type IN ('pokok', 'wajib', 'sukarela')),
    admin_id UUID NOT NULL REFERENCES staff(id) ON DELETE RESTRICT,
    date DATE NOT NULL,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount < 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_withdrawals_member ON withdrawals(member_number, savings_type, date);
";

const SAVINGS_HISTORY_SQL: &str = r"
CREATE TABLE savings_history (
    id UUID PRIMARY KEY,
    member_number VARCHAR(50) NOT NULL REFERENCES members(number) ON DELETE RESTRICT,
    savings_type VARCHAR(20) NOT NULL CHECK (savings_type IN ('pokok', 'wajib', 'sukarela')),
    date DATE NOT NULL,
    kind VARCHAR(20) NOT NULL CHECK (kind IN ('setor', 'tarik', 'koreksi')),
    -- Magnitude; the kind carries the sign
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_savings_history_member_type
    ON savings_history(member_number, savings_type, date DESC);
";

const FUNCTIONS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_ledger_modification
-- Savings ledger rows are append-only
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Ledger rows in % are append-only', TG_TABLE_NAME;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_savings_history_append_only
BEFORE UPDATE OR DELETE ON savings_history
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_modification();

CREATE TRIGGER trg_savings_transactions_append_only
BEFORE UPDATE OR DELETE ON savings_transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_modification();

CREATE TRIGGER trg_withdrawals_append_only
BEFORE UPDATE OR DELETE ON withdrawals
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_modification();

-- ============================================================
-- FUNCTION: prevent_installment_modification
-- Installments are append-only; only the staff reference may be
-- cleared (ON DELETE SET NULL)
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_installment_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF TG_OP = 'DELETE' THEN
        RAISE EXCEPTION 'Installments are append-only';
    END IF;

    IF (NEW.loan_id, NEW.date, NEW.amount, NEW.kind)
        IS DISTINCT FROM (OLD.loan_id, OLD.date, OLD.amount, OLD.kind)
        OR NEW.admin_id IS NOT NULL AND NEW.admin_id IS DISTINCT FROM OLD.admin_id THEN
        RAISE EXCEPTION 'Installments are append-only';
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_installments_append_only
BEFORE UPDATE OR DELETE ON installments
FOR EACH ROW
EXECUTE FUNCTION prevent_installment_modification();

-- ============================================================
-- FUNCTION: touch_updated_at
-- ============================================================
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_members_updated_at
BEFORE UPDATE ON members
FOR EACH ROW
EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_loans_updated_at
BEFORE UPDATE ON loans
FOR EACH ROW
EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

-- Drop triggers
DROP TRIGGER IF EXISTS trg_loans_updated_at ON loans;
DROP TRIGGER IF EXISTS trg_members_updated_at ON members;
DROP TRIGGER IF EXISTS trg_installments_append_only ON installments;
DROP TRIGGER IF EXISTS trg_withdrawals_append_only ON withdrawals;
DROP TRIGGER IF EXISTS trg_savings_transactions_append_only ON savings_transactions;
DROP TRIGGER IF EXISTS trg_savings_history_append_only ON savings_history;

-- Drop functions
DROP FUNCTION IF EXISTS touch_updated_at();
DROP FUNCTION IF EXISTS prevent_installment_modification();
DROP FUNCTION IF EXISTS prevent_ledger_modification();

-- Drop tables
DROP TABLE IF EXISTS savings_history;
DROP TABLE IF EXISTS withdrawals;
DROP TABLE IF EXISTS savings_transactions;
DROP TABLE IF EXISTS installments;
DROP TABLE IF EXISTS loans;
DROP TABLE IF EXISTS members;
DROP TABLE IF EXISTS staff;
";
