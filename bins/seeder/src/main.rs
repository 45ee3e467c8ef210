//! Database seeder for koperasi development and testing.
//!
//! Seeds the bootstrap staff accounts (so tokens minted for their ids can
//! create records) and a few demo members with opening savings.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use koperasi_core::member::RegisterMemberInput;
use koperasi_core::savings::{DepositInput, SavingsType};
use koperasi_core::{Actor, Clock, CoreError, Role, SystemClock};
use koperasi_db::{CreateStaffInput, MemberRepository, SavingsRepository, StaffRepository};
use koperasi_shared::types::{MemberNumber, StaffId, parse_rupiah};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Bootstrap administrator, `00000000-0000-0000-0000-000000000001`
const ADMIN_ID: u128 = 1;
/// Bootstrap treasurer, also the usual `sweep.operator_id`
const TREASURER_ID: u128 = 2;

/// Demo members: number, name, opening voluntary savings.
const MEMBERS: [(&str, &str, &str); 3] = [
    ("A-001", "Siti Rahayu", "Rp 500.000"),
    ("A-002", "Budi Santoso", "Rp 150.000"),
    ("A-003", "Dewi Lestari", "Rp 0"),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = koperasi_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::default());

    let admin = Actor::new(staff_id(ADMIN_ID), Role::Admin);
    let treasurer = Actor::new(staff_id(TREASURER_ID), Role::Bendahara);

    println!("Seeding staff...");
    let staff = StaffRepository::new(db.clone());
    seed_staff(&staff, &admin, &admin, "admin", "Administrator").await;
    seed_staff(&staff, &admin, &treasurer, "bendahara", "Bendahara").await;

    println!("Seeding members...");
    let members = MemberRepository::new(db.clone(), clock.clone());
    let savings = SavingsRepository::new(db, clock);
    for (number, name, opening) in MEMBERS {
        seed_member(&members, &savings, &treasurer, number, name, opening).await;
    }

    println!("Seeding complete!");
}

fn staff_id(raw: u128) -> StaffId {
    StaffId::from_uuid(Uuid::from_u128(raw))
}

/// Seeds one staff account, skipping it if the id already exists.
async fn seed_staff(
    repo: &StaffRepository,
    actor: &Actor,
    account: &Actor,
    username: &str,
    full_name: &str,
) {
    let id = account.staff_id;
    if matches!(repo.find_by_id(id).await, Ok(Some(_))) {
        println!("  Staff {username} already exists, skipping...");
        return;
    }

    let input = CreateStaffInput {
        id: Some(id),
        username: username.to_string(),
        full_name: full_name.to_string(),
        role: account.role,
    };

    match repo.create(actor, input).await {
        Ok(_) => println!("  Created staff {username} ({id})"),
        Err(e) => eprintln!("Failed to insert staff {username}: {e}"),
    }
}

/// Seeds one member and their opening voluntary deposit.
async fn seed_member(
    members: &MemberRepository,
    savings: &SavingsRepository,
    actor: &Actor,
    number: &str,
    name: &str,
    opening: &str,
) {
    let input = RegisterMemberInput {
        number: number.to_string(),
        name: name.to_string(),
        joined_on: None,
    };
    match members.register(actor, &input).await {
        Ok(member) => println!("  Created member {} {}", member.number, member.name),
        Err(CoreError::DuplicateMember(_)) => {
            println!("  Member {number} already exists, skipping...");
            return;
        }
        Err(e) => {
            eprintln!("Failed to insert member {number}: {e}");
            return;
        }
    }

    let amount = match parse_rupiah(opening) {
        Ok(amount) if !amount.is_zero() => amount,
        Ok(_) => return,
        Err(e) => {
            eprintln!("Invalid opening savings for {number}: {e}");
            return;
        }
    };
    let Some(number) = MemberNumber::parse(number) else {
        return;
    };
    let deposit = DepositInput {
        savings_type: SavingsType::Voluntary,
        date: None,
        amount,
        social_fund: Decimal::ZERO,
    };
    if let Err(e) = savings.deposit(actor, &number, &deposit).await {
        eprintln!("Failed to deposit opening savings for {number}: {e}");
    }
}
