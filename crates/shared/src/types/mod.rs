//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{MoneyParseError, parse_percent, parse_rupiah, round_money, round_rupiah};
pub use pagination::{MAX_PER_PAGE, PageMeta, PageRequest, PageResponse};

#[cfg(test)]
mod money_tests;
#[cfg(test)]
mod pagination_tests;
