//! Member registry (anggota).
//!
//! Members are keyed by their member number. They are deactivated rather than
//! deleted once any financial record references them.

pub mod service;
pub mod types;

pub use service::{Deactivation, MemberService};
pub use types::{Member, MemberStatus, MemberTotals, RegisterMemberInput};
