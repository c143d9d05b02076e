//! Rehome domain logic.
//!
//! Pure, I/O-free rules for the pet custody lifecycle: relationship kinds
//! and their privilege ordering, placement request state transitions,
//! response arbitration rules, transfer handover preconditions, and
//! invitation token handling. The `db` crate enforces these rules inside
//! transactions; the `api` crate surfaces violations as HTTP errors.

pub mod error;
pub mod invitation;
pub mod placement;
pub mod relationship;
pub mod response;
pub mod roles;
pub mod transfer;
pub mod types;
