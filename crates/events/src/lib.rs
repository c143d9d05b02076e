//! Rehome event bus and notification infrastructure.
//!
//! Lifecycle transitions (placement accepted, handover completed,
//! invitation resolved) are announced on an in-process bus and captured
//! durably by a background persistence task:
//!
//! - [`EventBus`]: publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`]: the canonical event envelope.
//! - [`EventPersistence`]: background service that writes every event to
//!   the `events` table.

pub mod bus;
pub mod persistence;

pub use bus::{DomainEvent, EventBus};
pub use persistence::EventPersistence;
