//! # board-core
//!
//! Pure logic for the kanban board sync engine (no I/O, instant tests).
//!
//! This crate implements sort-key assignment, the board value, pending
//! flags and the optimistic-update reducer without any network or disk
//! I/O, so every transition can be unit tested synchronously.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The remote calls are performed by `board-client`, which interprets the
//! [`Effect`]s produced by [`Session`] and feeds back [`Settlement`]s.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod board;
pub mod ordering;
pub mod pending;
pub mod session;

pub use board::{Board, InvariantViolation};
pub use ordering::{has_room, order_between, INITIAL_ORDER, ORDER_STEP};
pub use pending::PendingTracker;
pub use session::{
    Dispatch, Effect, Intent, IntentError, LoadStep, MoveIntent, Outcome, Phase, Session,
    Settlement, Snapshot, DEFAULT_LISTS,
};
