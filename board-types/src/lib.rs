//! # board-types
//!
//! Data model for the kanban board sync engine.
//!
//! This crate provides the foundational types used across all board crates:
//! - [`ListId`], [`CardId`] - Identity types
//! - [`List`], [`Card`], [`CardPatch`] - Client-side board entities
//! - [`ListRecord`], [`CardRecord`], [`NewList`], [`NewCard`], [`CardUpdate`] - Remote rows
//! - [`GatewayError`], [`RemoteError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod model;
mod records;

pub use error::{GatewayError, RemoteError};
pub use ids::{CardId, ListId, TEMP_ID_PREFIX};
pub use model::{Card, CardPatch, List};
pub use records::{CardRecord, CardUpdate, ListRecord, NewCard, NewList};
