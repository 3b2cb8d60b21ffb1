//! # board-client
//!
//! Optimistic kanban board client.
//!
//! This is the library that applications use to drive a board backed by a
//! remote store.
//!
//! ## Features
//!
//! - **Zero-latency intents**: create, edit, delete and move apply locally
//!   before the remote call is issued
//! - **Gateway Abstraction**: pluggable remote store (PostgREST, mock)
//! - **Pending flags**: per-card "call in flight" markers for the UI
//! - **Pure Reducer**: uses board-core for side-effect-free board logic
//!
//! ## Example
//!
//! ```ignore
//! use board_client::{BoardClient, HttpGateway};
//!
//! let gateway = HttpGateway::new("https://project.supabase.co", api_key);
//! let client = BoardClient::new(gateway);
//! client.activate().await?;
//!
//! let list_id = client.board().lists()[0].id.clone();
//! client.create_card(&list_id, "Write tests")?.settled().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod gateway;

pub use client::{BoardClient, ClientError, InFlight};
pub use gateway::{GatewayCall, GatewayOp, HttpGateway, MockGateway, RemoteGateway};
