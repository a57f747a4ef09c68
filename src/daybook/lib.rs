//! # Daybook Architecture
//!
//! Daybook is a **UI-agnostic journaling library** with an offline-first
//! sync core. The CLI binary is one client of the library; the same core
//! could back a TUI, a web service, or anything else.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (args.rs, wired by main.rs)                      │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands and the sync coordinator       │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Business logic per operation                             │
//! │  - Operates on Rust types, returns Rust types               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────┬──────────────────────────────┐
//! │  Sync Core (sync.rs)         │  Entry Codec (codec.rs)      │
//! │  - Pending queue lifecycle   │  - Entry ⇄ Markdown document │
//! │  - Conflict-aware pushes     │  - validate / migrate        │
//! ├──────────────────────────────┼──────────────────────────────┤
//! │  Cache Storage (store/)      │  Remote Storage (remote/)    │
//! │  - CacheStore trait          │  - RemoteStore trait         │
//! │  - FileStore / InMemoryStore │  - GitHubStore / InMemory    │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Offline First
//!
//! Every save lands in the local cache as `Pending` and the app keeps
//! working with no network at all. Sync is a separate, explicitly
//! triggered step: pending entries are pushed with writes conditioned on
//! the last known remote version token, so a concurrent change surfaces
//! as a conflict instead of clobbering anything. Failure never discards
//! local work — entries stay queued until a push is confirmed.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade — entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`codec`]: Entry ⇄ document serialization, validation, migration
//! - [`store`]: Local cache abstraction and implementations
//! - [`remote`]: Versioned remote file store client and retry policy
//! - [`sync`]: The sync coordinator and its guards
//! - [`index`]: Listing view (sort, search, pagination)
//! - [`model`]: Core data types
//! - [`config`]: Configuration management
//! - [`editor`]: External editor integration
//! - [`error`]: Error types

pub mod api;
pub mod codec;
pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod index;
pub mod model;
pub mod remote;
pub mod store;
pub mod sync;
