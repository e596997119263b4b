//! Synthetic request-path corpora for catalog API load testing.
//!
//! Given a target path count and a category mix (e.g. "61% search, 39%
//! record lookup"), this crate produces concrete request paths whose
//! distribution, parameter values, and record identifiers resemble real
//! traffic, for replay by a load-test tool.
//!
//! # Pipeline
//!
//! ```text
//! Mix (profile or YAML)          seed CSVs
//!        │                           │
//!        ▼                           ▼
//!   quota::allocate          pool::CandidatePool
//!        │                           │
//!        └────────────┬──────────────┘
//!                     ▼
//!          coordinator::RunCoordinator ──▶ render::PathSynthesizer
//!                     │
//!                     ▼ (identity/lookup categories)
//!          resolve::IdentifierResolver ──▶ client::HttpRecordApi
//!                     │        (randomized window::DateWindow per query)
//!                     ▼
//!        merge ▶ shuffle ▶ truncate ▶ newline-separated path file
//! ```
//!
//! Each category generates independently with its own RNG and pool
//! cursors; the merge at the end is the only synchronization point. Runs
//! fail fast: the first configuration, seed-data, or API error aborts the
//! run and no output is written.

pub mod client;
pub mod coordinator;
pub mod error;
pub mod mix;
pub mod pool;
pub mod quota;
pub mod render;
pub mod resolve;
pub mod seeds;
pub mod window;

pub use client::{ApiCredentials, HttpRecordApi};
pub use coordinator::{allocate_quotas, RunCoordinator, RunSettings, SeedData};
pub use error::PathGenError;
pub use mix::{Category, Mix, Profile, QueryKind, Renderer, Surface};
pub use pool::CandidatePool;
pub use render::PathSynthesizer;
pub use resolve::{IdentifierResolver, RecordApi, RecordPage, RecordQuery};
pub use window::{DateBounds, DateWindow};
