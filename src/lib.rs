//! Draft, review, and publish natural-language descriptions for dataset
//! entities (tables and columns) backed by an external metadata catalog.
//!
//! The core is the draft lifecycle state machine ([`lifecycle`]), the batch
//! strategy orchestrator ([`strategy`]), and the description merge policy
//! ([`merge`]). The catalog, the warehouse, and the text-generation model are
//! narrow ports ([`store`], [`lm`]) so an embedding application can swap in
//! real clients.

pub mod aspect;
pub mod cli;
pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod lm;
pub mod merge;
pub mod retry;
pub mod review;
pub mod store;
pub mod strategy;
