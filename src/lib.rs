//! Doraemon core: blast-radius analysis for JS/TS repos via an incremental
//! import graph. Four components — GraphStore, JobQueue, Analyzer, Ingester —
//! each behind a trait so the worker/ingester binaries can be wired against
//! either the Neo4j/Redis-backed implementations or in-memory test doubles.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod graphstore;
pub mod http_error;
pub mod ingester;
pub mod jobqueue;
pub mod model;

pub use config::Config;
