//! Ingestion pipeline orchestration for ordertrack.
//!
//! This crate ties the fetcher and the order store together: the
//! [`ingest`](ingest::ingest) pipeline, the known-title [`policy`], one-shot
//! [`collect`] runs, the daily [`scheduler`], and console [`report`] rendering.

pub mod collect;
pub mod ingest;
pub mod policy;
pub mod report;
pub mod scheduler;
