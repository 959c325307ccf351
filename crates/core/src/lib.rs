//! Domain logic for the plyforge generation service.
//!
//! Everything in this crate is HTTP-agnostic: job identity, per-job
//! workspace management on durable storage, upload ingestion, external
//! generator invocation, artifact resolution, and filesystem-derived
//! job status. The `api` crate wires these into an axum server.

pub mod artifact;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod job;
pub mod metadata;
pub mod status;
pub mod workspace;
