//! # Engine Module
//!
//! This module implements the geometry derivations that turn a parsed model into
//! renderable primitives.
//!
//! ## Overview
//!
//! Every derivation works on a snapshot of `{index, element, position}` values and
//! returns plain data: bond lists, ribbon segments, relaxed position overrides and
//! surface blobs. Long-running derivations report progress through a
//! [`progress::ProgressReporter`] and poll a [`cancel::CancellationToken`] between
//! batches, so a caller can run them off the main thread and abandon them cleanly.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tunable constants for every derivation, with validation
//! - **Tasks** ([`tasks`]) - Bond inference, backbone extraction, ribbons, relaxation, surfaces
//! - **Spatial Indexing** ([`spatial`]) - Uniform hash grid shared by the neighbor searches
//! - **Progress Monitoring** ([`progress`]) - Phase and task events for user feedback
//! - **Cancellation** ([`cancel`]) - Cooperative stop flag checked between batches
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! ## Determinism
//!
//! Given the same snapshot, configuration and seed, every task returns the same
//! output whether or not the `parallel` feature is enabled. Parallel work is always
//! collected in index order before it is merged.

pub mod cancel;
pub mod config;
pub mod error;
pub mod progress;
pub mod spatial;
pub mod tasks;
