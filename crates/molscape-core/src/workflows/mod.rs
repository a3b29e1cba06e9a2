//! # Workflows Module
//!
//! This module provides the public entry point that turns a parsed model into the
//! geometry of one representation.
//!
//! ## Overview
//!
//! A consumer parses a file once, picks a model with [`derive::select_model`] and
//! calls [`derive::derive`] with the [`derive::Representation`] it wants to draw.
//! Switching representation is just another call with the same model; nothing is
//! cached between calls.
//!
//! ## Architecture
//!
//! - **Representation Dispatch** ([`derive`]) - One variant per representation, each owning
//!   its derivation, with output rescaled to render units.

pub mod derive;
