// crates/ksi-config/src/lib.rs
// ============================================================================
// Module: KSI Config Library
// Description: Verifier configuration model and wiring helpers.
// Purpose: Single source of truth for ksi-verifier.toml semantics.
// Dependencies: ksi-core, serde, toml
// ============================================================================

//! ## Overview
//! `ksi-config` loads `ksi-verifier.toml`, validates it fail-closed, and turns
//! it into a bound policy and a verifier with the configured audit sink.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
