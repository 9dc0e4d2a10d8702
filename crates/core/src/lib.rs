//! Core library for animgen
//!
//! This crate implements the **Functional Core** of the animgen application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The animgen project uses a two-crate architecture to enforce separation of
//! concerns:
//!
//! - **`animgen_core`** (this crate): Pure transformation functions with zero I/O
//! - **`animgen`**: I/O operations and orchestration (the Imperative Shell)
//!
//! Every network call the application makes — the chat-completion request to
//! the hosted model, the upload/execute/download calls against the session
//! pool — lives in the shell. What lives here is everything that can be
//! computed from strings alone:
//!
//! - [`codegen`]: prompt construction, markdown code-block extraction, and
//!   scene-name detection for model-generated manim source
//! - [`session`]: session-pool URL construction, render-command rendering,
//!   execution-response classification, and artifact-path resolution
//!
//! All functions in this crate are pure and deterministic, and are tested
//! with simple fixture data. No mocking required.

pub mod codegen;
pub mod session;
