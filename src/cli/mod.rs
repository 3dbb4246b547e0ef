//! Command Line Interface (CLI) layer for the translation driver.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) that reads the input, runs the
//! selected translation, and writes the result. It wires user-provided
//! options to the underlying library functionality exposed via
//! `btorir::translate`.
//!
//! If you are embedding the translations into another application, prefer
//! using the high-level `btorir::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
