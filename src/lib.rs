//! Glbsplice - GLB chunk reader/writer and container repair
//!
//! Rebuilds a GLB container from the JSON chunk of one file and the BIN chunk
//! of another, keeping every chunk 4-byte aligned and the header length exact.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod container;
pub mod digest;
pub mod error;
pub mod inspect;
pub mod repair;

pub use error::{GlbError, Result};
