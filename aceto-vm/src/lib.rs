//! Core interpreter for Aceto: a stack-oriented esoteric language whose
//! source is a square grid of characters executed by walking a Hilbert
//! curve. This crate has no knowledge of terminals, files, or process
//! exit codes — see `aceto-io` and `aceto-cli` for those.

pub mod error;
pub mod grid;
pub mod hilbert;
pub mod interpreter;
pub mod io;
pub mod stack;
pub mod value;

pub use error::{AcetoError, ExitReason, LoadError, RunError};
pub use grid::Grid;
pub use interpreter::{ExitOutcome, Interpreter};
pub use io::Io;
pub use value::Value;
