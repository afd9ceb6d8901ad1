#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # dset-diagnostics
//!
//! Error and warning collection for the descriptor-set compiler.
//!
//! Three kinds of reporter feed one collector: file-level reports with a
//! line and column, tokenizer reports about anonymous text, and semantic
//! reports naming a schema element. All of them become a
//! [`DiagnosticRecord`].
//!
//! ```rust
//! use dset_diagnostics::{Diagnostics, TextPosition};
//!
//! let mut diags = Diagnostics::new();
//! diags.add_error("shop/order.yaml", Some(TextPosition::new(2, 4)), "expected a mapping");
//! assert!(diags.has_errors());
//! assert_eq!(
//!     diags.records()[0].to_string(),
//!     "shop/order.yaml:3:5: expected a mapping"
//! );
//! ```

pub mod collector;
pub mod record;

pub use collector::{Diagnostics, STREAM_SOURCE};
pub use record::{DiagnosticRecord, Severity, TextPosition};
