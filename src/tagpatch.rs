//! Positional template patching
//!
//!     This module orchestrates the patch pipeline for marker-tag templates.
//!     A template is tokenized into an ordered list of MarkerTag records,
//!     the records are planned into operations, and the operations are
//!     applied to the target document as one validated batch.
//!
//! The Patch Pipeline
//!
//!     The pipeline consists of:
//!         1. Tokenization. See [tokenizer]. A single left-to-right scan
//!            over the template extracts comment-embedded marker pairs,
//!            tracking nesting with an explicit stack. Attribute text is
//!            coerced to typed values during the scan; structured literals
//!            go through the restricted parser in [value].
//!
//!         2. Planning. See [executor]. Each tag becomes exactly one
//!            operation; unknown verbs and missing coordinates are rejected
//!            here rather than silently dropped.
//!
//!         3. Execution. See [executor]. The target is split into a line
//!            buffer, every operation is bounds-checked before the first
//!            mutation, and the batch is applied highest target position
//!            first so row and column meanings never shift mid-batch.
//!
//!     File handling lives in [patcher], the only module that touches the
//!     file system: it reads the template/target pair, runs the pipeline,
//!     and writes the result back only when every stage succeeded.
//!
//! Coordinates
//!
//!     Rows and columns are 0-indexed and address the *target* buffer, not
//!     the template. Rows must be in bounds at apply time; columns past the
//!     end of a line clamp to the line end.

pub mod config;
pub mod error;
pub mod executor;
pub mod patcher;
pub mod testing;
pub mod tokenizer;
pub mod value;

pub use config::{load_defaults, Loader, TagpatchConfig};
pub use error::PatchError;
pub use executor::{execute, plan, OpKind, Operation};
pub use patcher::{PairOutcome, Patcher, TreeReport};
pub use tokenizer::{tokenize, MarkerTag};
pub use value::Value;
