//! Command result output.
//!
//! - `OutputWriter`: writes rules, catalogs and prompts as text or JSON

mod writer;

pub use writer::OutputWriter;
