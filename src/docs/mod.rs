//! Documentation of Sterling B2B business processes (BPML) as Markdown or JSON.

pub mod bpml;
pub mod markdown;

pub use bpml::{BpmlProcess, parse_bpml, parse_bpml_file};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Markdown,
    Json,
}
