//! CHTL-JS: the JavaScript superset embedded in `script { ... }` blocks
//! (spec §4.7). `lower` is the only entry point the CHTL generator calls.

pub mod ast;
pub mod generator;
pub mod lexer;

use crate::error::Result;

pub fn lower(source: &str) -> Result<String> {
    let segments = lexer::scan(source)?;
    generator::lower(&segments)
}
