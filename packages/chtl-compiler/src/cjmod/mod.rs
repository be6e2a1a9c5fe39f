//! The CJMOD API surface (spec §4.8) and the built-in Chtholly module that
//! exercises it (SPEC_FULL §11.3).

pub mod api;
pub mod builtin;

pub use api::{Arg, CHTLJSFunction, CJMODGenerator, CJMODScanner, Placeholder, PlaceholderKind, Syntax};
