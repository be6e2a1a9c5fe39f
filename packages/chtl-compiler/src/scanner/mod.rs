//! The unified scanner (spec §3.1/§4.1): splits a source file into typed
//! fragments before any of the CHTL/CHTL-JS/CSS pipelines run.

mod fragment;
mod scan;

pub use fragment::{Fragment, FragmentKind, OriginKind, PlaceholderId, PlaceholderTable};
pub use scan::scan;
