//! Content graph building blocks: sources, kinds, pages, permalinks.

pub mod front_matter;
pub mod kind;
pub mod output;
pub mod page;
pub mod permalink;
pub mod scan;
pub mod source;
pub mod taxonomy;
