//! CLI command implementations.

pub(crate) mod search;
pub(crate) mod serve;
pub(crate) mod tree;

pub(crate) use search::SearchArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use tree::TreeArgs;
