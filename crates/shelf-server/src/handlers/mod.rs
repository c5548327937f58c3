//! HTTP request handlers.

pub(crate) mod config;
pub(crate) mod images;
pub(crate) mod pages;
pub(crate) mod search;
pub(crate) mod tables;
pub(crate) mod workspace;
