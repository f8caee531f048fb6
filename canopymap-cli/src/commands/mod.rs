//! CLI command implementations.

pub mod common;
pub mod demo;
pub mod orgs;
pub mod token;
