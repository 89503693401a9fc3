//! # spring-scout
//!
//! Static structure and call-flow explorer for Spring-style Java projects.
//!
//! ## Architecture
//!
//! - **scan**: Tracked-file discovery under a project root
//! - **parse**: tree-sitter based Java parsing with per-file error capture
//! - **model**: Structural data model and canonical method keys
//! - **classify**: Spring stereotype classification from annotations
//! - **structure**: Structural index extraction from parsed syntax trees
//! - **graph**: Call graph construction and cycle-safe traversal
//! - **cache**: Fingerprinted JSON analysis cache with atomic publish
//! - **analysis**: Scan-parse-index-link pipeline with cache probe
//! - **query**: Read-only queries over a completed analysis

pub mod analysis;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod config;
pub mod graph;
pub mod model;
pub mod parse;
pub mod query;
pub mod scan;
pub mod structure;
