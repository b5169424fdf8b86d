#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # mysql-tools
//!
//! Command-line front end for cross-foundation MySQL replication. The
//! workflows live in `mysql-tools-multisite`; the per-foundation cf client
//! lives in `mysql-tools-foundation`.

pub mod cli;
pub mod commands;
