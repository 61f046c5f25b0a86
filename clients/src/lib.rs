//! Client-side helpers for the `compapp` binaries.
//!
//! [`samples`] declares a small set of parameter trees that the
//! `compapp-params` binary can instantiate by class path.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod samples;
