//! # cachegate
//!
//! Clears a page's persisted client-side state once per declared content
//! version, then records that it did so.
//!
//! A clearing pass runs a fixed sequence against the page:
//!
//! - **Durable storage**: every key except the version marker
//! - **Session storage**: everything
//! - **Cookies**: expired at every domain and path scope script can reach
//! - **Application cache**: pushed to obsolete, where still supported
//! - **Service workers**: unregistered
//! - **Cache storage**: every named cache deleted
//! - **Assets**: stylesheets, scripts and visible images refetched under a fresh URL
//!
//! Each step is best-effort; only failing to record the new marker fails the
//! pass, so an interrupted pass is retried on the next load.
//!
//! The browser is reached through the traits in [`env`]. The [`memory`]
//! module implements all of them, which is what the tests and the
//! `cachegate` command-line simulator run against.

pub mod cleaner;
pub mod cli;
pub mod common;
pub mod env;
pub mod memory;
pub mod ui;

pub use cleaner::{CleanOutcome, ClearReport, VersionGatedCleaner};
pub use common::config::ClearerConfig;
pub use common::errors::{ClearError, EnvError};
