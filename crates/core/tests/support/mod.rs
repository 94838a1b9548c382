//! Shared test helpers for `restorekit-core` integration tests.
//!
//! A scripted in-memory storage service stands in for every port so the
//! tests can focus on behaviour and call counts instead of HTTP plumbing.

#![allow(dead_code)]

pub mod archive;

pub use archive::*;
