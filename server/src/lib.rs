#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod http;
pub mod settings;
pub mod storage;
pub mod versioning;
