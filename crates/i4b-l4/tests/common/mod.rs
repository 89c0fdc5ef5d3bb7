#![allow(dead_code)]

pub mod l4_test;
pub mod mocks;

pub use l4_test::{L4Test, default_test_config};
pub use mocks::{MockBch, MockL3, MockL4};
