//! Board bring-up for the Delta AGC7646V1 switch.
//!
//! The `platform` module describes the board; `hw_op` turns its boot-time
//! setup into typed operations that `linux` applies to the running system.

pub mod config;
pub mod error;
pub mod hw_op;
pub mod hw_trait;
pub mod linux;
pub mod peripheral;
pub mod platform;
pub mod thermal;
pub mod tracing;
