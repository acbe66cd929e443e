//! Drivers for board peripherals reached over the `hw_trait` interfaces.

pub mod cpld;
