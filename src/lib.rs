//! Frete booking core
//!
//! Exposes modules for integration testing and the headless driver.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
