//! Guild snapshot domain: captured workspace state, its stores and the
//! services that capture and replay it.

pub mod command;
pub mod exception;
#[cfg(feature = "mock")]
pub mod mock;
pub mod model;
pub mod repository;
pub mod service;
