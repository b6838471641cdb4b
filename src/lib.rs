// src/lib.rs

//! GenQuote session library

pub mod error;
pub mod models;
pub mod platform;
pub mod services;
pub mod session;
pub mod storage;
#[cfg(feature = "cli")]
pub mod terminal;
pub mod utils;

pub use session::{QuoteSession, SessionBuilder};
