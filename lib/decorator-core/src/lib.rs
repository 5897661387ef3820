//! Core primitives for building record-enriching pipeline stages.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod components;
pub mod data_model;
pub mod state;
pub mod topology;

mod error;
pub use self::error::{ErrorContext, GenericError};

#[doc(hidden)]
pub use anyhow::anyhow as _anyhow;
