//! Pipeline components.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod transforms;
