//! Topology building blocks.

mod ids;
pub use self::ids::ComponentId;

pub mod interconnect;
