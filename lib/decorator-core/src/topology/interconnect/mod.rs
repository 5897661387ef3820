//! Component interconnects.

mod batch_stream;
pub use self::batch_stream::{BatchSender, BatchStream};

mod forwarder;
pub use self::forwarder::{Consumer, Forwarder};

mod wiring;
pub use self::wiring::Wiring;
