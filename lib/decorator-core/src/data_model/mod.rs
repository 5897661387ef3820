//! Record model shared by all components.

mod batch;
pub use self::batch::Batch;

mod record;
pub use self::record::Record;

mod value;
pub use self::value::TypedValue;
