//! Transform implementations.

mod decorator;
pub use self::decorator::{decorate, DecorateError, Decorator, DecoratorConfiguration, DeviceProfile};
