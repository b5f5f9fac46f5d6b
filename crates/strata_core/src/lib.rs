//! Strata core types
//!
//! Foundation shared by every other Strata crate:
//!
//! - **Math**: `Vec3` and column-major `Mat4` with the handful of transforms a
//!   single decorative scene needs (TRS, Euler XYZ rotation, perspective)
//! - **Color**: linear RGBA with sRGB hex decoding
//! - **Teardown**: `Disposable` resources collected in a `DisposeBag` that
//!   releases everything exactly once

pub mod color;
pub mod dispose;
pub mod math;

pub use color::Color;
pub use dispose::{DisposeBag, Disposable, OnDispose};
pub use math::{Mat4, Rect, Vec3};

/// Single-threaded shared state holder used by the stage components
pub type Shared<T> = std::rc::Rc<std::cell::RefCell<T>>;

/// Wrap a value in a [`Shared`] cell
pub fn shared<T>(value: T) -> Shared<T> {
    std::rc::Rc::new(std::cell::RefCell::new(value))
}
