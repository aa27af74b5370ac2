//! Single-assignment promises and observable cells for building reactive clients in Rust.
//!
//! # Example
//!
//! ```
//! use piguard::prelude::*;
//!
//! let temperature = Cell::new(None::<String>);
//! let label = temperature.clone();
//!
//! Promise::resolved(21.0)
//!     .then(|celsius| format!("{celsius}°C"))
//!     .on_success(move |text| label.set(Some(text.clone())))
//!     .join()
//!     .unwrap();
//!
//! assert_eq!(temperature.get().as_deref(), Some("21°C"));
//! ```

pub use piguard_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use piguard_internal::prelude::*;
}
