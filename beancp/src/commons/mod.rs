//! Ready-made converter sets.
//!
//! - [`number_converters`] - casts between the numeric primitives
//! - [`collection_converters`] - conversions between the standard collections
//!
//! ```rust,ignore
//! let mapper = MapperBuilder::new()
//!     .add_converters(commons::number_converters())?
//!     .add_converters(commons::collection_converters::<String>())?
//!     .build();
//! ```

mod collections;
mod numbers;

pub use collections::collection_converters;
pub use numbers::number_converters;
