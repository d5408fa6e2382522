//! # Trained Models
//!
//! [`Model`] wraps a validated [`crate::proto::ModelProto`] with the lookup
//! structures segmentation needs.

#[allow(clippy::module_inception)]
pub mod model;
pub mod piece;
pub mod prefix_matcher;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[doc(inline)]
pub use model::{Model, SpanRef};
#[doc(inline)]
pub use piece::Piece;
#[doc(inline)]
pub use prefix_matcher::{PrefixMatcher, PrefixMatches};
