//! Protocol composition.
//!
//! This module builds intersections: protocols satisfied only by values that
//! satisfy every one of their components.

mod intersection;

pub use intersection::{intersect, IntersectionBuilder};
