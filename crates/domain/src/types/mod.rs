//! Domain types and models

pub mod featurable;
pub mod feature;

pub use featurable::{Featurable, FeaturableKey};
pub use feature::{Feature, FeatureState};
