mod geo;
mod rupees;

pub use geo::GeoPoint;
pub use rupees::{Rupees, RupeesConversionError};
