pub mod properties;

pub use properties::{FindQuery, PropertyService};
