pub mod keywords;
pub mod location;

pub use keywords::{KeywordSet, SelectionPolicy};
pub use location::GeographyFilter;
