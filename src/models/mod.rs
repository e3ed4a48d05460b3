pub mod listing;
pub mod match_result;
pub mod resume;

pub use listing::{JobListing, RawListing};
pub use match_result::MatchResult;
pub use resume::ResumeProfile;
