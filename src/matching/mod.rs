pub mod rank;
pub mod text;

pub use rank::{dedupe, rank};
pub use text::{TextProcessingContext, score};
