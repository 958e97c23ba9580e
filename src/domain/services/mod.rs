pub mod aggregate;
pub mod anchors;
pub mod editing;
pub mod extract;
pub mod normalize;
pub mod tokenizer;

pub use aggregate::aggregate;
pub use extract::{extract, extract_with_header};
