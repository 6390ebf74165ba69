// Similarity-based classification — nearest expense category by cosine
// similarity between transaction and keyword embeddings.

pub mod matcher;
pub mod similarity;

pub use matcher::{classify_transactions, CategoryMatcher, Classification};
pub use similarity::cosine_similarity;
