pub mod corpus;
pub mod index;
pub mod tokenizer;

pub use corpus::Document;
pub use index::{DocId, Index, SearchResult, TermId};
