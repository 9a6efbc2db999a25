pub mod assembler;
pub mod cache;
pub mod extractor;
pub mod fusion;
pub mod intent;
pub mod keywords;
pub mod pipeline;
#[cfg(test)]
mod pipeline_tests;
pub mod retrieval;
pub mod vector_store;

pub use cache::ResponseCache;
pub use extractor::GroundedExtractor;
pub use fusion::ResultFuser;
pub use pipeline::QueryPipeline;
pub use retrieval::{KeywordRetriever, Retriever, SemanticRetriever};
pub use vector_store::VectorStoreService;
