// backend/src/services/embeddings/mod.rs

pub mod metadata;
pub mod retrieval;
pub mod service;
pub mod trait_def;
pub mod utils;

// Re-export the main types and traits for easy access
pub use metadata::MessageEmbeddingMetadata;
pub use retrieval::RetrievedMessage;
pub use service::EmbeddingPipelineService;
pub use trait_def::EmbeddingPipelineServiceTrait;
pub use utils::{extract_datetime, extract_string, extract_uuid};
