pub mod qdrant_client;

pub use qdrant_client::{QdrantClientService, VectorStore, build_message_point};
