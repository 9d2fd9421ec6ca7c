pub mod character_generation;
pub mod character_service;
pub mod chat;
pub mod embeddings;
