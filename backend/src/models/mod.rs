pub mod auth;
pub mod characters;
pub mod conversations;
pub mod users;
