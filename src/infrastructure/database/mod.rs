pub mod connection;
pub mod role_repository;
pub mod rows;
pub mod user_repository;

pub use connection::{Database, DbPool};
pub use role_repository::SqliteRoleRepository;
pub use user_repository::SqliteUserRepository;
