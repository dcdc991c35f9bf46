pub mod client;
pub mod collaborators;
pub mod documents;
pub mod memory;

pub use client::{RemoteRoleClient, RemoteUserClient};
pub use collaborators::{AuthClient, DocumentClient};
