pub mod connectivity;
pub mod local_store;
pub mod remote_store;

pub use connectivity::ConnectivityProbe;
pub use local_store::{RoleLocalStore, UserLocalStore};
pub use remote_store::{RemoteUser, RoleRemoteStore, UserRemoteStore};
