pub mod role;
pub mod session;
pub mod sync;
pub mod user;

pub use role::RoleRecord;
pub use session::{RemoteSession, Session};
pub use sync::{SyncEvent, SyncPass, SyncPassOutcome, SyncReport};
pub use user::{NewUser, UserRecord, UserRole};
