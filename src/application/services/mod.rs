pub mod hybrid_role;
pub mod hybrid_user;
pub mod password_reconciliation;
pub mod session;
pub mod sync_service;

pub use hybrid_role::HybridRoleDal;
pub use hybrid_user::{CreateUserRequest, HybridUserDal, RegisterRequest};
pub use password_reconciliation::PasswordReconciliation;
pub use session::SessionState;
pub use sync_service::SyncService;
