pub mod auth;
pub mod check_role;
pub mod response;
pub mod validate_user;

pub use auth::AuthUser;
pub use check_role::authorize;
pub use response::{ApiResponse, ApiResult};
pub use validate_user::CurrentUser;
