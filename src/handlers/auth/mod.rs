// Session-lifecycle endpoints. Login and refresh are public (token
// acquisition); logout, logout-all, and profile require a verified access
// token plus the live-user re-check.

pub mod login;
pub mod profile;
pub mod refresh;
pub mod session;

pub use login::login_post;
pub use profile::{profile_get, profile_put};
pub use refresh::refresh_post;
pub use session::{logout_all_post, logout_post};

use axum::http::HeaderMap;

use crate::auth::DeviceInfo;

/// Best-effort client metadata for session diagnostics
pub(crate) fn device_info_from_headers(headers: &HeaderMap) -> DeviceInfo {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        });

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    DeviceInfo { ip_address, user_agent }
}
