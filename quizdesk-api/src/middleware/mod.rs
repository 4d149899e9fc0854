/// HTTP middleware
///
/// - `auth`: bearer-token authentication for the `/v1` routes
/// - `security`: response security headers

pub mod auth;
pub mod security;
