//! Route paths.

pub const GET_ROOT: &str = "/";
pub const POST_SIGNUP: &str = "/signup";
/// OAuth2 password-grant form login.
pub const POST_TOKEN: &str = "/token";
/// JSON login.
pub const POST_LOGIN: &str = "/login";
pub const POST_REFRESH_TOKEN: &str = "/refresh-token";
pub const POST_LOGOUT: &str = "/logout";
pub const POST_LOGOUT_ALL: &str = "/logout-all";
pub const GET_METER_STATUS: &str = "/meter-status";
