//! Route paths shared by the router, the route guard and clients

// API
pub const API_PREFIX: &str = "/api";
pub const API_LOGIN: &str = "/api/auth/login";
pub const API_REGISTER: &str = "/api/auth/register";
pub const API_LOGOUT: &str = "/api/auth/logout";
pub const API_ME: &str = "/api/auth/me";
pub const API_USERS: &str = "/api/users";
pub const API_HEALTH: &str = "/api/health";
pub const API_HEALTH_READY: &str = "/api/health/ready";

// Pages
pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const DASHBOARD: &str = "/dashboard";
pub const PROFILE: &str = "/profile";
