pub mod auth;

pub use auth::{authenticate_jwt, ensure_correct_user_or_admin, AdminUser, AuthUser};
