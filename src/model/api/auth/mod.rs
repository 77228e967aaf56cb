mod token;

pub use token::{AuthResponse, AuthToken, AUTH_TOKEN_COOKIE};
