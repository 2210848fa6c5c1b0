pub mod auth;
pub mod links;
pub mod validation;

pub use auth::{parse_bearer_token, verify_admin_token};
pub use links::encode_url;
pub use validation::InputValidator;
