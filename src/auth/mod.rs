mod claims;
mod jwt;

pub use claims::{Claims, Principal};
pub use jwt::JwtValidator;
