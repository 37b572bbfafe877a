pub mod claims;
pub mod engine;
pub mod errors;
pub mod handler;

pub use claims::Claims;
pub use claims::TokenKind;
pub use engine::IssuedToken;
pub use engine::TokenEngine;
pub use engine::BEARER_SCHEME;
pub use errors::JwtError;
pub use handler::JwtHandler;
