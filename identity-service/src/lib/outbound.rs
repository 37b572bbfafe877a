pub mod mail;
pub mod repositories;
pub mod tokens;
