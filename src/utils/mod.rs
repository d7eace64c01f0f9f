pub mod error;
pub mod helpers;
pub mod jwt;
pub mod validation;
