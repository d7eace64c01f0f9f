pub mod repair;
pub mod seed;
