pub mod json;
pub mod jwt;
pub mod problem;
