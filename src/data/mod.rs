pub mod feedback;
pub mod question;
pub mod resource;
pub mod schema;
pub mod scoped;
pub mod store;
