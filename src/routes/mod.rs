pub mod authentication;
pub mod question;
pub mod render;
pub mod tag;
