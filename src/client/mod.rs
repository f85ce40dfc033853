//! HTTP access to the application under test

pub mod session;
pub mod validate;

pub use session::{HttpResponse, HttpSession, JsonObject};
