//! Mirror backends

pub mod content_disposition;
pub mod cursemaven;

pub use cursemaven::CurseMaven;
