//! Dish photo → recipe. An uploader session posts an image to a bridge
//! endpoint, the bridge asks a vision model for a recipe, and the reply is
//! rendered as HTML.

pub mod client;
pub mod config;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod models;
pub mod services;

#[cfg(feature = "web-server")]
pub mod server;

#[cfg(all(test, feature = "web-server"))]
mod test_support;

pub use error::{ErrorKind, RecipeError, Result};
