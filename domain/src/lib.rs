//! Domain layer: the identity-linking and recipe-summarization flows plus the
//! gateway clients they drive. The `web` crate depends on this crate and maps
//! its error kinds onto HTTP responses; the HTTP clients used internally stay
//! encapsulated here.

pub mod error;
pub mod gateway;
pub mod identity_link;
pub mod recipe_summary;

pub use identity_link::{IdentityLinkGateway, LinkedSession};
pub use recipe_summary::Recipe;
