//! Domain types for the cafe catalog.

pub mod id;
pub mod product;
pub mod status;
pub mod user;

pub use id::*;
pub use product::{Category, CategoryRef, Product, ProductDraft, UserRef};
pub use status::*;
pub use user::User;
