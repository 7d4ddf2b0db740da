//! `schelper-core`: domain building blocks shared by every other crate.
//!
//! Pure types only: identifiers, value objects and the domain error model.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{LinkId, UserId};
pub use value_object::{Email, Password, ValueObject};
