//! Post subject storage
//!
//! A subject is a named post category with a description and keywords. The
//! whole list lives in one JSON array on disk and is rewritten on every change.

pub mod error;
pub mod model;
pub mod store;

pub use error::StoreError;
pub use model::{NewSubject, Subject, SubjectPatch};
pub use store::{StoreResult, SubjectStore};
