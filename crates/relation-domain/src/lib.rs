//! relation-domain: Person, Friendship, and the tagged error model shared by
//! every other crate in the workspace.
//!
//! Ported from `original_source/internal/{person,friendship,errors}.go`.

pub mod error;
pub mod friendship;
pub mod person;

pub use error::{error_code, ErrorCode, RelationError, Result};
pub use friendship::Friendship;
pub use person::Person;
