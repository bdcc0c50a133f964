//! Entity/component store primitives

pub mod entity;
pub mod storage;

pub use entity::{EntityRef, Entities};
pub use storage::Storage;
