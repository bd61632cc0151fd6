//! Conversation domain.
//!
//! - [`entities::Message`]: a single role-tagged message
//! - [`normalize::RoleNormalizer`]: merges same-role runs into alternation

pub mod entities;
pub mod normalize;
