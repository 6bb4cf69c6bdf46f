//! CLI commands.

pub mod favorite;
pub mod login;
pub mod manga;
pub mod search;
pub mod source;
