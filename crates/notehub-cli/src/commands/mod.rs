pub mod attach;
pub mod common;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod favorite;
pub mod list;
pub mod new;
pub mod restore;
pub mod show;
