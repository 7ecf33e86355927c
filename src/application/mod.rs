//! Application services layer.

pub mod auth;
pub mod categories;
pub mod error;
pub mod images;
pub mod menu;
pub mod news;
pub mod repos;
