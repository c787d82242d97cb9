pub mod catalog;
pub(crate) mod files;
pub mod geometry;
pub mod grid;
pub mod locations;
pub mod satellites;
pub mod time;
