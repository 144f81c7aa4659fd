pub mod alignment;
pub mod config;
pub mod geometry;
pub mod guidance;
pub mod io;
pub mod planning;
pub mod session;
pub mod viz;
