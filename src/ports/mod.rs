pub mod reddit;
pub mod spotify;
