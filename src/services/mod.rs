pub mod aggregate;
pub mod playlist;
pub mod resolver;
