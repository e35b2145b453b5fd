pub mod image;
pub mod workspace;
