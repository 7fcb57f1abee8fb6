pub mod artifact;
pub mod blob;
