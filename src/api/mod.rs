pub mod dashboard;
pub mod wire;
