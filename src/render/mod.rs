pub mod formatter;
pub mod json;
