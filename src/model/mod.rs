pub mod bug;
pub mod build;
pub mod commit;
pub mod crash;
