pub mod docker;
pub mod views;
