pub mod batch;
pub mod classifying;
pub mod polling;
