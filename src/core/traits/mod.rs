pub mod judge;
pub mod sleeper;
