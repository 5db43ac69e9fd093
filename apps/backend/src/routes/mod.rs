pub mod concepts;
pub mod progress;
pub mod stats;
pub mod study;
