pub mod positions;
pub mod study;

pub use study::StudyService;
