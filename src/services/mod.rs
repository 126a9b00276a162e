pub mod extraction;
pub mod recommendation;
pub mod scheduler;
pub mod storage;
pub mod training;
