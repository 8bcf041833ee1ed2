pub mod candidate;
pub mod decision;
pub mod job;
