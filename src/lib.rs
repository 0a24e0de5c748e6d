pub mod discover;
pub mod error;
pub mod output;
pub mod report;
