//! Fetch-and-merge pipeline

pub mod merge;
pub mod orchestrator;

pub use merge::{merge_and_sort, merge_row};
pub use orchestrator::FetchOrchestrator;
