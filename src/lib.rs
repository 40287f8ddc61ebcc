pub mod archive;
pub mod classify;
pub mod config;
pub mod humanize;
pub mod observability;
pub mod progress;
pub mod remote;
pub mod run;
pub mod storage;
