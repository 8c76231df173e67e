//! `tasksync`: task list client that syncs with a remote store and falls
//! back to a local cache when the remote is unreachable.

pub mod app;
pub mod config;
pub mod remote;
pub mod repo;
pub mod sync;
pub mod view;
