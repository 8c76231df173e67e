//! Shared data model and wire formats for `tasksync`.

pub mod codec;
pub mod remote;
pub mod task;
