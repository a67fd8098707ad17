//! Rewarded-engagement economy tuning: balance buckets with dynamic rhythm
//! dimensions, withdrawal tasks and the withdrawal queue.

pub(crate) mod config;
pub(crate) mod queue;
pub(crate) mod rhythm;
pub(crate) mod tasks;
