pub mod ai;
pub mod capability;
pub mod deploy;
pub mod health;
pub mod media;
pub mod repo;
pub mod stats;
pub mod system;
pub mod task;
