pub mod job;

pub use job::{EnvSource, EnvSourceKind, JobDescriptor, RunContext};
