mod artifact;
mod deployment;
mod encode;
mod executor;

pub use artifact::{ArtifactStore, SourceMetadata};
pub use deployment::{DeployedContract, DeploymentJournal};
pub use executor::Executor;

#[cfg(test)]
pub(crate) use deployment::tests as deployment_fixtures;
