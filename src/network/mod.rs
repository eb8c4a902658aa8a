mod explorer;
mod registry;

pub use explorer::{CustomChain, ExplorerEndpoint};
#[cfg(test)]
pub use explorer::EndpointSource;
pub use registry::{NetworkDescriptor, NetworkRegistry};
