mod credentials;
mod keychain;
mod runtime;
mod settings;

pub use credentials::{Credential, CredentialSource, Environment};
pub use keychain::KeychainManager;
pub use runtime::RuntimeConfig;
pub use settings::{AppConfig, VerifySettings};
