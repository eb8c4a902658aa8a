use eyre::{Result, WrapErr};
use keyring::Entry;
use zeroize::Zeroizing;

const SERVICE_NAME: &str = "liftoff";

/// Read access to secrets kept in the OS keychain
pub struct KeychainManager {
    service: String,
}

impl KeychainManager {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Retrieve a secret from the keychain
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(&self.service, key)
            .wrap_err_with(|| format!("Failed to access keychain entry for {}", key))?;

        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).wrap_err_with(|| format!("Failed to retrieve secret for {}", key)),
        }
    }

    /// Retrieve a secret with zeroization for sensitive data
    pub fn get_zeroizing(&self, key: &str) -> Result<Option<Zeroizing<String>>> {
        self.get(key).map(|opt| opt.map(Zeroizing::new))
    }
}

impl Default for KeychainManager {
    fn default() -> Self {
        Self::new()
    }
}
