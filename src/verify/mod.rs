mod etherscan;
mod registrar;

pub use registrar::{Registrar, VerificationResult};
