//! Secret lookup for integration credentials.
//!
//! Environment variables win so that headless and CI runs need no
//! keyring; otherwise the OS keyring is consulted under the `pomotray`
//! service. Tokens are only ever read here -- there is no auth flow.

const SERVICE: &str = "pomotray";

/// Look up a secret by key, env var first, then the OS keyring.
pub fn secret(key: &str) -> Option<String> {
    if let Ok(value) = std::env::var(key) {
        if !value.is_empty() {
            return Some(value);
        }
    }
    let entry = keyring::Entry::new(SERVICE, key).ok()?;
    entry.get_password().ok()
}

/// Store a secret in the OS keyring.
pub fn store_secret(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

/// Remove a secret from the OS keyring. Missing entries are fine.
pub fn delete_secret(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
