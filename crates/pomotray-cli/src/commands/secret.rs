use clap::Subcommand;
use pomotray_core::secret;

#[derive(Subcommand)]
pub enum SecretAction {
    /// Store an integration token in the OS keyring
    Set {
        /// Token key (e.g. "SPOTIFY_ACCESS_TOKEN", "HABITS_API_TOKEN")
        key: String,
        /// Token value
        value: String,
    },
    /// Remove an integration token from the OS keyring
    Unset {
        /// Token key
        key: String,
    },
}

pub fn run(action: SecretAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SecretAction::Set { key, value } => {
            secret::store_secret(&key, &value)?;
            println!("stored {key}");
        }
        SecretAction::Unset { key } => {
            secret::delete_secret(&key)?;
            println!("removed {key}");
        }
    }
    Ok(())
}
