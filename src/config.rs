//! Settings shared by the command line tools.

use clap::{Args, ValueEnum};

use crate::{Error, PasswordHash, Services};

/// The environment the tools are running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    /// Local development and testing.
    Dev,
    /// Live data. Destructive operations are refused.
    Prod,
}

/// Where the account database lives and how it should be treated.
///
/// Each field can be given as a command line flag or an environment variable.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Connection descriptor for the SQLite database, e.g. a file path.
    #[arg(long, env = "ACCOUNTS_DB_PATH", default_value = "accounts.db")]
    pub db_path: String,

    /// The environment the database belongs to.
    #[arg(
        long = "env",
        env = "ACCOUNTS_ENV",
        value_enum,
        default_value_t = Environment::Dev
    )]
    pub environment: Environment,

    /// The bcrypt work factor for new password hashes.
    #[arg(long, env = "ACCOUNTS_BCRYPT_COST", default_value_t = PasswordHash::DEFAULT_COST)]
    pub bcrypt_cost: u32,
}

impl Config {
    /// Whether the database holds live data.
    pub fn is_prod(&self) -> bool {
        self.environment == Environment::Prod
    }

    /// Open the services for the configured database.
    ///
    /// # Errors
    /// Returns an [Error::BackendError] if the database could not be opened.
    pub fn open_services(&self) -> Result<Services, Error> {
        Services::open_with_cost(&self.db_path, self.bcrypt_cost)
    }
}
