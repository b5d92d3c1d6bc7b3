use std::{error::Error, io, process::exit};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use account_service::{
    Config, Error as AccountError, PlaintextPassword, User, UserID,
    token::{REMEMBER_TOKEN_BYTES, random_token},
};

/// A utility for managing the accounts in an account database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create any missing tables.
    Migrate,
    /// Drop every table and create them again. Refused with `--env prod`.
    Reset,
    /// Create a new user. The password is read from the terminal.
    CreateUser {
        /// The user's display name.
        #[arg(long, default_value = "")]
        name: String,
        /// The user's email address.
        #[arg(long)]
        email: String,
    },
    /// Check a user's password. The password is read from the terminal.
    Authenticate {
        /// The user's email address.
        #[arg(long)]
        email: String,
    },
    /// Set a new password for a user. The password is read from the terminal.
    ResetPassword {
        /// The user's email address.
        #[arg(long)]
        email: String,
    },
    /// Print a user as JSON.
    ShowUser {
        /// The user's ID.
        #[arg(long, required_unless_present = "email", conflicts_with = "email")]
        id: Option<i64>,
        /// The user's email address.
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a user.
    DeleteUser {
        /// The user's ID.
        #[arg(long)]
        id: i64,
    },
    /// Print a random URL-safe token.
    Token {
        /// How many random bytes the token holds.
        #[arg(long, default_value_t = REMEMBER_TOKEN_BYTES)]
        bytes: usize,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    if let Command::Token { bytes } = args.command {
        println!("{}", random_token(bytes)?);
        return Ok(());
    }

    let services = args.config.open_services()?;
    services.auto_migrate()?;

    match args.command {
        Command::Migrate => {
            println!("Database at {:?} is up to date.", args.config.db_path);
        }
        Command::Reset => {
            if args.config.is_prod() {
                print_error("Refusing to reset a production database.");
                exit(1);
            }

            services.destructive_reset()?;
            println!("Database at {:?} has been reset.", args.config.db_path);
        }
        Command::CreateUser { name, email } => {
            let Some(password) = prompt_new_password() else {
                return Ok(());
            };

            let mut user = User::new(&name, &email, "");
            user.password = password;

            match services.user.create(&mut user) {
                Ok(()) => print_user(&user)?,
                Err(AccountError::ConstraintViolation(_)) => {
                    print_error(format!("The email {email} is already in use."));
                    exit(1);
                }
                Err(error) => return Err(error.into()),
            }
        }
        Command::Authenticate { email } => {
            let Some(password) = prompt_password("Password: ") else {
                return Ok(());
            };

            match services.user.authenticate(&email, &password) {
                Ok(user) => print_user(&user)?,
                // Do not reveal which of the two was wrong.
                Err(AccountError::NotFound | AccountError::InvalidCredentials) => {
                    print_error("Invalid email or password.");
                    exit(1);
                }
                Err(error) => return Err(error.into()),
            }
        }
        Command::ResetPassword { email } => {
            let mut user = match services.user.by_email(&email) {
                Ok(user) => user,
                Err(AccountError::NotFound) => {
                    print_error(format!("There is no user with the email {email}."));
                    exit(1);
                }
                Err(error) => return Err(error.into()),
            };

            println!("Resetting password for {}", user.email);

            let Some(password) = prompt_new_password() else {
                return Ok(());
            };
            user.password = password;

            services.user.update(&mut user)?;
            println!("Password updated successfully!");
        }
        Command::ShowUser { id, email } => {
            let result = match email {
                Some(email) => services.user.by_email(&email),
                None => services.user.by_id(UserID::new(id.unwrap_or_default())),
            };

            match result {
                Ok(user) => print_user(&user)?,
                Err(error) if error.is_expected() => {
                    print_error(error);
                    exit(1);
                }
                Err(error) => return Err(error.into()),
            }
        }
        Command::DeleteUser { id } => match services.user.delete(UserID::new(id)) {
            Ok(()) => println!("Deleted user {id}."),
            Err(error) if error.is_expected() => {
                print_error(error);
                exit(1);
            }
            Err(error) => return Err(error.into()),
        },
        Command::Token { bytes } => println!("{}", random_token(bytes)?),
    }

    services.close()?;

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_log).init();
}

fn print_user(user: &User) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(user)?);

    Ok(())
}

fn prompt_password(prompt: &str) -> Option<String> {
    match rpassword::prompt_password(prompt) {
        Ok(string) => Some(string),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn prompt_new_password() -> Option<PlaintextPassword> {
    loop {
        println!();

        let first_password = prompt_password("Enter a new password: ")?;

        if first_password.is_empty() {
            print_error("Password cannot be empty, try again.");
            continue;
        }

        let second_password = prompt_password("Enter the same password again: ")?;

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        return Some(PlaintextPassword::new(&first_password));
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
