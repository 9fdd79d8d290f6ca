use std::ffi::OsString;
use std::io::Write;

use clap::{CommandFactory, Parser, Subcommand};

use crate::directory::AccountDirectory;
use crate::ServiceAccount;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = -1;

/// Create or destroy local service accounts.
#[derive(Parser, Debug)]
#[command(name = "service-account", disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// create a service account and assign it the `log on as a service' right.
    Create {
        #[arg(value_name = "account name", allow_hyphen_values = true)]
        name: String,
        #[arg(value_name = "account password", allow_hyphen_values = true)]
        password: String,
        /// description stored with the account
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// destroy a service account, respective rights and profile.
    Destroy {
        #[arg(value_name = "account name", allow_hyphen_values = true)]
        name: String,
        /// confirm every step before performing it
        #[cfg(feature = "tui")]
        #[arg(long)]
        interactive: bool,
    },
}

/// Runs one command against `dir`, writing a one line outcome to `out`.
/// Returns the process exit code.
pub fn run<D, I, T>(dir: &D, args: I, out: &mut impl Write) -> i32
where
    D: AccountDirectory,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            tracing::debug!("could not parse arguments: {e}");
            let help = Cli::command().render_help();
            report(out, format_args!("{help}"));
            return FAILURE;
        }
    };

    match cli.command {
        Command::Create {
            name,
            password,
            comment,
        } => create(dir, out, &name, &password, &comment),
        #[cfg(feature = "tui")]
        Command::Destroy {
            name,
            interactive: true,
        } => destroy_interactively(dir, out, &name),
        Command::Destroy { name, .. } => destroy(dir, out, &name),
    }
}

fn report(out: &mut impl Write, msg: std::fmt::Arguments<'_>) {
    if let Err(e) = writeln!(out, "{msg}") {
        tracing::error!("could not write to output: {e}");
    }
}

fn create<D: AccountDirectory>(
    dir: &D,
    out: &mut impl Write,
    name: &str,
    password: &str,
    comment: &str,
) -> i32 {
    let account = ServiceAccount::new()
        .name(name)
        .password(password)
        .comment(comment);

    if account.exists(dir) {
        report(
            out,
            format_args!("ERROR did not create the account because it already exists."),
        );
        return FAILURE;
    }

    if let Err(e) = account.create(dir) {
        tracing::error!("creating `{name}` failed: {e}");
        report(
            out,
            format_args!("ERROR failed to create account with result={}", e.code()),
        );
        return FAILURE;
    }

    report(out, format_args!("created service account `{name}`"));
    SUCCESS
}

fn destroy<D: AccountDirectory>(dir: &D, out: &mut impl Write, name: &str) -> i32 {
    let account = ServiceAccount::new().name(name);

    if !account.exists(dir) {
        report(
            out,
            format_args!("WARN did not destroy the account because it does not exist."),
        );
        return FAILURE;
    }

    if let Err(e) = account.destroy(dir) {
        tracing::error!("destroying `{name}` failed during {}: {e}", e.step());
        report(
            out,
            format_args!("ERROR failed to remove account with result={}", e.code()),
        );
        return FAILURE;
    }

    report(out, format_args!("destroyed service account `{name}`"));
    SUCCESS
}

#[cfg(feature = "tui")]
fn destroy_interactively<D: AccountDirectory>(dir: &D, out: &mut impl Write, name: &str) -> i32 {
    let account = ServiceAccount::new().name(name);

    if !account.exists(dir) {
        report(
            out,
            format_args!("WARN did not destroy the account because it does not exist."),
        );
        return FAILURE;
    }

    let teardown = match account.prepare_destroy(dir) {
        Ok(teardown) => teardown,
        Err(e) => {
            report(
                out,
                format_args!("ERROR failed to remove account with result={}", e.code()),
            );
            return FAILURE;
        }
    };

    match crate::tui::removal::start(teardown, &mut *out) {
        Ok(()) => {
            report(out, format_args!("destroyed service account `{name}`"));
            SUCCESS
        }
        Err(e) => {
            report(out, format_args!("ERROR {e}"));
            FAILURE
        }
    }
}
