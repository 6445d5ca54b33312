//! textsafe CLI - Passphrase-based text encryption
//!
//! Encrypts text into `data:application/octet-binary;base64,` envelopes and
//! back, and keeps a small store of named encrypted records.

use clap::{Args, Parser, Subcommand};
use std::error::Error as StdError;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use textsafe::action::{self, Action, Sink};
use textsafe::config::{self, Config};
use textsafe::error::{ErrorCategory, ErrorKind, Result, TextsafeError};
use textsafe::output;
use textsafe::passphrase::{
    ConfirmingPassphraseReader, PassphraseReader, ReaderPassphraseReader,
    TerminalPassphraseReader,
};
use textsafe::records::RecordStore;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "textsafe")]
#[command(version)]
#[command(about = "Passphrase-based text encryption.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the record store (overrides the configuration file)
    #[arg(long, global = true, value_name = "FILE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TextArgs {
    /// File holding the text to transform (stdin if omitted)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// File to write the result to (stdout if omitted)
    #[arg(short, long, value_name = "FILE", conflicts_with = "replace")]
    output: Option<PathBuf>,

    /// Overwrite the input file with the result
    #[arg(long, requires = "input")]
    replace: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt text into an envelope
    #[command(alias = "e")]
    Encrypt(TextArgs),

    /// Decrypt an envelope back into text
    #[command(alias = "d")]
    Decrypt(TextArgs),

    /// Encrypt text and save it as a named record
    Store {
        /// Name of the record; an existing record of that name is replaced
        name: String,

        /// File holding the text to encrypt (stdin if omitted)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Decrypt a named record
    Open {
        /// Name of the record
        name: String,

        /// File to write the decrypted text to (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Remove a named record
    Remove {
        /// Name of the record
        name: String,
    },

    /// List stored record names
    Records,
}

/// Everything `main` needs besides the action itself.
struct Invocation {
    action: Action,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Commands {
    fn into_invocation(self) -> Invocation {
        let text = |args: TextArgs, make: fn(Sink) -> Action| {
            let sink = if args.replace { Sink::Replace } else { Sink::Stdout };
            Invocation {
                action: make(sink),
                input: args.input,
                output: args.output,
            }
        };

        match self {
            Commands::Encrypt(args) => text(args, Action::Encrypt),
            Commands::Decrypt(args) => text(args, Action::Decrypt),
            Commands::Store { name, input } => Invocation {
                action: Action::EncryptStore { name },
                input,
                output: None,
            },
            Commands::Open { name, output } => Invocation {
                action: Action::OpenRecord { name },
                input: None,
                output,
            },
            Commands::Remove { name } => Invocation {
                action: Action::RemoveRecord { name },
                input: None,
                output: None,
            },
            Commands::Records => Invocation {
                action: Action::ListRecords,
                input: None,
                output: None,
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", report(&e));
            process::exit(1);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    log::debug!("using config {}", config_path.display());

    if let Err(e) = run(cli, config) {
        log::debug!("failed: {:?}", e);
        eprintln!("Error: {}", report(&e));
        process::exit(1);
    }
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let invocation = cli.command.into_invocation();
    let action = &invocation.action;

    let input = if action.needs_input() {
        read_input(
            invocation.input.as_ref(),
            cli.passphrase_stdin && action.needs_passphrase(),
        )?
    } else {
        String::new()
    };

    let mut reader = get_passphrase_reader(cli.passphrase_stdin, action, &config);

    let mut store = if action.needs_store() {
        let path = cli.store.unwrap_or(config.store);
        Some(RecordStore::open(path)?)
    } else {
        None
    };

    let outcome = action::execute(action, &input, &mut *reader, store.as_mut())?;

    if let Some(text) = outcome.text {
        match (action.sink(), &invocation.input, &invocation.output) {
            (Sink::Replace, Some(path), _) => output::write_atomic(path, text.as_bytes())
                .map_err(|e| e.with_context(format!("failed to replace {}", path.display())))?,
            (_, _, Some(path)) => output::write_secure(path, text.as_bytes())
                .map_err(|e| e.with_context(format!("failed to write to {}", path.display())))?,
            _ => write_stdout(&text)?,
        }
    }

    if let Some(notice) = outcome.notice {
        eprintln!("{}", notice);
    }
    Ok(())
}

fn read_input(path: Option<&PathBuf>, passphrase_stdin: bool) -> Result<String> {
    if let Some(path) = path {
        return output::read_text(path);
    }
    if passphrase_stdin {
        return Err(TextsafeError::user(
            ErrorKind::InvalidInput,
            "--passphrase-stdin requires the text to come from --input",
        ));
    }

    let mut text = String::new();
    io::stdin().read_to_string(&mut text).map_err(|e| {
        TextsafeError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            "failed to read text from stdin",
            e,
        )
    })?;
    Ok(text)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(|e| {
            TextsafeError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to write to stdout",
                e,
            )
        })
}

/// Stands in for a reader when the action never asks for a passphrase.
struct NoPassphrase;

impl PassphraseReader for NoPassphrase {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        Err(TextsafeError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InternalInvariant,
            "passphrase requested by an action that does not use one",
        ))
    }
}

fn get_passphrase_reader(
    use_stdin: bool,
    action: &Action,
    config: &Config,
) -> Box<dyn PassphraseReader> {
    if !action.needs_passphrase() {
        Box::new(NoPassphrase)
    } else if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(io::stdin())))
    } else if action.is_encryption() && config.confirm_passphrase {
        Box::new(ConfirmingPassphraseReader::terminal())
    } else {
        Box::new(TerminalPassphraseReader::default())
    }
}

/// The error message followed by each distinct message in its source chain.
fn report(err: &TextsafeError) -> String {
    let mut msg = err.to_string();
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(s) = source {
        let next = s.to_string();
        if !msg.ends_with(&next) {
            msg.push_str(": ");
            msg.push_str(&next);
        }
        source = s.source();
    }
    msg
}
