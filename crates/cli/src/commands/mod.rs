//! Subcommand implementations.
//!
//! Command output goes to stdout; diagnostics go through `tracing` to
//! stderr.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod dashboard;
pub mod orders;

use std::io::{BufRead, Write};

use fitsupply_client::ClientError;
use secrecy::SecretString;
use thiserror::Error;

/// Errors surfaced by a subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Client, session or backend failure.
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Bad command-line input.
    #[error("{0}")]
    Input(String),

    /// Terminal I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write lines to stdout.
pub(crate) fn emit(lines: &[String]) -> Result<(), CommandError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

/// Use the given secret, or read one line from stdin.
pub(crate) fn secret_or_stdin(
    value: Option<String>,
    label: &str,
) -> Result<SecretString, CommandError> {
    if let Some(value) = value {
        return Ok(SecretString::from(value));
    }
    tracing::debug!("Reading {label} from stdin");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let line = line.trim_end_matches(['\r', '\n']).to_owned();
    if line.is_empty() {
        return Err(CommandError::Input(format!("No {label} provided")));
    }
    Ok(SecretString::from(line))
}

/// Left-align `cells` into columns of the given widths.
pub(crate) fn row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths.iter().chain(std::iter::repeat(&0)))
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}
