//! Command-line front end: read legacy source, print the JSON tree.
//!
//! ```bash
//! # Parse a COBOL program (dialect inferred from the extension)
//! codelift ESCAL130.cbl
//!
//! # Force the dialect, pretty-print
//! codelift --dialect windev exports/commandes.txt --pretty
//!
//! # Read from stdin
//! cat program.cbl | codelift --dialect cobol -
//! ```

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Parse legacy source (WinDev-style 4GL or COBOL) into a JSON AST.
#[derive(Parser)]
#[command(name = "codelift", version, about)]
struct Cli {
    /// Source file, or `-` for stdin.
    path: PathBuf,

    /// Source dialect. Defaults by extension: cob/cbl/cpy → cobol,
    /// anything else → windev.
    #[arg(long, value_enum)]
    dialect: Option<Dialect>,

    /// Pretty-print the JSON output.
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Dialect {
    Windev,
    Cobol,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dialect = cli
        .dialect
        .unwrap_or_else(|| dialect_from_extension(&cli.path));
    debug!(?dialect, path = %cli.path.display(), "parsing");

    let tree = if cli.path.as_os_str() == "-" {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .into_diagnostic()
            .context("failed to read stdin")?;
        match dialect {
            Dialect::Windev => codelift_windev::parse_to_json(&code),
            Dialect::Cobol => codelift_cobol::parse_to_json(&code),
        }
    } else {
        match dialect {
            Dialect::Windev => codelift_windev::parse_file(&cli.path)?.to_json(),
            Dialect::Cobol => codelift_cobol::parse_file(&cli.path)?.to_json(),
        }
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&tree).into_diagnostic()?
    } else {
        serde_json::to_string(&tree).into_diagnostic()?
    };
    println!("{rendered}");

    Ok(())
}

fn dialect_from_extension(path: &std::path::Path) -> Dialect {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("cob" | "cbl" | "cpy") => Dialect::Cobol,
        _ => Dialect::Windev,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_defaults() {
        assert_eq!(
            dialect_from_extension(std::path::Path::new("x.CBL")),
            Dialect::Cobol
        );
        assert_eq!(
            dialect_from_extension(std::path::Path::new("x.cob")),
            Dialect::Cobol
        );
        assert_eq!(
            dialect_from_extension(std::path::Path::new("export.txt")),
            Dialect::Windev
        );
        assert_eq!(
            dialect_from_extension(std::path::Path::new("-")),
            Dialect::Windev
        );
    }
}
