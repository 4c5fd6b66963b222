//! Workspace automation for sybase-ctlib-driver.
//!
//! Run with `cargo xtask <command>`:
//!
//! - `ci`: formatting, clippy, and tests with and without default features
//! - `fmt [--fix]`, `clippy`, `test [-p <crate>] [--minimal]`, `doc`
//! - `bench [filter]`: criterion benchmarks of sybase-types and sybase-client
//! - `demo`: the mock session example with driver debug logging

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use xshell::{Shell, cmd};

/// Crates with criterion benchmarks.
const BENCHED: [&str; 2] = ["sybase-types", "sybase-client"];

#[derive(Parser)]
#[command(name = "xtask", about = "Automation for the sybase-ctlib-driver workspace")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Format check, clippy, full and minimal test runs
    Ci,
    /// Check formatting, or apply it with --fix
    Fmt {
        #[arg(long)]
        fix: bool,
    },
    /// Clippy over all targets with warnings denied
    Clippy,
    /// Run tests
    Test {
        /// Limit to one crate
        #[arg(short, long)]
        package: Option<String>,
        /// Without default features (no rust_decimal conversions)
        #[arg(long)]
        minimal: bool,
    },
    /// Build API docs for the workspace crates
    Doc,
    /// Run benchmarks, optionally filtered by name
    Bench { filter: Option<String> },
    /// Run the mock session example with debug logging
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(workspace_root()?);

    match cli.command {
        Task::Ci => {
            fmt(&sh, false)?;
            cmd!(sh, "cargo clippy --workspace --all-targets --all-features -- -D warnings").run()?;
            test(&sh, None, false)?;
            test(&sh, None, true)?;
            println!("ci: ok");
        }
        Task::Fmt { fix } => fmt(&sh, fix)?,
        Task::Clippy => {
            cmd!(sh, "cargo clippy --workspace --all-targets --all-features -- -D warnings").run()?;
        }
        Task::Test { package, minimal } => test(&sh, package.as_deref(), minimal)?,
        Task::Doc => cmd!(sh, "cargo doc --workspace --all-features --no-deps").run()?,
        Task::Bench { filter } => {
            let filter: Vec<String> = filter.into_iter().collect();
            for krate in BENCHED {
                let filter = &filter;
                cmd!(sh, "cargo bench -p {krate} -- {filter...}").run()?;
            }
        }
        Task::Demo => {
            let _log = sh.push_env("RUST_LOG", "sybase_client=debug");
            cmd!(sh, "cargo run -p sybase-client --example mock_session").run()?;
        }
    }
    Ok(())
}

fn workspace_root() -> Result<PathBuf> {
    let out = std::process::Command::new(env!("CARGO"))
        .args(["locate-project", "--workspace", "--message-format=plain"])
        .output()
        .context("cargo locate-project")?;
    let manifest = PathBuf::from(String::from_utf8(out.stdout)?.trim());
    manifest
        .parent()
        .map(PathBuf::from)
        .context("workspace manifest has no parent directory")
}

fn fmt(sh: &Shell, fix: bool) -> Result<()> {
    if fix {
        cmd!(sh, "cargo fmt --all").run()?;
    } else {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
    }
    Ok(())
}

fn test(sh: &Shell, package: Option<&str>, minimal: bool) -> Result<()> {
    let scope = match package {
        Some(p) => vec!["-p".to_owned(), p.to_owned()],
        None => vec!["--workspace".to_owned()],
    };
    let features = if minimal {
        "--no-default-features"
    } else {
        "--all-features"
    };
    cmd!(sh, "cargo test {scope...} {features}").run()?;
    Ok(())
}
