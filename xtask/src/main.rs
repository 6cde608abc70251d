use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

const PRESETS: [&str; 4] = ["debug_cube", "transform_group", "materials", "cursor_cube"];

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for vista")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests, docs, then a headless smoke run
    Check,
    /// cargo fmt --check on every crate
    Fmt,
    /// clippy with warnings denied
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Run every scene preset headless for a few ticks
    Smoke {
        #[arg(short, long, default_value = "5")]
        ticks: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            doc()?;
            smoke(3)?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Doc => doc()?,
        Commands::Smoke { ticks } => smoke(ticks)?,
    }

    Ok(())
}

fn cargo(what: &str, args: &[&str]) -> Result<()> {
    println!("==> {what}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}

fn fmt() -> Result<()> {
    cargo("cargo fmt --check", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "cargo clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Result<()> {
    cargo("cargo test", &["test", "--workspace"])
}

fn doc() -> Result<()> {
    cargo("cargo doc", &["doc", "--workspace", "--no-deps"])
}

fn smoke(ticks: u64) -> Result<()> {
    let ticks = ticks.to_string();
    for preset in PRESETS {
        cargo(
            &format!("headless {preset}"),
            &[
                "run", "-q", "-p", "vista-cli", "--", "--preset", preset, "run", "--quiet", "--fps", "0",
                "--ticks", &ticks, "--resize", "1024x768@1",
            ],
        )?;
    }
    Ok(())
}
