mod commands;

use cacheseal_core::Pipeline;
use cacheseal_schema::CONFIG_FILE;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::EXIT_FAILURE;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cacheseal",
    version,
    about = "Integrity manifest and version pipeline for service-worker cached web clients"
)]
struct Cli {
    /// Path to the pipeline configuration file.
    #[arg(long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replace the version placeholder in every configured target file.
    InjectVersion,
    /// Recompute artifact digests and rewrite the embedded integrity manifest.
    UpdateHashes,
    /// Check every artifact against the embedded integrity manifest (read-only).
    VerifyHashes,
    /// Inject the version, then stage, commit, and push.
    Release,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CACHESEAL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::InjectVersion => with_pipeline(&cli.config, |p| {
            commands::inject_version::run(p, json_output)
        }),
        Commands::UpdateHashes => with_pipeline(&cli.config, |p| {
            commands::update_hashes::run(p, json_output)
        }),
        Commands::VerifyHashes => with_pipeline(&cli.config, |p| {
            commands::verify_hashes::run(p, json_output)
        }),
        Commands::Release => with_pipeline(&cli.config, |p| commands::release::run(p, json_output)),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn with_pipeline(
    config: &Path,
    run: impl FnOnce(&Pipeline) -> Result<u8, String>,
) -> Result<u8, String> {
    let pipeline = Pipeline::load(config).map_err(|e| e.to_string())?;
    run(&pipeline)
}
