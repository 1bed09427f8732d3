use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gilt_script::geometry::Size;
use gilt_script::testing::render_surface;
use gilt_script::{EngineConfig, EngineError, ScriptEngine};

/// Run a UI script headlessly and print the resulting view tree.
#[derive(Debug, Parser)]
#[command(name = "gilt-script", version, about)]
struct Cli {
    /// Script to run. `require` resolves next to it.
    file: PathBuf,

    /// Window width in logical pixels.
    #[arg(long, default_value_t = 800)]
    width: i32,

    /// Window height in logical pixels.
    #[arg(long, default_value_t = 600)]
    height: i32,

    /// Print the laid out view tree.
    #[arg(long)]
    dump: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "script failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), EngineError> {
    let root = cli.file.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let config = EngineConfig::new()
        .with_surface_size(Size::new(cli.width, cli.height))
        .with_script_root(root);
    let engine = ScriptEngine::new(config)?;

    let name = cli.file.file_name().map(PathBuf::from).unwrap_or_else(|| cli.file.clone());
    engine.run_file(name)?;
    engine.update_layout()?;
    engine.wait_pending().await?;
    engine.update_layout()?;

    if cli.dump {
        println!("{}", render_surface(engine.window()));
    }
    Ok(())
}
