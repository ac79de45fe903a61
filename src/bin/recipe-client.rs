use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use recipe_lens::client::{BridgeClient, PickedFile, UiState, UploadSession};

/// Send a dish photo to the recipe bridge and print the recipe as HTML
#[derive(Parser, Debug)]
#[command(name = "recipe-client", version)]
struct Args {
    /// Image of the dish
    image: PathBuf,

    /// Bridge endpoint
    #[arg(long, default_value = "http://localhost:8080/api/analyze-recipe")]
    endpoint: String,

    /// Write the HTML here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overall request timeout, in seconds
    #[arg(long, default_value_t = 45)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let bridge = BridgeClient::new(&args.endpoint, Duration::from_secs(args.timeout_secs))?;
    let mut session = UploadSession::new(bridge);

    let file = PickedFile::open(&args.image)
        .await
        .with_context(|| format!("Cannot open {}", args.image.display()))?;
    session.accept_file(file).await?;

    eprintln!("⏳ Analyzing {}...", args.image.display());
    if let Err(e) = session.submit_for_analysis().await {
        bail!("{}", session.error().map(str::to_string).unwrap_or_else(|| e.to_string()));
    }

    let Some(view) = session.result().filter(|_| session.state() == UiState::Result) else {
        bail!("No recipe was returned");
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &view.html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✅ Recipe written to {}", path.display());
        }
        None => println!("{}", view.html),
    }

    Ok(())
}
