use std::env;
use std::error::Error;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::example::ExampleMessage;

mod example;
mod setup_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_tracing::register();

    if let Err(e) = run().await {
        error!("{e}");
        return Err(e);
    }
    info!("Exiting...");

    Ok(())
}

async fn run() -> Result<(), Box<dyn Error>> {
    // optional path to a JSON array of messages
    let messages = match env::args().nth(1) {
        Some(path) => load_messages(Path::new(&path))?,
        None => example::sample_messages(),
    };
    info!(messages = messages.len(), "Making documents");

    let documents = example::processor()
        .make_documents(&CancellationToken::new(), messages)
        .await
        .map_err(|e| format!("{}: {e}", e.code()))?;
    info!(documents = documents.len(), "Documents made");

    println!("{}", serde_json::to_string_pretty(&documents)?);
    Ok(())
}

fn load_messages(path: &Path) -> Result<Vec<ExampleMessage>, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read messages from {}: {e}", path.display()))?;
    let messages = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse messages from {}: {e}", path.display()))?;
    Ok(messages)
}
