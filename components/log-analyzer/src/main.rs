use anyhow::Result;
use solr_log_analyzer::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Main entrypoint simply delegates control to CLI layer.
    // The CLI parses arguments, loads configuration, sets up tracing and
    // then hands over to the runtime
    cli::cli::run().await
}
