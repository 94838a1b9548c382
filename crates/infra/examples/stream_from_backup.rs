//! Example: restore files from a device backup into a local file
//!
//! ```bash
//! export RESTOREKIT_API_BASE_URL=https://storage.example.com
//! export RESTOREKIT_TOKEN=...
//! cargo run -p restorekit-infra --example stream_from_backup -- \
//!     <device-guid> <node-guid> <output.zip> /Users/qa/Downloads/report.pdf
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::StreamExt;
use restorekit_core::ArchiveAccessorFactory;
use restorekit_domain::DecryptionCredentials;
use restorekit_infra::{config, init_logging, StaticTokenProvider, StorageApiClient};
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load()?;
    init_logging(&config.logging)?;

    let mut args = std::env::args().skip(1);
    let device_guid = args.next().context("missing device guid")?;
    let node_guid = args.next().context("missing storage node guid")?;
    let output = args.next().context("missing output path")?;
    let paths: Vec<String> = args.collect();
    anyhow::ensure!(!paths.is_empty(), "no archive paths given");

    let token = std::env::var("RESTOREKIT_TOKEN").context("RESTOREKIT_TOKEN is not set")?;
    let client = Arc::new(StorageApiClient::from_config(
        &config.api,
        Arc::new(StaticTokenProvider::new(token)),
    )?);

    let factory = ArchiveAccessorFactory::new(
        client.clone(),
        client.clone(),
        client,
        config.restore.clone(),
    );
    let accessor =
        factory.create(&device_guid, &node_guid, DecryptionCredentials::ServerManaged).await?;

    let mut stream =
        accessor.stream_from_backup(&paths, Some(Duration::from_secs(30)), None).await?;
    let mut file = tokio::fs::File::create(&output).await?;
    let mut written = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        written += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    tracing::info!(bytes = written, output = %output, "restore written");
    Ok(())
}
