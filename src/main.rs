use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use folder_generator::{assemble, EngineConfig, FolderRequest, HttpFetcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let (input, output) = match (args.next(), args.next()) {
        (Some(input), Some(output)) => (input, output),
        _ => {
            eprintln!("Uso: folder-generator <solicitud.json> <salida.pdf>");
            std::process::exit(2);
        }
    };

    tracing::info!(%input, %output, "Iniciando ensamblaje de carpeta contable");

    let raw = tokio::fs::read(&input)
        .await
        .with_context(|| format!("No se pudo leer {}", input))?;
    let request: FolderRequest =
        serde_json::from_slice(&raw).context("Solicitud JSON inválida")?;
    let request = request.into_request()?;

    let fetcher = Arc::new(HttpFetcher::new());
    let config = EngineConfig::default();
    let pdf = assemble(&request, fetcher, &config).await?;

    tokio::fs::write(&output, &pdf)
        .await
        .with_context(|| format!("No se pudo escribir {}", output))?;
    tracing::info!(bytes = pdf.len(), "Carpeta generada");

    Ok(())
}
