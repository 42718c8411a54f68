mod app;
mod worker;

use std::sync::Arc;

use anyhow::Context;
use app::{configure_fonts, AnnotatorApp};
use odia_annotator_common::{HttpGateway, DEFAULT_BACKEND_URL};
use tracing_subscriber::EnvFilter;

/// Overrides the backend address for the viewer
const BACKEND_URL_ENV: &str = "ODIA_ANNOTATOR_BACKEND";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    let backend_url = std::env::var(BACKEND_URL_ENV).unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
    let gateway = HttpGateway::new(&backend_url).with_context(|| format!("backend address {backend_url}"))?;
    tracing::info!(%backend_url, "starting viewer");

    let handle = runtime.handle().clone();
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Odia OCR Annotation Tool",
        options,
        Box::new(move |cc| {
            configure_fonts(&cc.egui_ctx);
            Box::new(AnnotatorApp::new(&cc.egui_ctx, Arc::new(gateway), handle))
        }),
    )
    .map_err(|err| anyhow::anyhow!("viewer failed: {err}"))
}
