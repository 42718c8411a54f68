use clap::Parser;
use odia_annotator_common::{transliterate, HttpGateway, ImageRef};
use odia_ocr_annotator::{annotate, cli, config, error, export, logging, progress, scanner, session};
use cli::{Cli, Commands, ExportFormat};
use config::Config;
use error::{AnnotatorError, Result};
use session::AnnotationSession;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("✖ {}", err);
        std::process::exit(1);
    }
}

fn connect(config: &Config, backend_url: &str) -> Result<AnnotationSession<HttpGateway>> {
    let gateway = HttpGateway::with_timeout(backend_url, config.timeout())?;
    Ok(AnnotationSession::new(gateway))
}

/// Prefer the banner message the session recorded for a failed operation
fn session_failure<G>(session: &AnnotationSession<G>, err: AnnotatorError) -> AnnotatorError
where
    G: odia_annotator_common::Gateway,
{
    match session.state().last_error() {
        Some(message) => AnnotatorError::Session(message.to_string()),
        None => err,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    // the flag applies to this run only and is never written back
    let backend_url = cli
        .backend_url
        .clone()
        .unwrap_or_else(|| config.backend_url.clone());

    match cli.command {
        Commands::List => {
            println!("📚 odia-annotator - images\n");
            let mut session = connect(&config, &backend_url)?;
            if let Err(err) = session.hydrate().await {
                return Err(session_failure(&session, err));
            }

            let state = session.state();
            if state.images().is_empty() {
                println!("No images loaded. Upload images or import a CSV first.");
                return Ok(());
            }
            for (index, image) in state.images().iter().enumerate() {
                match state.annotation(image) {
                    Some(record) if !record.validated_text.is_empty() => {
                        println!("{:>4}  ✔ {}  {}", index + 1, image, record.validated_text)
                    }
                    Some(record) => println!("{:>4}  - {}  {}", index + 1, image, record.extracted_text),
                    None => println!("{:>4}    {}", index + 1, image),
                }
            }
            let validated = state
                .annotations()
                .values()
                .filter(|record| !record.validated_text.is_empty())
                .count();
            println!("\n{} images, {} validated", state.images().len(), validated);
        }

        Commands::Upload { paths, recursive, max_size } => {
            println!("📤 odia-annotator - upload\n");

            let files = scanner::collect_images(&paths, recursive)?;
            if files.is_empty() {
                let joined = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(AnnotatorError::NoImagesFound(joined));
            }
            println!("✔ {} images found", files.len());

            let mut session = connect(&config, &backend_url)?;
            let bar = progress::spinner(format!("Uploading {} images...", files.len()));
            let result = session.upload_images(&files, max_size).await;
            bar.finish_and_clear();
            let accepted = result.map_err(|err| session_failure(&session, err))?;

            if accepted < files.len() {
                println!("⚠ backend skipped {} file(s)", files.len() - accepted);
            }
            println!("✅ {} images uploaded", accepted);
        }

        Commands::Ocr { images, api_key } => {
            println!("🔍 odia-annotator - OCR\n");
            let mut session = connect(&config, &backend_url)?;
            if let Err(err) = session.initialize().await {
                return Err(session_failure(&session, err));
            }

            let key = api_key.or_else(|| config.resolve_api_key()).unwrap_or_default();
            session.state_mut().set_api_key(key);

            if !images.is_empty() {
                let requested: Vec<ImageRef> = images.into_iter().map(ImageRef::from).collect();
                for image in &requested {
                    if !session.state().images().contains(image) {
                        return Err(AnnotatorError::UnknownImage(image.to_string()));
                    }
                }
                session.state_mut().set_selected_images(requested);
            }

            let count = session.state().selected_images().len();
            let bar = progress::spinner(format!("Running OCR on {} images...", count));
            let result = session.run_ocr().await;
            bar.finish_and_clear();
            result.map_err(|err| session_failure(&session, err))?;

            let state = session.state();
            for image in state.selected_images() {
                if let Some(record) = state.annotation(image) {
                    println!("{}\n  {}", image, record.extracted_text);
                }
            }
            println!("\n✅ OCR complete ({} images)", count);
        }

        Commands::Save { image, text, text_file, latin } => {
            let mut session = connect(&config, &backend_url)?;
            if let Err(err) = session.hydrate().await {
                return Err(session_failure(&session, err));
            }

            let image = ImageRef::from(image);
            let index = session
                .state()
                .images()
                .iter()
                .position(|loaded| *loaded == image)
                .ok_or_else(|| AnnotatorError::UnknownImage(image.to_string()))?;
            session.state_mut().select_image(index)?;

            let raw = match (text, text_file) {
                (Some(text), _) => text,
                (None, Some(path)) => {
                    if !path.exists() {
                        return Err(AnnotatorError::FileNotFound(path.display().to_string()));
                    }
                    std::fs::read_to_string(&path)?.trim_end().to_string()
                }
                (None, None) => String::new(),
            };
            let text = if latin { transliterate(&raw) } else { raw };
            session.state_mut().edit_text(text);

            let ack = session
                .save_current_annotation()
                .await
                .map_err(|err| session_failure(&session, err))?;
            match ack.message {
                Some(message) => println!("✔ {}: {}", image, message),
                None => println!("✔ {} saved", image),
            }
        }

        Commands::ImportCsv { file, image_folder } => {
            println!("📥 odia-annotator - import\n");
            if !file.exists() {
                return Err(AnnotatorError::FileNotFound(file.display().to_string()));
            }
            let folder = image_folder.unwrap_or_else(|| config.image_folder.clone());

            let mut session = connect(&config, &backend_url)?;
            session
                .import_dataset(&file, &folder)
                .await
                .map_err(|err| session_failure(&session, err))?;

            let state = session.state();
            println!("✔ {} images loaded from {}", state.images().len(), file.display());
            println!("✔ {} annotations", state.annotations().len());
        }

        Commands::Export { format, output, remote } => {
            println!("📄 odia-annotator - export\n");
            let mut session = connect(&config, &backend_url)?;
            if let Err(err) = session.hydrate().await {
                return Err(session_failure(&session, err));
            }

            let bytes = if remote {
                if format != ExportFormat::Csv {
                    return Err(AnnotatorError::Config(
                        "the backend only exports CSV; drop --remote for other formats".into(),
                    ));
                }
                session
                    .export_remote()
                    .await
                    .map_err(|err| session_failure(&session, err))?
            } else {
                let state = session.state();
                export::render(format, state.images(), state.annotations())?
            };

            let path = export::output_path_for_format(output.as_deref(), format, chrono::Local::now());
            export::write_export(&path, &bytes)?;
            println!("✅ {} images exported to {}", session.state().images().len(), path.display());
        }

        Commands::Keyboard => {
            println!("{}", annotate::format_keyboard());
        }

        Commands::Annotate { api_key } => {
            let mut session = connect(&config, &backend_url)?;
            if let Some(key) = api_key.or_else(|| config.resolve_api_key()) {
                session.state_mut().set_api_key(key);
            }
            annotate::run_interactive(&mut session, &config.image_folder).await?;
        }

        Commands::Config { set_api_key, set_backend_url, show } => {
            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ API key saved");
            }

            if let Some(url) = set_backend_url {
                config.set_backend_url(url)?;
                println!("✔ Backend address saved");
            }

            if show {
                println!("Settings:");
                println!("  Backend: {}", config.backend_url);
                println!("  Image folder: {}", config.image_folder);
                match config.timeout_seconds {
                    Some(secs) => println!("  Timeout: {}s", secs),
                    None => println!("  Timeout: none"),
                }
                println!("  API key: {}", if config.resolve_api_key().is_some() { "set" } else { "not set" });
            }
        }
    }

    Ok(())
}
