use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::{Parser, Subcommand};

use medscan::config::{ModelArgs, ServerConfig};
use medscan::{classify, handlers, AppState, ModelKind, ModelRegistry};

#[derive(Parser)]
#[command(name = "medscan")]
#[command(about = "Classify chest X-rays and brain MRIs with pre-trained ONNX models")]
struct Cli {
    #[command(flatten)]
    models: ModelArgs,

    #[command(flatten)]
    server: ServerConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server (default)
    Serve,
    /// Classify a single image and print the result
    Classify {
        /// Which classifier to use (covid, brain_tumor)
        #[arg(long, short)]
        model: ModelKind,

        /// Path to the image file
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let registry = ModelRegistry::load(&cli.models.models_config());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(registry, cli.server).await,
        Command::Classify { model, image } => {
            let result = classify(&registry, model, &image)
                .with_context(|| format!("could not classify {}", image.display()))?;
            println!("Predicted Class: {}", result.class_name);
            println!("Confidence: {:.2}%", result.confidence_percent());
            Ok(())
        }
    }
}

async fn serve(registry: ModelRegistry, config: ServerConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.upload_dir).with_context(|| {
        format!(
            "could not create upload directory {}",
            config.upload_dir.display()
        )
    })?;

    if registry.is_empty() {
        log::warn!("No models loaded; every prediction will fail until models are provided");
    }

    let state = web::Data::new(AppState::new(registry, config.upload_dir.clone()));
    let (host, port) = config.bind_addr();
    log::info!("Server running at http://{host}:{port}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("could not bind {host}:{port}"))?
    .run()
    .await?;

    Ok(())
}
