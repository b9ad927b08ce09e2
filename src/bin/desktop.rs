use std::sync::Arc;

use clap::Parser;
use iced::Size;

use medscan::config::ModelArgs;
use medscan::gui::DiagnosisApp;
use medscan::ModelRegistry;

#[derive(Parser)]
#[command(name = "medscan-desktop")]
#[command(about = "Desktop front-end for the medical image classifiers")]
struct Cli {
    #[command(flatten)]
    models: ModelArgs,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let registry = Arc::new(ModelRegistry::load(&cli.models.models_config()));

    iced::application(DiagnosisApp::title, DiagnosisApp::update, DiagnosisApp::view)
        .theme(DiagnosisApp::theme)
        .window_size(Size::new(800.0, 750.0))
        .resizable(false)
        .run_with(move || DiagnosisApp::new(registry))?;

    Ok(())
}
