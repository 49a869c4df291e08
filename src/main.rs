mod app;
mod config;
mod error;
mod event;
mod generation;
mod session;
mod theme;
mod ui;

use app::ChatApp;
use config::AppConfig;
use eframe::egui;
use generation::gemini::GeminiClient;
use generation::Dispatcher;
use session::chat::{ChatSession, SessionConfig};
use session::credentials::ApiKeyMirror;
use session::store::FileStore;
use std::sync::{mpsc, Arc};
use tracing::{info, warn};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scenechat=info".into()),
        )
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut startup_warnings = Vec::new();
    let config = AppConfig::load().unwrap_or_else(|err| {
        warn!(target: "scenechat", "using default config: {err}");
        startup_warnings.push(format!("using default config: {err}"));
        AppConfig::default()
    });

    let storage_path = config.storage_path()?;
    info!(target: "scenechat", "api key storage at {}", storage_path.display());
    let credentials = ApiKeyMirror::new(
        Box::new(FileStore::new(storage_path)),
        config.storage_key.clone(),
    );

    let (session, restore_failure) = ChatSession::restore(
        SessionConfig {
            scenario: config.default_scenario,
            model_id: config.default_model.clone(),
            api_key: String::new(),
            remember_key: false,
        },
        credentials,
    );
    if let Some(err) = restore_failure {
        warn!(target: "scenechat", "could not restore api key: {err}");
        startup_warnings.push(format!("could not restore api key: {err}"));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("scenechat-runtime")
        .build()?;

    let (tx, rx) = mpsc::channel();
    let client = Arc::new(GeminiClient::new(config.api_base_url.clone()));
    let dispatcher = Dispatcher::new(client, tx, runtime.handle().clone());

    let app = ChatApp::new(rx, dispatcher, session, startup_warnings);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("scenechat")
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([480.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "scenechat",
        native_options,
        Box::new(move |creation_context| {
            app.theme().apply_visuals(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
