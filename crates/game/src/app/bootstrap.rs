use engine::{load_player_model, resolve_app_paths, LoopConfig, Scene, StartupError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Towerbound Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        save_dir = %paths.save_dir.display(),
        "paths_resolved"
    );

    // A broken or absent descriptor means "no avatar model"; it never
    // blocks startup.
    let model_path = paths.assets_dir.join("player_model.json");
    let model = match load_player_model(&model_path) {
        Ok(model) => Some(model),
        Err(error) => {
            warn!(error = %error, "player_model_unavailable");
            None
        }
    };

    let scene = gameplay::build_scene(paths.save_dir, model);
    Ok(AppWiring {
        config: LoopConfig::default(),
        scene,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
