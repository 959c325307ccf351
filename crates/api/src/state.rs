use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use plyforge_core::generator::GeneratorConfig;
use plyforge_core::workspace::WorkspaceManager;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Per-job workspace manager.
    pub workspaces: Arc<WorkspaceManager>,
    /// Process-wide generator invocation configuration.
    pub generator: Arc<GeneratorConfig>,
    /// Bounded permit pool for external generator processes. Excess
    /// submissions queue FIFO on `acquire`, giving backpressure instead
    /// of unbounded process fan-out.
    pub generation_slots: Arc<Semaphore>,
    /// Cancelled on graceful shutdown; aborts in-flight generations.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build state from a loaded configuration.
    pub fn new(config: ServerConfig) -> Self {
        let workspaces = WorkspaceManager::new(
            config.upload_root.clone(),
            config.output_root.clone(),
        );
        let generator = config.generator_config();
        let generation_slots = Arc::new(Semaphore::new(config.max_concurrent_generations));

        Self {
            config: Arc::new(config),
            workspaces: Arc::new(workspaces),
            generator: Arc::new(generator),
            generation_slots,
            shutdown: CancellationToken::new(),
        }
    }
}
