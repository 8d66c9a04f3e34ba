use crate::errors::ApiError;
use chrono::{DateTime, Utc};
use registry_tree::config::AppConfig;
use registry_tree::reader::Registry;
use registry_tree::solidity::SolidityConfig;
use registry_tree::RegistryTreeReader;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup, if any.
    pub config: Option<Arc<AppConfig>>,
    registry: Arc<OnceCell<ComputedRegistry>>,
}

#[derive(Clone)]
pub struct ComputedRegistry {
    pub registry: Arc<Registry>,
    pub solidity: Arc<SolidityConfig>,
    pub computed_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Option<AppConfig>) -> Self {
        Self {
            config: config.map(Arc::new),
            registry: Arc::new(OnceCell::new()),
        }
    }

    pub fn config(&self) -> Result<Arc<AppConfig>, ApiError> {
        self.config
            .clone()
            .ok_or_else(|| ApiError::Conflict("no registry config loaded (set REGISTRY_CONFIG)".to_string()))
    }

    pub fn reader(&self) -> Result<RegistryTreeReader<'static>, ApiError> {
        Ok(RegistryTreeReader::new(self.config()?.groups().to_vec()))
    }

    /// Registry of the loaded configuration.
    ///
    /// Computed on first use; the groups never change for the lifetime of the process.
    pub async fn ensure_registry(&self) -> Result<ComputedRegistry, ApiError> {
        let config = self.config()?;

        self.registry
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || {
                    let registry = RegistryTreeReader::new(config.groups().to_vec()).registry()?;
                    let solidity = SolidityConfig::with_root(&config, registry.tree.root())?;
                    Ok::<ComputedRegistry, ApiError>(ComputedRegistry {
                        registry: Arc::new(registry),
                        solidity: Arc::new(solidity),
                        computed_at: Utc::now(),
                    })
                })
                .await
                .map_err(|_| ApiError::Internal)?
            })
            .await
            .cloned()
    }
}
