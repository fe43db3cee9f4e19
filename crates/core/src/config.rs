use serde::{Deserialize, Serialize};
use storage::models::StorageLocation;
use storage::BackendConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub proxy: ProxyConfig,
    pub inventory: InventoryConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Cards per grid row.
    pub columns: usize,
    pub default_view: StorageLocation,
}

impl InventoryConfig {
    pub fn columns(&self) -> usize {
        self.columns.max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Receipts parsed at once; 1 keeps processing sequential.
    pub concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            proxy: ProxyConfig {
                base_url: "http://localhost:3000".to_string(),
            },
            inventory: InventoryConfig {
                columns: 3,
                default_view: StorageLocation::Shelf,
            },
            pipeline: PipelineConfig { concurrency: 1 },
        }
    }
}

/// Defaults, then the TOML file (explicit path or optional `config/default`),
/// then `GOBBLE_*` environment overrides such as `GOBBLE_BACKEND__BASE_URL`.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();
    let mut settings = config::Config::builder()
        .set_default("backend.base_url", defaults.backend.base_url)?
        .set_default("backend.items_prefix", defaults.backend.items_prefix)?
        .set_default("proxy.base_url", defaults.proxy.base_url)?
        .set_default("inventory.columns", defaults.inventory.columns as i64)?
        .set_default("inventory.default_view", "S")?
        .set_default("pipeline.concurrency", defaults.pipeline.concurrency as i64)?;
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("GOBBLE")
            .prefix_separator("_")
            .separator("__"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gobble.toml");
        fs::write(
            &path,
            r#"
            [backend]
            base_url = "https://api.example.test"
            items_prefix = "/item"

            [inventory]
            columns = 4
            default_view = "F"
            "#,
        )
        .unwrap();

        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.backend.base_url, "https://api.example.test");
        assert_eq!(cfg.backend.items_prefix, "/item");
        assert_eq!(cfg.inventory.columns(), 4);
        assert_eq!(cfg.inventory.default_view, StorageLocation::Freeze);
        assert_eq!(cfg.proxy.base_url, "http://localhost:3000");
        assert_eq!(cfg.pipeline.concurrency, 1);
    }

    #[test]
    fn zero_columns_render_as_one() {
        let mut cfg = AppConfig::default();
        cfg.inventory.columns = 0;
        assert_eq!(cfg.inventory.columns(), 1);
    }
}
