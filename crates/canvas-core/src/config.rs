use std::path::{Path, PathBuf};
use std::sync::Arc;

use canvas_actions::RootAlias;
use canvas_context::SerializeOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::fs;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ActionsConfig {
    /// Id the host resolves to the page's document root.
    pub root_sentinel: String,
    pub root_slot_id: String,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        let alias = RootAlias::default();
        Self {
            root_sentinel: alias.sentinel,
            root_slot_id: alias.slot_id,
        }
    }
}

impl ActionsConfig {
    pub fn root_alias(&self, container_id: Option<String>) -> RootAlias {
        RootAlias {
            container_id,
            slot_id: self.root_slot_id.clone(),
            sentinel: self.root_sentinel.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContextConfig {
    pub collapse_unrelated: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            collapse_unrelated: true,
        }
    }
}

impl ContextConfig {
    pub fn serialize_options(&self) -> SerializeOptions {
        SerializeOptions {
            collapse_unrelated: self.collapse_unrelated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub retention_days: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { retention_days: 14 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub actions: ActionsConfig,
    pub context: ContextConfig,
    pub logging: LoggingConfig,
}

/// Config sources, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    Global,
    Project,
    Env,
    Runtime,
    Cli,
}

impl ConfigLayer {
    pub const ALL: [ConfigLayer; 5] = [
        ConfigLayer::Global,
        ConfigLayer::Project,
        ConfigLayer::Env,
        ConfigLayer::Runtime,
        ConfigLayer::Cli,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigLayer::Global => "global",
            ConfigLayer::Project => "project",
            ConfigLayer::Env => "env",
            ConfigLayer::Runtime => "runtime",
            ConfigLayer::Cli => "cli",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone)]
pub struct ConfigStore {
    project_path: PathBuf,
    global_path: PathBuf,
    layers: Arc<RwLock<[Value; 5]>>,
}

impl ConfigStore {
    pub async fn new(path: impl AsRef<Path>, cli_overrides: Option<Value>) -> anyhow::Result<Self> {
        let global_path = resolve_global_config_path().await?;
        Self::with_global_path(path, global_path, cli_overrides).await
    }

    /// Same as [`ConfigStore::new`] with an explicit global file instead of the resolved one.
    pub async fn with_global_path(
        path: impl AsRef<Path>,
        global_path: impl AsRef<Path>,
        cli_overrides: Option<Value>,
    ) -> anyhow::Result<Self> {
        let project_path = path.as_ref().to_path_buf();
        let global_path = global_path.as_ref().to_path_buf();
        if let Some(parent) = project_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let layers = [
            read_json_file(&global_path).await?,
            read_json_file(&project_path).await?,
            env_layer(),
            empty_object(),
            cli_overrides.unwrap_or_else(empty_object),
        ];
        Ok(Self {
            project_path,
            global_path,
            layers: Arc::new(RwLock::new(layers)),
        })
    }

    pub async fn get(&self) -> AppConfig {
        let merged = self.get_effective_value().await;
        match serde_json::from_value(merged) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(target: "canvas.config", error = %err, "invalid config, using defaults");
                AppConfig::default()
            }
        }
    }

    pub async fn get_effective_value(&self) -> Value {
        let layers = self.layers.read().await;
        let mut merged = empty_object();
        for layer in layers.iter() {
            deep_merge(&mut merged, layer);
        }
        merged
    }

    pub async fn get_layer_value(&self, layer: ConfigLayer) -> Value {
        self.layers.read().await[layer.index()].clone()
    }

    pub async fn get_layers_value(&self) -> Value {
        let layers = self.layers.read().await;
        let map = ConfigLayer::ALL
            .iter()
            .map(|layer| (layer.as_str().to_string(), layers[layer.index()].clone()))
            .collect::<Map<_, _>>();
        Value::Object(map)
    }

    pub async fn set(&self, config: AppConfig) -> anyhow::Result<()> {
        let value = serde_json::to_value(config)?;
        self.layers.write().await[ConfigLayer::Project.index()] = value;
        self.persist(ConfigLayer::Project).await
    }

    /// Merges `patch` into one layer; the global and project layers are written back to disk.
    pub async fn patch(&self, layer: ConfigLayer, patch: Value) -> anyhow::Result<Value> {
        deep_merge(&mut self.layers.write().await[layer.index()], &patch);
        self.persist(layer).await?;
        Ok(self.get_effective_value().await)
    }

    pub async fn patch_project(&self, patch: Value) -> anyhow::Result<Value> {
        self.patch(ConfigLayer::Project, patch).await
    }

    pub async fn patch_global(&self, patch: Value) -> anyhow::Result<Value> {
        self.patch(ConfigLayer::Global, patch).await
    }

    /// Not persisted; lives as long as the store.
    pub async fn patch_runtime(&self, patch: Value) -> anyhow::Result<Value> {
        self.patch(ConfigLayer::Runtime, patch).await
    }

    async fn persist(&self, layer: ConfigLayer) -> anyhow::Result<()> {
        let path = match layer {
            ConfigLayer::Global => &self.global_path,
            ConfigLayer::Project => &self.project_path,
            _ => return Ok(()),
        };
        let snapshot = self.get_layer_value(layer).await;
        write_json_file(path, &snapshot).await
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

async fn write_json_file(path: &Path, value: &Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw).await?;
    Ok(())
}

async fn read_json_file(path: &Path) -> anyhow::Result<Value> {
    if !path.exists() {
        return Ok(empty_object());
    }
    let raw = fs::read_to_string(path).await?;
    Ok(serde_json::from_str::<Value>(&raw).unwrap_or_else(|_| empty_object()))
}

async fn resolve_global_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("CANVAS_GLOBAL_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join("canvas").join("config.json"));
    }
    Ok(PathBuf::from(".canvas/global_config.json"))
}

fn env_layer() -> Value {
    env_layer_from(|key| std::env::var(key).ok())
}

fn env_layer_from(lookup: impl Fn(&str) -> Option<String>) -> Value {
    let mut root = empty_object();

    if let Some(sentinel) = lookup("CANVAS_ROOT_SENTINEL") {
        if !sentinel.trim().is_empty() {
            deep_merge(
                &mut root,
                &json!({ "actions": { "root_sentinel": sentinel.trim() } }),
            );
        }
    }
    if let Some(slot_id) = lookup("CANVAS_ROOT_SLOT_ID") {
        if !slot_id.trim().is_empty() {
            deep_merge(
                &mut root,
                &json!({ "actions": { "root_slot_id": slot_id.trim() } }),
            );
        }
    }
    if let Some(days) = lookup("CANVAS_LOG_RETENTION_DAYS") {
        match days.trim().parse::<u64>() {
            Ok(days) => deep_merge(
                &mut root,
                &json!({ "logging": { "retention_days": days } }),
            ),
            Err(_) => tracing::warn!(
                target: "canvas.config",
                value = %days,
                "ignoring non-numeric CANVAS_LOG_RETENTION_DAYS"
            ),
        }
    }

    root
}

fn deep_merge(base: &mut Value, overlay: &Value) {
    if overlay.is_null() {
        return;
    }
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    continue;
                }
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value.clone();
        }
    }
}
