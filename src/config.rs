use anyhow::{Context, Result};
use directories::ProjectDirs;
use facelens_vision::{Insets, Rect, Size};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| match option_env!("FACELENS_CONFIG_PATH") {
    Some(path) => PathBuf::from(path),
    None => ProjectDirs::from("", "", "facelens")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("facelens.toml")),
});

pub static DEFAULT_MODEL_PATH: Lazy<PathBuf> = Lazy::new(|| {
    PathBuf::from(
        option_env!("FACELENS_MODEL_PATH")
            .unwrap_or("/usr/local/share/facelens/face_detection_yunet_2023mar.onnx"),
    )
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: String,
    pub detector_model: PathBuf,
    pub score_threshold: f32,
    pub nms_threshold: f32,
    /// Screen size padding and overlays are laid out against.
    pub display: Size,
    pub padding: Insets,
    /// Live preview layer frame; the full display when unset.
    pub preview: Option<Rect>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: "/dev/video0".to_string(),
            detector_model: DEFAULT_MODEL_PATH.clone(),
            score_threshold: 0.6,
            nms_threshold: 0.3,
            display: Size::new(390.0, 844.0),
            padding: Insets::uniform(50.0),
            preview: None,
        }
    }
}

impl Config {
    pub fn preview_rect(&self) -> Rect {
        self.preview.unwrap_or_else(|| Rect::from_size(self.display))
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
