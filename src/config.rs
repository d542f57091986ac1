use std::{
    env, fs,
    path::{Path, PathBuf},
};

use dirs::home_dir;
use log::warn;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

static CONFIG: Lazy<RwLock<AdminConfig>> =
    Lazy::new(|| RwLock::new(AdminConfig::load_or_default(&config_file_path())));

const CONFIG_DIR: &str = ".post-subjects";
const CONFIG_FILE: &str = "admin.yaml";

pub const DEFAULT_ADMIN_TOKEN: &str = "change-this-secret-key";
pub const ENV_ADMIN_SECRET: &str = "ADMIN_SECRET";
pub const ENV_STORE_FILE: &str = "POST_SUBJECTS_FILE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminConfig {
    pub store: StorePreferences,
    pub server: ServerPreferences,
    pub auth: AuthPreferences,
    pub posts: PostPreferences,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorePreferences {
    pub path: PathBuf,
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerPreferences {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthPreferences {
    pub admin_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostPreferences {
    pub dir: PathBuf,
    pub default_category: String,
    pub author: String,
    pub excerpt_length: usize,
}

impl Default for StorePreferences {
    fn default() -> Self {
        Self {
            path: PathBuf::from("_config").join("post_subjects.json"),
            strict: false,
        }
    }
}

impl Default for ServerPreferences {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

impl Default for AuthPreferences {
    fn default() -> Self {
        Self {
            admin_token: DEFAULT_ADMIN_TOKEN.into(),
        }
    }
}

impl Default for PostPreferences {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("_posts"),
            default_category: "daily-update".into(),
            author: "Automated Bot".into(),
            excerpt_length: 200,
        }
    }
}

impl AdminConfig {
    pub fn load_or_default(path: &Path) -> Self {
        let mut config = match fs::read_to_string(path) {
            Ok(raw) => match serde_yaml::from_str::<AdminConfig>(&raw) {
                Ok(mut config) => {
                    normalize_config(&mut config);
                    config
                }
                Err(error) => {
                    warn!("Failed to parse admin config {path:?}: {error}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        apply_overrides(&mut config, |key| env::var(key).ok());
        config
    }

    pub fn uses_default_token(&self) -> bool {
        self.auth.admin_token == DEFAULT_ADMIN_TOKEN
    }
}

fn normalize_config(config: &mut AdminConfig) {
    let defaults = AdminConfig::default();

    if config.store.path.as_os_str().is_empty() {
        config.store.path = defaults.store.path;
    }

    if config.server.host.trim().is_empty() {
        config.server.host = defaults.server.host;
    }

    if config.server.port == 0 {
        config.server.port = defaults.server.port;
    }

    if config.auth.admin_token.is_empty() {
        config.auth.admin_token = defaults.auth.admin_token;
    }

    if config.posts.default_category.trim().is_empty() {
        config.posts.default_category = defaults.posts.default_category;
    }

    if config.posts.excerpt_length == 0 {
        config.posts.excerpt_length = defaults.posts.excerpt_length;
    }
}

fn apply_overrides<F>(config: &mut AdminConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup(ENV_ADMIN_SECRET).filter(|value| !value.is_empty()) {
        config.auth.admin_token = secret;
    }

    if let Some(path) = lookup(ENV_STORE_FILE).filter(|value| !value.is_empty()) {
        config.store.path = PathBuf::from(path);
    }
}

pub fn config_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_DIR))
}

pub fn config_file_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE)
}

pub fn read_config() -> AdminConfig {
    CONFIG.read().clone()
}

pub fn install_config(config: AdminConfig) {
    *CONFIG.write() = config;
}

pub fn mutate_config<F>(mutator: F)
where
    F: FnOnce(&mut AdminConfig),
{
    let mut guard = CONFIG.write();
    mutator(&mut guard);
}
