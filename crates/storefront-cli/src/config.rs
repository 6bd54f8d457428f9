// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use storefront_app::{
    Attribute, AttributeSchema, DEFAULT_ENTITY_NAME, DEFAULT_ID_KEY, SchemaField, product_schema,
};

pub const APP_NAME: &str = "storefront";
const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "STOREFRONT_CONFIG_PATH";
const BASE_URL_ENV: &str = "STOREFRONT_BASE_URL";
const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_COLLECTION_PATH: &str = "/store/products/";
const DEFAULT_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub remote: Remote,
    pub schema: Option<SchemaConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            remote: Remote::default(),
            schema: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Remote {
    pub base_url: Option<String>,
    pub collection_path: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Remote {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            collection_path: Some(DEFAULT_COLLECTION_PATH.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

/// `[schema]` table. Absent means the built-in product schema.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    pub entity: Option<String>,
    pub id_key: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeConfig {
    pub key: String,
    pub label: Option<String>,
    pub entries: Option<Vec<EntryConfig>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryConfig {
    pub key: String,
    pub label: String,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no `version`. Add `version = 1` and keep values under [remote] and [schema]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(base_url) = &self.remote.base_url
            && base_url.trim().is_empty()
        {
            bail!(
                "remote.base_url in {} must not be empty; remove it to use {}",
                path.display(),
                DEFAULT_BASE_URL
            );
        }

        if let Some(collection_path) = &self.remote.collection_path
            && !collection_path.starts_with('/')
        {
            bail!(
                "remote.collection_path in {} must start with '/', got {:?}",
                path.display(),
                collection_path
            );
        }

        if let Some(timeout) = &self.remote.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "remote.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        self.schema()
            .with_context(|| format!("invalid [schema] in {}", path.display()))?;
        Ok(())
    }

    /// `STOREFRONT_BASE_URL` wins over `[remote].base_url`.
    pub fn base_url(&self) -> String {
        if let Ok(from_env) = env::var(BASE_URL_ENV)
            && !from_env.trim().is_empty()
        {
            return from_env.trim().trim_end_matches('/').to_owned();
        }
        self.remote
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim()
            .trim_end_matches('/')
            .to_owned()
    }

    /// Collection root, always ending in a single `/`.
    pub fn collection_path(&self) -> String {
        let raw = self
            .remote
            .collection_path
            .as_deref()
            .unwrap_or(DEFAULT_COLLECTION_PATH);
        format!("{}/", raw.trim().trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.remote.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn schema(&self) -> Result<AttributeSchema> {
        let Some(schema) = &self.schema else {
            return Ok(product_schema());
        };
        if schema.attributes.is_empty() {
            bail!(
                "[schema] defines no attributes; add [[schema.attributes]] entries or drop [schema] to use the built-in product schema"
            );
        }

        let fields = schema
            .attributes
            .iter()
            .map(|attribute| match &attribute.entries {
                Some(entries) => SchemaField::group(
                    &attribute.key,
                    entries
                        .iter()
                        .map(|entry| Attribute::new(&entry.key, &entry.label))
                        .collect(),
                ),
                None => SchemaField::attribute(
                    &attribute.key,
                    attribute.label.as_deref().unwrap_or(&attribute.key),
                ),
            })
            .collect();

        AttributeSchema::new(
            schema.entity.as_deref().unwrap_or(DEFAULT_ENTITY_NAME),
            schema.id_key.as_deref().unwrap_or(DEFAULT_ID_KEY),
            fields,
        )
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# storefront config\n# Place this file at: {}\n\nversion = 1\n\n[remote]\n# {} overrides base_url when set\nbase_url = \"{}\"\n# resolved under any path base_url carries\ncollection_path = \"{}\"\ntimeout = \"{}\"\n\n# Optional. Without [schema] the built-in product schema is used.\n[schema]\nentity = \"product\"\nid_key = \"id\"\n\n[[schema.attributes]]\nkey = \"id\"\nlabel = \"Identifier\"\n\n[[schema.attributes]]\nkey = \"name\"\nlabel = \"Product Name\"\n\n[[schema.attributes]]\nkey = \"description\"\nlabel = \"Product Description\"\n\n[[schema.attributes]]\nkey = \"prices\"\nentries = [\n  {{ key = \"USD\", label = \"Price in USD\" }},\n  {{ key = \"GBP\", label = \"Price in GBP\" }},\n]\n",
            path.display(),
            BASE_URL_ENV,
            DEFAULT_BASE_URL,
            DEFAULT_COLLECTION_PATH,
            DEFAULT_TIMEOUT,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
