// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration file and command line.
//!
//! Settings come from an optional YAML (or JSON) file; command line flags
//! override whatever the file says.

use crate::editor::controller::EditorSettings;
use crate::editor::hit_test::DEFAULT_MARGIN;
use crate::editor::render::{Renderer, DEFAULT_ARROW_HEAD};
use crate::io::gateway::{MemoryGateway, PersistenceGateway};
use crate::io::http::HttpGateway;
use crate::io::serialization::{DocumentFormat, FileGateway};
use crate::models::style::{Color, Style, DEFAULT_FONT_SIZE};
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Markup editor for reviewing screenshots and video frames.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "reviewmark", version, about)]
pub struct Cli {
    /// Image to annotate
    #[arg(long)]
    pub image: PathBuf,

    /// Identifier of the reviewed file on the server (defaults to the image file name)
    #[arg(long)]
    pub target: Option<String>,

    /// Review server base URL, e.g. http://localhost:5000/api
    #[arg(long)]
    pub server: Option<String>,

    /// Bearer token for the review server
    #[arg(long)]
    pub token: Option<String>,

    /// Directory for file-backed storage when no server is used
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Configuration file (YAML or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Id of the reviewing user
    #[arg(long)]
    pub author: Option<String>,

    /// Write the annotated image to this PNG and exit
    #[arg(long, value_name = "PNG")]
    pub export: Option<PathBuf>,
}

impl Cli {
    /// Target id: `--target`, else the image's file stem.
    pub fn target(&self) -> String {
        self.target.clone().unwrap_or_else(|| {
            self.image
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "untitled".to_string())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub server: ServerConfig,
    pub editor: EditorPreferences,
    /// Opaque id of the session user
    pub author: Option<String>,
    /// Directory for file-backed storage
    pub store: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorPreferences {
    /// Hit-test tolerance in natural pixels
    #[serde(default = "default_hit_margin")]
    pub hit_margin: f64,

    /// Cap on undo snapshots; unlimited when unset
    #[serde(default)]
    pub history_limit: Option<usize>,

    /// Style of new annotations
    #[serde(default = "default_style")]
    pub default_style: Style,

    #[serde(default = "default_selection_color")]
    pub selection_color: String,

    /// Arrowhead length in natural pixels
    #[serde(default = "default_arrow_head")]
    pub arrow_head: f64,
}

fn default_hit_margin() -> f64 {
    DEFAULT_MARGIN
}

fn default_style() -> Style {
    Style {
        font_size: Some(DEFAULT_FONT_SIZE),
        ..Style::default()
    }
}

fn default_selection_color() -> String {
    "#00ff00".to_string()
}

fn default_arrow_head() -> f64 {
    DEFAULT_ARROW_HEAD
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            hit_margin: default_hit_margin(),
            history_limit: None,
            default_style: default_style(),
            selection_color: default_selection_color(),
            arrow_head: default_arrow_head(),
        }
    }
}

impl EditorConfig {
    /// Read a config file; the extension picks YAML or JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = match DocumentFormat::from_path(path) {
            Some(DocumentFormat::Yaml) => serde_yaml::from_str(&text)
                .with_context(|| format!("Invalid YAML in {}", path.display()))?,
            Some(DocumentFormat::Json) => serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?,
            None => bail!("Unsupported config extension: {}", path.display()),
        };
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// File settings (when `--config` is given) with flags applied on top.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(server) = &cli.server {
            self.server.base_url = Some(server.clone());
        }
        if let Some(token) = &cli.token {
            self.server.token = Some(token.clone());
        }
        if let Some(store) = &cli.store {
            self.store = Some(store.clone());
        }
        if let Some(author) = &cli.author {
            self.author = Some(author.clone());
        }
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(
            Color::parse_or(&self.editor.selection_color, Color::GREEN),
            self.editor.arrow_head,
        )
    }

    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings {
            hit_margin: self.editor.hit_margin,
            style: self.editor.default_style.clone(),
            author: self.author.clone(),
        }
    }

    /// Server when configured, else a file store, else memory only.
    pub fn gateway(&self) -> Arc<dyn PersistenceGateway> {
        if let Some(base_url) = &self.server.base_url {
            log::info!("Saving annotations to {}", base_url);
            let gateway = HttpGateway::new(
                base_url,
                self.server.token.clone(),
                Duration::from_secs(self.server.timeout_secs),
            );
            return Arc::new(gateway);
        }
        if let Some(dir) = &self.store {
            log::info!("Saving annotations under {}", dir.display());
            return Arc::new(FileGateway::new(
                dir.clone(),
                DocumentFormat::Json,
                self.author.clone(),
            ));
        }
        log::warn!("No server or store configured; annotations will not outlive this session");
        Arc::new(MemoryGateway::new(self.author.clone()))
    }
}
