// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use crate::exception::Exception;

/// 覆盖配置文件中 `mode` 的环境变量
pub const ENV_MODE: &str = "WEBDISPATCH_ENV";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default = "default_controller_file")]
    controller_file: String,
    #[serde(default)]
    views_path: Option<String>,
    #[serde(default = "default_template_ext")]
    template_ext: String,
    /// 毫秒，0 表示不限时
    #[serde(default)]
    action_timeout: u64,
    #[serde(default = "default_max_request_size")]
    max_request_size: usize,
    #[serde(default)]
    routes: HashMap<String, String>,
}

fn default_port() -> u16 {
    7878
}

fn default_local() -> bool {
    true
}

fn default_mode() -> String {
    "development".to_string()
}

fn default_controller_file() -> String {
    "{}_controller".to_string()
}

fn default_template_ext() -> String {
    "html".to_string()
}

fn default_max_request_size() -> usize {
    8192
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: default_port(),
            local: default_local(),
            worker_threads: num_cpus::get(),
            mode: default_mode(),
            controller_file: default_controller_file(),
            views_path: None,
            template_ext: default_template_ext(),
            action_timeout: 0,
            max_request_size: default_max_request_size(),
            routes: HashMap::new(),
        }
    }

    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = File::open(filename)
            .map_err(|e| Exception::ConfigError(format!("no such file {}: {}", filename, e)))?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)
            .map_err(|e| Exception::ConfigError(format!("error reading {}: {}", filename, e)))?;
        Self::from_toml_str(&str_val)
    }

    /// 用环境变量覆盖运行模式。无论配置来自文件还是默认值都应调用。
    pub fn apply_env(&mut self) {
        self.override_mode(std::env::var(ENV_MODE).ok());
    }

    fn override_mode(&mut self, mode: Option<String>) {
        if let Some(mode) = mode {
            info!("环境变量{}覆盖运行模式：{}", ENV_MODE, mode);
            self.mode = mode;
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Exception> {
        let mut raw_config: Config =
            toml::from_str(content).map_err(|e| Exception::ConfigError(e.to_string()))?;
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if !raw_config.controller_file.contains("{}") {
            warn!(
                "controller_file（{}）中没有{{}}占位符，所有控制器将映射到同一个名称",
                raw_config.controller_file
            );
        }
        Ok(raw_config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn is_production(&self) -> bool {
        self.mode == "production"
    }

    /// 生产模式下启用控制器、视图和响应缓存
    pub fn cache_enabled(&self) -> bool {
        self.is_production()
    }

    pub fn controller_file(&self) -> &str {
        &self.controller_file
    }

    pub fn views_path(&self) -> PathBuf {
        match &self.views_path {
            Some(p) => PathBuf::from(p),
            None if self.is_production() => Path::new("app").join("min_views"),
            None => Path::new("app").join("views"),
        }
    }

    pub fn template_ext(&self) -> &str {
        &self.template_ext
    }

    pub fn action_timeout(&self) -> Option<std::time::Duration> {
        match self.action_timeout {
            0 => None,
            ms => Some(std::time::Duration::from_millis(ms)),
        }
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }

    pub fn routes(&self) -> &HashMap<String, String> {
        &self.routes
    }
}
