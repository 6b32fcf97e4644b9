//! 配置管理模块
//!
//! 提供导入管线配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (dist_scene.toml)
//!
//! ```toml
//! [services]
//! duplicate_vertex = false
//! bounding_box = true
//! flatten_hierarchy = false
//! triangulate = true
//! tangent_space = true
//! clean_unused = false
//!
//! [textures]
//! extra_search_folders = ["D:/Textures"]
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use crate::producer::ServiceFlags;

/// 导入配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 处理服务开关
    #[serde(default)]
    pub services: ServicesConfig,

    /// 贴图查找配置
    #[serde(default)]
    pub textures: TextureConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 六个处理服务的开关
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub duplicate_vertex: bool,
    #[serde(default)]
    pub bounding_box: bool,
    #[serde(default)]
    pub flatten_hierarchy: bool,
    #[serde(default)]
    pub triangulate: bool,
    #[serde(default)]
    pub tangent_space: bool,
    #[serde(default)]
    pub clean_unused: bool,
}

/// 贴图查找配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextureConfig {
    /// 额外的贴图搜索目录
    ///
    /// 当贴图路径错误时，可以用这些目录重定向查找。
    #[serde(default)]
    pub extra_search_folders: Vec<PathBuf>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "dist_scene.log".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl ServicesConfig {
    /// 转换为导入时使用的服务标志
    pub fn to_flags(self) -> ServiceFlags {
        let mut flags = ServiceFlags::empty();
        flags.set(ServiceFlags::DUPLICATE_VERTEX, self.duplicate_vertex);
        flags.set(ServiceFlags::BOUNDING_BOX, self.bounding_box);
        flags.set(ServiceFlags::FLATTEN_HIERARCHY, self.flatten_hierarchy);
        flags.set(ServiceFlags::TRIANGULATE, self.triangulate);
        flags.set(ServiceFlags::TANGENT_SPACE, self.tangent_space);
        flags.set(ServiceFlags::CLEAN_UNUSED, self.clean_unused);
        flags
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--duplicate-vertex`, `--bounding-box`, `--flatten`,
    ///   `--triangulate`, `--tangent-space`, `--clean-unused`: 打开对应服务
    /// - `--texture-dir <dir>`: 追加一个贴图搜索目录（可重复）
    ///
    /// 返回未被消费的位置参数（不以 `--` 开头，且不是选项的值）。
    pub fn apply_args<I>(&mut self, args: I) -> Vec<String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        let mut positional = Vec::new();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--duplicate-vertex" => self.services.duplicate_vertex = true,
                "--bounding-box" => self.services.bounding_box = true,
                "--flatten" => self.services.flatten_hierarchy = true,
                "--triangulate" => self.services.triangulate = true,
                "--tangent-space" => self.services.tangent_space = true,
                "--clean-unused" => self.services.clean_unused = true,
                "--texture-dir" => {
                    if let Some(dir) = iter.next() {
                        self.textures.extra_search_folders.push(PathBuf::from(dir));
                    }
                }
                flag if flag.starts_with("--") => {
                    tracing::warn!(flag, "Unknown command line flag ignored");
                }
                _ => positional.push(arg),
            }
        }
        positional
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self
            .textures
            .extra_search_folders
            .iter()
            .any(|folder| folder.as_os_str().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "textures.extra_search_folders".to_string(),
                reason: "Search folder entries must not be empty".to_string(),
            }.into());
        }

        Ok(())
    }
}
