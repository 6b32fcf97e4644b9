//! 错误处理模块
//!
//! 定义了导入管线中使用的统一错误类型，使用 `thiserror` 提供友好的错误消息。
//!
//! # 错误分类
//!
//! - **致命错误**：`ImportError`，导入中止，场景数据库不会被修改
//! - **可恢复错误**：不在这里定义，而是以 `ImportWarning` 的形式写入
//!   `ImportReport` 并输出日志（见 `producer::report`）
//!
//! # 设计原则
//!
//! - 使用 `thiserror` 自动实现 `Error` trait
//! - 为每种错误类型提供清晰的上下文信息
//! - 支持错误链（error source）

use std::path::PathBuf;
use thiserror::Error;

/// 导入管线统一的 Result 类型
pub type Result<T> = std::result::Result<T, ImportError>;

/// 导入过程中的致命错误
#[derive(Debug, Error)]
pub enum ImportError {
    /// 模型文件不存在或无法打开
    #[error("Model file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// 没有可用于该扩展名的解析器
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// 解析器没有返回场景图
    #[error("Parser failed: {0}")]
    Parse(#[from] ParseError),

    /// `execute` 只能调用一次
    #[error("Producer has already executed")]
    AlreadyExecuted,

    /// 节点引用了不存在的网格
    #[error("Node '{node}' references mesh {mesh} which does not exist")]
    OrphanedMeshReference { node: String, mesh: usize },

    /// 展平层级后网格没有任何节点持有
    #[error("Mesh '{mesh}' is not owned by any node")]
    OrphanedMesh { mesh: String },

    /// 节点层级中存在环或重复引用
    #[error("Node '{node}' is reachable more than once in the hierarchy")]
    CyclicHierarchy { node: String },

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 解析器（能力边界另一侧）报告的失败
#[derive(Debug, Error)]
pub enum ParseError {
    /// 外部库错误（tobj / gltf 的诊断信息）
    #[error("{0}")]
    External(String),

    /// 文件被打开但不包含任何可用的场景
    #[error("file contains no scene")]
    Empty,

    /// 场景图内部引用越界
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

/// 配置相关的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件未找到
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    /// 配置文件解析失败
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// 配置值无效
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_converts_into_import_error() {
        let err: ImportError = ParseError::Empty.into();
        assert!(matches!(err, ImportError::Parse(ParseError::Empty)));
        assert_eq!(err.to_string(), "Parser failed: file contains no scene");
    }

    #[test]
    fn test_file_not_found_message() {
        let err = ImportError::FileNotFound(PathBuf::from("models/missing.obj"));
        assert!(err.to_string().contains("models/missing.obj"));
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;
        let err: ImportError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(err.source().is_some());
    }
}
