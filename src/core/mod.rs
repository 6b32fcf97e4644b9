//! 核心功能模块
//!
//! 本模块提供了导入管线的基础功能：数学库、日志系统、配置管理和错误处理。
//! 这些模块与具体的文件格式和翻译器解耦。
//!
//! # 模块组织
//!
//! - `math`：nalgebra 类型别名和矩阵辅助函数
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件加载服务开关和贴图目录
//! - `error`：错误处理，定义统一的错误类型

pub mod math;
pub mod log;
pub mod config;
pub mod error;

// 重新导出常用类型，方便使用
pub use math::{Vector3, Matrix4};
pub use error::{Result, ImportError, ParseError, ConfigError};
pub use config::Config;
