//! DistScene - 模型导入与场景规范化管线
//!
//! 把任意交换格式（OBJ、glTF）的3D模型导入为渲染器可以直接使用的规范化场景：
//! 严格的顶点布局、有效的索引和引用、可选的包围盒与展平层级。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（数学、日志、配置、错误处理）
//! - `geometry`: 几何体模块（顶点、网格、包围盒、OBJ/glTF 解析器）
//! - `source`: 解析器输出的中间场景及其只读访问接口
//! - `scene`: 规范化场景数据库（节点、网格、材质、骨骼）
//! - `producer`: 导入流程编排（服务开关、翻译器、导入报告）
//!
//! # 使用示例
//!
//! ```no_run
//! use dist_scene::producer::Producer;
//! use dist_scene::scene::SceneDatabase;
//!
//! let mut producer = Producer::new("model.gltf")?;
//! producer.activate_flatten_hierarchy_service();
//!
//! let mut database = SceneDatabase::new();
//! producer.execute(&mut database)?;
//!
//! for instance in database.mesh_instances() {
//!     println!("{} -> {}", instance.node, instance.mesh);
//! }
//! # Ok::<(), dist_scene::core::ImportError>(())
//! ```

pub mod core;
pub mod geometry;
pub mod source;
pub mod scene;
pub mod producer;

pub use crate::core::{Config, ImportError, Result};
pub use crate::producer::{ImportReport, ImportWarning, Producer, ProducerState, ServiceFlags};
pub use crate::scene::SceneDatabase;
