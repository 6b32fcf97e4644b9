/// 几何体数据和解析模块
///
/// 提供规范化后的网格数据结构，以及能力边界另一侧的模型解析器。
///
/// # 模块结构
///
/// - `vertex`: 顶点数据结构定义
/// - `mesh`: 规范化网格
/// - `aabb`: 轴对齐包围盒
/// - `math_utils`: 几何数学工具（法线计算、切线空间、三角化）
/// - `loaders`: 各种格式的场景解析器和解析阶段后处理
///
/// # 架构设计
///
/// ```text
/// 文件 (OBJ/glTF)
///     ↓
/// SceneParser (ObjParser/GltfParser + postprocess)
///     ↓
/// RawScene (中间场景)
///     ↓
/// producer 中的翻译器
///     ↓
/// Mesh / Node / Material (SceneDatabase)
/// ```

pub mod vertex;
pub mod mesh;
pub mod aabb;
pub mod math_utils;
pub mod loaders;

// 重新导出常用类型
pub use vertex::{BoneWeight, Vertex, VertexFormat};
pub use mesh::Mesh;
pub use aabb::Aabb;
