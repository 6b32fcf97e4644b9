//! 中间场景图（解析器输出）的只读访问接口
//!
//! 翻译器只通过这里的 trait 读取解析结果，不依赖任何具体解析库的类型。
//! 解析器产生的具体数据结构是 `raw` 子模块中的 `RawScene`。
//!
//! # 架构设计
//!
//! ```text
//! 文件 (OBJ/glTF)
//!     ↓
//! SceneParser (tobj / gltf + 后处理)
//!     ↓
//! RawScene ── SourceScene / SourceNode / SourceMesh / SourceMaterial
//!     ↓
//! 翻译器 (材质 → 网格 → 层级)
//!     ↓
//! SceneDatabase
//! ```

pub mod raw;

pub use raw::{RawBone, RawMaterial, RawMesh, RawNode, RawScene};

use crate::core::math::Matrix4;
use crate::scene::TextureSlot;

/// 材质标量属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarProperty {
    Opacity,
    Shininess,
    Metallic,
    Roughness,
}

/// 材质颜色属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorProperty {
    Diffuse,
    Specular,
    Emissive,
    Ambient,
}

/// 整个中间场景
///
/// 节点、网格、材质都是扁平数组，相互之间用下标引用。
pub trait SourceScene {
    type Node: SourceNode;
    type Mesh: SourceMesh;
    type Material: SourceMaterial;

    /// 根节点在 `nodes()` 中的下标
    fn root(&self) -> usize;
    fn nodes(&self) -> &[Self::Node];
    fn meshes(&self) -> &[Self::Mesh];
    fn materials(&self) -> &[Self::Material];
}

pub trait SourceNode {
    fn name(&self) -> &str;

    /// 相对父节点的变换
    fn transform(&self) -> Matrix4;
    fn children(&self) -> &[usize];
    fn meshes(&self) -> &[usize];
}

/// 网格：按解析器原生索引共享的顶点 + 面
pub trait SourceMesh {
    fn name(&self) -> &str;
    fn positions(&self) -> &[[f32; 3]];
    fn normals(&self) -> Option<&[[f32; 3]]>;
    fn tangents(&self) -> Option<&[[f32; 3]]>;
    fn bitangents(&self) -> Option<&[[f32; 3]]>;
    fn uv_set_count(&self) -> usize;
    fn uv_set(&self, set: usize) -> Option<&[[f32; 2]]>;

    /// 每个面是一组顶点下标，可能是多边形
    fn faces(&self) -> &[Vec<u32>];
    fn material_index(&self) -> Option<usize>;
    fn bones(&self) -> &[RawBone];
}

pub trait SourceMaterial {
    fn name(&self) -> &str;

    /// 贴图槽位中存储的原始引用（通常是路径字符串）
    fn texture(&self, slot: TextureSlot) -> Option<&str>;
    fn scalar(&self, property: ScalarProperty) -> Option<f32>;
    fn color(&self, property: ColorProperty) -> Option<[f32; 3]>;
}
