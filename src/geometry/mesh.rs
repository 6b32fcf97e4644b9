/// 规范化网格模块
///
/// 定义导入后交给渲染器的网格数据容器。
/// 网格要么被完整构建，要么在导入时被丢弃，不存在部分填充的状态。

use super::aabb::Aabb;
use super::vertex::{BoneWeight, Vertex, VertexFormat};
use crate::scene::{MaterialId, MeshId};

/// 规范化网格
///
/// # 架构说明
///
/// - `vertices` 和 `indices` 可以直接上传到 GPU 缓冲区
/// - `extra_uv_sets` 与 `influences` 按顶点与 `vertices` 平行
///
/// # 示例
///
/// ```rust
/// use dist_scene::geometry::{Mesh, Vertex};
/// use dist_scene::scene::MeshId;
///
/// let mut mesh = Mesh::new(MeshId(0), "Triangle");
/// mesh.vertices = vec![
///     Vertex::from_position([0.0, 0.0, 0.0]),
///     Vertex::from_position([1.0, 0.0, 0.0]),
///     Vertex::from_position([0.0, 0.0, 1.0]),
/// ];
/// mesh.indices = vec![0, 1, 2];
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Mesh {
    /// 在场景数据库中的 ID
    pub id: MeshId,

    /// 网格名称
    pub name: String,

    /// 顶点数组
    pub vertices: Vec<Vertex>,

    /// 索引数组
    ///
    /// 三角形顶点索引，每3个索引定义一个三角形。
    pub indices: Vec<u32>,

    /// 第 1 套及之后的纹理坐标，每套长度等于顶点数
    pub extra_uv_sets: Vec<Vec<[f32; 2]>>,

    /// 每个顶点的骨骼影响
    ///
    /// 没有蒙皮数据时为空，否则长度等于顶点数，每个顶点的权重和为 1。
    pub influences: Vec<Vec<BoneWeight>>,

    /// 源数据中实际存在的顶点通道
    pub format: VertexFormat,

    /// 包围盒（仅在 BoundingBox 服务开启时计算）
    pub aabb: Option<Aabb>,

    /// 使用的材质
    pub material: Option<MaterialId>,
}

impl Mesh {
    /// 创建一个空网格
    pub fn new(id: MeshId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            vertices: Vec::new(),
            indices: Vec::new(),
            extra_uv_sets: Vec::new(),
            influences: Vec::new(),
            format: VertexFormat::POSITION,
            aabb: None,
            material: None,
        }
    }

    /// 获取顶点数量
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 获取三角形数量
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// UV 套数（包括第 0 套）
    pub fn uv_set_count(&self) -> usize {
        if self.format.contains(VertexFormat::TEXCOORD) {
            1 + self.extra_uv_sets.len()
        } else {
            0
        }
    }

    #[inline]
    pub fn has_tangents(&self) -> bool {
        self.format.contains(VertexFormat::TANGENT)
    }

    #[inline]
    pub fn is_skinned(&self) -> bool {
        !self.influences.is_empty()
    }

    /// 按三角形遍历索引
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// 验证网格数据的有效性
    ///
    /// 检查：
    /// - 索引数量是3的倍数
    /// - 所有索引都在有效范围内
    /// - 平行的逐顶点数组长度一致
    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count must be a multiple of 3, got {}",
                self.indices.len()
            ));
        }

        let vertex_count = self.vertices.len() as u32;
        if let Some((i, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &index)| index >= vertex_count)
        {
            return Err(format!(
                "index {} at position {} is out of range (vertex count {})",
                index, i, vertex_count
            ));
        }

        for (set, uvs) in self.extra_uv_sets.iter().enumerate() {
            if uvs.len() != self.vertices.len() {
                return Err(format!(
                    "uv set {} has {} entries for {} vertices",
                    set + 1,
                    uvs.len(),
                    vertex_count
                ));
            }
        }

        if !self.influences.is_empty() && self.influences.len() != self.vertices.len() {
            return Err(format!(
                "{} influence lists for {} vertices",
                self.influences.len(),
                vertex_count
            ));
        }

        Ok(())
    }
}
