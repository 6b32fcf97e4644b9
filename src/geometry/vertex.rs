/// 几何体顶点定义模块
///
/// 定义规范化后的顶点结构，包含位置、法线、UV坐标、切线和副切线。
/// 源数据中缺失的通道以零填充，`VertexFormat` 记录哪些通道来自源数据。

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::scene::BoneId;

/// 完整的3D顶点结构
///
/// 内存布局与GPU兼容，使用 `#[repr(C)]` 保证顺序和对齐。
///
/// # 内存布局
///
/// - position: 12 bytes (3 * f32)
/// - normal: 12 bytes (3 * f32)
/// - texcoord: 8 bytes (2 * f32)
/// - tangent: 12 bytes (3 * f32)
/// - bitangent: 12 bytes (3 * f32)
/// - **总计**: 56 bytes
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 顶点位置 (x, y, z)
    pub position: [f32; 3],

    /// 法线向量 (nx, ny, nz)
    pub normal: [f32; 3],

    /// 第 0 套纹理坐标 (u, v)
    ///
    /// 其余 UV 套存储在 `Mesh::extra_uv_sets` 中。
    pub texcoord: [f32; 2],

    /// 切线向量 (tx, ty, tz)
    pub tangent: [f32; 3],

    /// 副切线向量 (bx, by, bz)
    pub bitangent: [f32; 3],
}

impl Vertex {
    /// 创建一个只有位置的顶点，其它通道为零
    #[inline]
    pub fn from_position(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

bitflags! {
    /// 顶点中哪些通道来自源数据
    ///
    /// 未设置的通道在顶点中是零值占位。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertexFormat: u8 {
        const POSITION     = 1 << 0;
        const NORMAL       = 1 << 1;
        const TEXCOORD     = 1 << 2;
        const TANGENT      = 1 << 3;
        const BITANGENT    = 1 << 4;
        const BONE_WEIGHTS = 1 << 5;
    }
}

/// 单个骨骼影响
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneWeight {
    pub bone: BoneId,
    pub weight: f32,
}
