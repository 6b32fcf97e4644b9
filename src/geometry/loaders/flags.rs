//! 解析器导入标志
//!
//! 解析器接受的后处理请求。`Producer` 根据服务开关推导出这组标志，
//! 解析器按 `postprocess::apply` 中的固定顺序执行它们。

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ImportFlags: u32 {
        /// 丢弃越界的面和引用，检查层级引用
        const VALIDATE_DATA      = 1 << 0;
        /// 将多边形扇形三角化
        const TRIANGULATE        = 1 << 1;
        /// 删除未被引用的材质、网格和空叶子节点
        const REMOVE_UNUSED      = 1 << 2;
        /// 缺少法线时生成法线
        const GEN_NORMALS        = 1 << 3;
        /// 生成切线和副切线（需要法线和 UV）
        const CALC_TANGENT_SPACE = 1 << 4;
        /// 每个顶点最多保留 4 个骨骼影响
        const LIMIT_BONE_WEIGHTS = 1 << 5;
        /// 沿 Z 轴镜像，右手坐标系转左手坐标系
        const MAKE_LEFT_HANDED   = 1 << 6;
        /// v = 1 - v
        const FLIP_UVS           = 1 << 7;
        /// 反转每个面的顶点顺序
        const FLIP_WINDING_ORDER = 1 << 8;

        /// 引擎原生的坐标系和绕序约定
        const CONVERT_TO_LEFT_HANDED = Self::MAKE_LEFT_HANDED.bits()
            | Self::FLIP_UVS.bits()
            | Self::FLIP_WINDING_ORDER.bits();
    }
}

/// 每个顶点保留的最大骨骼影响数
pub const MAX_BONE_WEIGHTS: usize = 4;

impl ImportFlags {
    /// 始终开启的标志
    pub const BASE: ImportFlags = ImportFlags::GEN_NORMALS
        .union(ImportFlags::VALIDATE_DATA)
        .union(ImportFlags::LIMIT_BONE_WEIGHTS)
        .union(ImportFlags::CONVERT_TO_LEFT_HANDED);
}
