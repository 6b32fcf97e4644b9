//! 处理服务开关
//!
//! 六个相互独立的服务。其中三个（Triangulate、TangentSpace、CleanUnused）
//! 交给解析器执行，其余三个由翻译器执行。

use bitflags::bitflags;

use crate::geometry::loaders::ImportFlags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ServiceFlags: u8 {
        /// 每个面角使用独立的顶点
        const DUPLICATE_VERTEX  = 1 << 0;
        /// 计算网格包围盒
        const BOUNDING_BOX      = 1 << 1;
        /// 把层级展平为根节点 + 一层子节点
        const FLATTEN_HIERARCHY = 1 << 2;
        /// 解析器三角化多边形
        const TRIANGULATE       = 1 << 3;
        /// 解析器生成切线空间
        const TANGENT_SPACE     = 1 << 4;
        /// 解析器删除未使用的数据
        const CLEAN_UNUSED      = 1 << 5;
    }
}

impl ServiceFlags {
    /// 推导传给解析器的导入标志
    ///
    /// 始终包含 `ImportFlags::BASE`；DuplicateVertex、BoundingBox 和
    /// FlattenHierarchy 不影响解析器。
    pub fn import_flags(self) -> ImportFlags {
        let mut flags = ImportFlags::BASE;
        flags.set(ImportFlags::TRIANGULATE, self.contains(Self::TRIANGULATE));
        flags.set(ImportFlags::CALC_TANGENT_SPACE, self.contains(Self::TANGENT_SPACE));
        flags.set(ImportFlags::REMOVE_UNUSED, self.contains(Self::CLEAN_UNUSED));
        flags
    }
}
