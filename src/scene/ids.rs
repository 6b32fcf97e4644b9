//! 场景数据库中各类实体的 ID
//!
//! ID 就是实体在数据库对应数组中的下标，在一次导入中按顺序分配，之后保持不变。

use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// 作为数组下标使用
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// 网格 ID
    MeshId, "mesh"
);
entity_id!(
    /// 材质 ID
    MaterialId, "material"
);
entity_id!(
    /// 节点 ID
    NodeId, "node"
);
entity_id!(
    /// 骨骼 ID
    BoneId, "bone"
);
