//! 场景节点和骨骼

use crate::core::math::Matrix4;

use super::ids::{BoneId, MeshId, NodeId};

/// 场景节点
///
/// 父节点是弱引用：只存 ID，通过 `SceneDatabase::node` 查找。
/// 子节点列表保持源场景中的顺序。
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    /// 相对父节点的变换
    pub transform: Matrix4,

    /// 该节点持有的网格
    pub meshes: Vec<MeshId>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: Matrix4::identity(),
            meshes: Vec::new(),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// 没有网格也没有子节点，只作为变换锚点存在
    #[inline]
    pub fn is_anchor(&self) -> bool {
        self.meshes.is_empty() && self.children.is_empty()
    }
}

/// 骨骼
#[derive(Debug, Clone)]
pub struct Bone {
    pub id: BoneId,
    pub name: String,

    /// 网格空间到骨骼空间的偏移矩阵（逆绑定矩阵）
    pub offset: Matrix4,

    /// 同名的场景节点
    pub node: Option<NodeId>,
}
