//! 场景数据库
//!
//! 规范化场景的唯一所有者。导入时 `Producer` 先把所有实体写入一个
//! `SceneBatch`，全部翻译成功后才一次性提交，失败时数据库保持原样。

use crate::core::math::Matrix4;
use crate::geometry::Mesh;

use super::ids::{BoneId, MaterialId, MeshId, NodeId};
use super::material::Material;
use super::node::{Bone, Node};

/// 网格在场景中的一次实例化
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub node: NodeId,
    pub mesh: MeshId,
    pub world_transform: Matrix4,
}

/// 规范化场景数据库
#[derive(Debug, Default)]
pub struct SceneDatabase {
    nodes: Vec<Node>,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    bones: Vec<Bone>,
    roots: Vec<NodeId>,
}

impl SceneDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// 每次导入产生的场景根节点
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.index())
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn find_mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }

    pub fn find_material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|material| material.name == name)
    }

    pub fn parent(&self, id: NodeId) -> Option<&Node> {
        self.node(id)?.parent.and_then(|parent| self.node(parent))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|node| node.children.iter())
            .filter_map(|child| self.node(*child))
    }

    /// 沿父节点链累乘得到世界变换
    pub fn world_transform(&self, id: NodeId) -> Option<Matrix4> {
        let mut node = self.node(id)?;
        let mut world = node.transform;
        // 父链长度不会超过节点总数
        for _ in 0..self.nodes.len() {
            match node.parent.and_then(|parent| self.node(parent)) {
                Some(parent) => {
                    world = parent.transform * world;
                    node = parent;
                }
                None => return Some(world),
            }
        }
        None
    }

    /// 所有 (节点, 网格, 世界变换) 组合
    pub fn mesh_instances(&self) -> Vec<MeshInstance> {
        self.nodes
            .iter()
            .flat_map(|node| {
                let world = self.world_transform(node.id).unwrap_or_else(Matrix4::identity);
                node.meshes.iter().map(move |mesh| MeshInstance {
                    node: node.id,
                    mesh: *mesh,
                    world_transform: world,
                })
            })
            .collect()
    }

    pub fn total_vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }

    pub fn total_triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.meshes.is_empty() && self.materials.is_empty()
    }

    /// 提交一次导入的全部结果
    pub(crate) fn commit(&mut self, batch: SceneBatch) {
        debug_assert_eq!(batch.node_base, self.nodes.len());
        debug_assert_eq!(batch.mesh_base, self.meshes.len());
        debug_assert_eq!(batch.material_base, self.materials.len());
        debug_assert_eq!(batch.bone_base, self.bones.len());

        self.nodes.extend(batch.nodes);
        self.meshes.extend(batch.meshes);
        self.materials.extend(batch.materials);
        self.bones.extend(batch.bones);
        if let Some(root) = batch.root {
            self.roots.push(root);
        }
    }
}

/// 一次导入的暂存区
///
/// ID 从数据库当前的实体数量开始分配，所以提交后 ID 仍然有效。
#[derive(Debug)]
pub(crate) struct SceneBatch {
    pub node_base: usize,
    pub mesh_base: usize,
    pub material_base: usize,
    pub bone_base: usize,

    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub bones: Vec<Bone>,
    pub root: Option<NodeId>,
}

impl SceneBatch {
    pub fn for_database(database: &SceneDatabase) -> Self {
        Self {
            node_base: database.nodes.len(),
            mesh_base: database.meshes.len(),
            material_base: database.materials.len(),
            bone_base: database.bones.len(),
            nodes: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            bones: Vec::new(),
            root: None,
        }
    }

    pub fn next_node_id(&self) -> NodeId {
        NodeId::from_index(self.node_base + self.nodes.len())
    }

    pub fn next_mesh_id(&self) -> MeshId {
        MeshId::from_index(self.mesh_base + self.meshes.len())
    }

    pub fn next_material_id(&self) -> MaterialId {
        MaterialId::from_index(self.material_base + self.materials.len())
    }

    pub fn next_bone_id(&self) -> BoneId {
        BoneId::from_index(self.bone_base + self.bones.len())
    }

    /// 暂存区内的节点（按 ID 查找）
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let local = id.index().checked_sub(self.node_base)?;
        self.nodes.get_mut(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::Vector3;
    use approx::assert_relative_eq;

    fn two_level_database() -> SceneDatabase {
        let mut database = SceneDatabase::new();
        let mut batch = SceneBatch::for_database(&database);

        let mut root = Node::new(batch.next_node_id(), "Root");
        root.transform = Matrix4::new_translation(&Vector3::new(0.0, 1.0, 0.0));
        batch.nodes.push(root);

        let mut child = Node::new(batch.next_node_id(), "Child");
        child.parent = Some(NodeId(0));
        child.transform = Matrix4::new_translation(&Vector3::new(2.0, 0.0, 0.0));
        child.meshes.push(MeshId(0));
        batch.nodes.push(child);
        batch.nodes[0].children.push(NodeId(1));

        batch.meshes.push(Mesh::new(batch.next_mesh_id(), "Cube"));
        batch.root = Some(NodeId(0));
        database.commit(batch);
        database
    }

    #[test]
    fn test_commit_and_lookup() {
        let database = two_level_database();

        assert_eq!(database.roots(), &[NodeId(0)]);
        assert_eq!(database.nodes().len(), 2);
        assert_eq!(database.find_node("Child").map(|n| n.id), Some(NodeId(1)));
        assert_eq!(database.parent(NodeId(1)).map(|n| n.id), Some(NodeId(0)));
        assert_eq!(database.children(NodeId(0)).count(), 1);
        assert!(database.mesh(MeshId(0)).is_some());
        assert!(database.material(MaterialId(0)).is_none());
    }

    #[test]
    fn test_world_transform() {
        let database = two_level_database();
        let world = database.world_transform(NodeId(1)).unwrap();
        let expected = Matrix4::new_translation(&Vector3::new(2.0, 1.0, 0.0));
        assert_relative_eq!(world, expected);
    }

    #[test]
    fn test_mesh_instances() {
        let database = two_level_database();
        let instances = database.mesh_instances();

        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].node, NodeId(1));
        assert_eq!(instances[0].world_transform[(0, 3)], 2.0);
    }

    #[test]
    fn test_batch_ids_continue_after_existing_entities() {
        let database = two_level_database();
        let batch = SceneBatch::for_database(&database);

        assert_eq!(batch.next_node_id(), NodeId(2));
        assert_eq!(batch.next_mesh_id(), MeshId(1));
        assert_eq!(batch.next_material_id(), MaterialId(0));
    }
}
