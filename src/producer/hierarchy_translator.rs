//! 层级翻译器
//!
//! 用显式栈（不递归）前序遍历源节点树，建立规范化节点及父子关系。
//!
//! 展平分两遍：
//! 1. 遍历时累乘出每个节点相对根节点的变换（不含根节点自身的变换）
//! 2. 所有非根节点改挂到根节点下，局部变换替换为第 1 遍的结果
//!
//! 因此展平后世界变换保持不变。

use std::collections::{HashMap, HashSet};

use super::services::ServiceFlags;
use crate::core::error::{ImportError, ParseError, Result};
use crate::core::math::Matrix4;
use crate::scene::{MeshId, Node, NodeId, SceneBatch};
use crate::source::{SourceNode, SourceScene};

pub(crate) struct HierarchyTranslator<'a> {
    services: ServiceFlags,
    mesh_ids: &'a [Option<MeshId>],
}

impl<'a> HierarchyTranslator<'a> {
    pub fn new(services: ServiceFlags, mesh_ids: &'a [Option<MeshId>]) -> Self {
        Self { services, mesh_ids }
    }

    /// 构建节点树，返回根节点 ID
    pub fn translate<S: SourceScene>(&self, scene: &S, batch: &mut SceneBatch) -> Result<NodeId> {
        let sources = scene.nodes();
        if scene.root() >= sources.len() {
            return Err(ParseError::InvalidReference(format!(
                "root node {} out of {} nodes",
                scene.root(),
                sources.len()
            ))
            .into());
        }

        // 第 1 遍：前序遍历；与 batch.nodes 平行地记录相对根节点的变换
        let mut relative_to_root: Vec<Matrix4> = Vec::with_capacity(sources.len());
        let mut visited = HashSet::new();
        let mut stack: Vec<(usize, Option<NodeId>, Matrix4)> =
            vec![(scene.root(), None, Matrix4::identity())];
        let mut root_id = None;

        while let Some((index, parent, parent_relative)) = stack.pop() {
            let source = &sources[index];
            if !visited.insert(index) {
                return Err(ImportError::CyclicHierarchy {
                    node: source.name().to_string(),
                });
            }

            let id = batch.next_node_id();
            let mut node = Node::new(id, source.name());
            node.parent = parent;
            node.transform = source.transform();
            node.meshes = self.map_meshes(source)?;

            // 根节点自身的变换不计入
            let relative = match parent {
                Some(_) => parent_relative * node.transform,
                None => Matrix4::identity(),
            };

            if let Some(parent) = parent.and_then(|p| batch.node_mut(p)) {
                parent.children.push(id);
            }
            if parent.is_none() {
                root_id = Some(id);
            }

            for &child in source.children().iter().rev() {
                if child >= sources.len() {
                    return Err(ParseError::InvalidReference(format!(
                        "node '{}' has child {} out of {} nodes",
                        source.name(),
                        child,
                        sources.len()
                    ))
                    .into());
                }
                stack.push((child, Some(id), relative));
            }

            batch.nodes.push(node);
            relative_to_root.push(relative);
        }

        let root_id = root_id.ok_or(ParseError::Empty)?;

        // 第 2 遍：展平
        if self.services.contains(ServiceFlags::FLATTEN_HIERARCHY) {
            flatten(batch, root_id, &relative_to_root);
            self.check_mesh_ownership(batch)?;
        }

        link_bones(batch);
        batch.root = Some(root_id);

        crate::import_debug!(
            nodes = batch.nodes.len(),
            flattened = self.services.contains(ServiceFlags::FLATTEN_HIERARCHY),
            "Built node hierarchy"
        );
        Ok(root_id)
    }

    /// 源网格引用 -> 网格 ID
    ///
    /// 越界引用是致命错误；指向已丢弃网格的引用被移除。
    fn map_meshes<N: SourceNode>(&self, source: &N) -> Result<Vec<MeshId>> {
        let mut meshes = Vec::with_capacity(source.meshes().len());
        for &mesh in source.meshes() {
            match self.mesh_ids.get(mesh) {
                Some(Some(id)) => meshes.push(*id),
                Some(None) => {
                    crate::import_debug!(node = %source.name(), mesh, "Removed reference to dropped mesh");
                }
                None => {
                    return Err(ImportError::OrphanedMeshReference {
                        node: source.name().to_string(),
                        mesh,
                    })
                }
            }
        }
        Ok(meshes)
    }

    /// 展平后每个网格都必须被某个节点持有
    fn check_mesh_ownership(&self, batch: &SceneBatch) -> Result<()> {
        let owned: HashSet<MeshId> = batch
            .nodes
            .iter()
            .flat_map(|node| node.meshes.iter().copied())
            .collect();
        match batch.meshes.iter().find(|mesh| !owned.contains(&mesh.id)) {
            Some(mesh) => Err(ImportError::OrphanedMesh {
                mesh: mesh.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn flatten(batch: &mut SceneBatch, root_id: NodeId, relative_to_root: &[Matrix4]) {
    let mut flat_children = Vec::with_capacity(batch.nodes.len().saturating_sub(1));
    for (node, relative) in batch.nodes.iter_mut().zip(relative_to_root) {
        if node.id == root_id {
            continue;
        }
        node.parent = Some(root_id);
        node.children.clear();
        node.transform = *relative;
        flat_children.push(node.id);
    }
    if let Some(root) = batch.node_mut(root_id) {
        root.children = flat_children;
    }
}

/// 骨骼关联到同名节点（取第一个）
fn link_bones(batch: &mut SceneBatch) {
    let mut by_name: HashMap<&str, NodeId> = HashMap::new();
    for node in &batch.nodes {
        by_name.entry(node.name.as_str()).or_insert(node.id);
    }
    for bone in &mut batch.bones {
        bone.node = by_name.get(bone.name.as_str()).copied();
    }
}
