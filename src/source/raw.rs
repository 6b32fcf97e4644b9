//! 解析器产生的中间场景数据
//!
//! 所有解析器（以及测试）都输出这些类型；后处理步骤（见
//! `geometry::loaders::postprocess`）直接修改它们。

use std::collections::HashMap;

use super::{ColorProperty, ScalarProperty, SourceMaterial, SourceMesh, SourceNode, SourceScene};
use crate::core::math::Matrix4;
use crate::scene::TextureSlot;

/// 中间场景
#[derive(Debug, Clone)]
pub struct RawScene {
    pub root: usize,
    pub nodes: Vec<RawNode>,
    pub meshes: Vec<RawMesh>,
    pub materials: Vec<RawMaterial>,
}

#[derive(Debug, Clone)]
pub struct RawNode {
    pub name: String,
    pub transform: Matrix4,
    pub children: Vec<usize>,
    pub meshes: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct RawMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    pub bitangents: Option<Vec<[f32; 3]>>,
    pub uv_sets: Vec<Vec<[f32; 2]>>,
    pub faces: Vec<Vec<u32>>,
    pub material: Option<usize>,
    pub bones: Vec<RawBone>,
}

/// 骨骼及其影响的顶点
#[derive(Debug, Clone)]
pub struct RawBone {
    pub name: String,
    pub offset: Matrix4,

    /// (顶点下标, 权重)
    pub weights: Vec<(u32, f32)>,
}

#[derive(Debug, Clone, Default)]
pub struct RawMaterial {
    pub name: String,
    pub textures: HashMap<TextureSlot, String>,
    pub scalars: HashMap<ScalarProperty, f32>,
    pub colors: HashMap<ColorProperty, [f32; 3]>,
}

impl RawScene {
    /// 只有一个根节点的空场景
    pub fn with_root(name: impl Into<String>) -> Self {
        Self {
            root: 0,
            nodes: vec![RawNode::new(name)],
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// 在 `parent` 下添加一个子节点，返回新节点下标
    pub fn add_node(&mut self, parent: usize, node: RawNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.push(index);
        }
        index
    }

    pub fn add_mesh(&mut self, mesh: RawMesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_material(&mut self, material: RawMaterial) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }
}

impl RawNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            children: Vec::new(),
            meshes: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Matrix4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_meshes(mut self, meshes: impl IntoIterator<Item = usize>) -> Self {
        self.meshes.extend(meshes);
        self
    }
}

impl RawMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_triangulated(&self) -> bool {
        self.faces.iter().all(|face| face.len() == 3)
    }
}

impl RawMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, slot: TextureSlot, reference: impl Into<String>) -> Self {
        self.textures.insert(slot, reference.into());
        self
    }
}

impl SourceScene for RawScene {
    type Node = RawNode;
    type Mesh = RawMesh;
    type Material = RawMaterial;

    fn root(&self) -> usize {
        self.root
    }

    fn nodes(&self) -> &[RawNode] {
        &self.nodes
    }

    fn meshes(&self) -> &[RawMesh] {
        &self.meshes
    }

    fn materials(&self) -> &[RawMaterial] {
        &self.materials
    }
}

impl SourceNode for RawNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> Matrix4 {
        self.transform
    }

    fn children(&self) -> &[usize] {
        &self.children
    }

    fn meshes(&self) -> &[usize] {
        &self.meshes
    }
}

impl SourceMesh for RawMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    fn tangents(&self) -> Option<&[[f32; 3]]> {
        self.tangents.as_deref()
    }

    fn bitangents(&self) -> Option<&[[f32; 3]]> {
        self.bitangents.as_deref()
    }

    fn uv_set_count(&self) -> usize {
        self.uv_sets.len()
    }

    fn uv_set(&self, set: usize) -> Option<&[[f32; 2]]> {
        self.uv_sets.get(set).map(Vec::as_slice)
    }

    fn faces(&self) -> &[Vec<u32>] {
        &self.faces
    }

    fn material_index(&self) -> Option<usize> {
        self.material
    }

    fn bones(&self) -> &[RawBone] {
        &self.bones
    }
}

impl SourceMaterial for RawMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn texture(&self, slot: TextureSlot) -> Option<&str> {
        self.textures.get(&slot).map(String::as_str)
    }

    fn scalar(&self, property: ScalarProperty) -> Option<f32> {
        self.scalars.get(&property).copied()
    }

    fn color(&self, property: ColorProperty) -> Option<[f32; 3]> {
        self.colors.get(&property).copied()
    }
}
