//! 网格翻译器
//!
//! 把一个源网格转换成一个规范化网格，执行顶点级服务
//! （DuplicateVertex、BoundingBox）并整理骨骼权重。
//! 没有顶点或没有有效三角形的网格会被丢弃，导入继续。

use std::collections::HashMap;

use super::report::{ImportReport, ImportWarning};
use super::services::ServiceFlags;
use crate::core::math::Matrix4;
use crate::geometry::{Aabb, BoneWeight, Mesh, Vertex, VertexFormat};
use crate::scene::{Bone, BoneId, MaterialId, MeshId, SceneBatch};
use crate::source::{SourceMesh, SourceScene};

pub(crate) struct MeshTranslator<'a> {
    services: ServiceFlags,
    material_ids: &'a [MaterialId],

    /// 本次导入中已登记的骨骼（按名称去重）
    bone_ids: HashMap<String, BoneId>,
}

impl<'a> MeshTranslator<'a> {
    pub fn new(services: ServiceFlags, material_ids: &'a [MaterialId]) -> Self {
        Self {
            services,
            material_ids,
            bone_ids: HashMap::new(),
        }
    }

    /// 翻译全部网格，返回源下标到网格 ID 的映射（被丢弃的网格为 `None`）
    pub fn translate_all<S: SourceScene>(
        &mut self,
        scene: &S,
        batch: &mut SceneBatch,
        report: &mut ImportReport,
    ) -> Vec<Option<MeshId>> {
        scene
            .meshes()
            .iter()
            .map(|source| {
                let mesh = self.translate(source, batch, report)?;
                let id = mesh.id;
                batch.meshes.push(mesh);
                Some(id)
            })
            .collect()
    }

    fn translate<M: SourceMesh>(
        &mut self,
        source: &M,
        batch: &mut SceneBatch,
        report: &mut ImportReport,
    ) -> Option<Mesh> {
        let name = source.name().to_string();
        let positions = source.positions();
        let vertex_count = positions.len();

        if vertex_count == 0 {
            report.warn(ImportWarning::DroppedMesh {
                mesh: name,
                reason: "no vertices".to_string(),
            });
            return None;
        }

        let triangles: Vec<[u32; 3]> = source
            .faces()
            .iter()
            .filter(|face| face.len() == 3 && face.iter().all(|&i| (i as usize) < vertex_count))
            .map(|face| [face[0], face[1], face[2]])
            .collect();

        let skipped = source.faces().len() - triangles.len();
        if skipped > 0 {
            report.warn(ImportWarning::SkippedFaces {
                mesh: name.clone(),
                count: skipped,
            });
        }
        if triangles.is_empty() {
            report.warn(ImportWarning::DroppedMesh {
                mesh: name,
                reason: "no valid triangles".to_string(),
            });
            return None;
        }

        // 长度不匹配的通道视为缺失
        let normals = channel(source.normals(), vertex_count);
        let tangents = channel(source.tangents(), vertex_count);
        let bitangents = channel(source.bitangents(), vertex_count);
        let uv_sets: Vec<&[[f32; 2]]> = (0..source.uv_set_count())
            .filter_map(|set| source.uv_set(set))
            .filter(|uvs| uvs.len() == vertex_count)
            .collect();

        let influences = collect_influences(source);

        let mut format = VertexFormat::POSITION;
        format.set(VertexFormat::NORMAL, normals.is_some());
        format.set(VertexFormat::TEXCOORD, !uv_sets.is_empty());
        format.set(VertexFormat::TANGENT, tangents.is_some());
        format.set(VertexFormat::BITANGENT, bitangents.is_some());
        format.set(VertexFormat::BONE_WEIGHTS, influences.is_some());

        // 缺失的通道以零填充
        let build_vertex = |i: usize| Vertex {
            position: positions[i],
            normal: normals.map_or([0.0; 3], |n| n[i]),
            texcoord: uv_sets.first().map_or([0.0; 2], |uvs| uvs[i]),
            tangent: tangents.map_or([0.0; 3], |t| t[i]),
            bitangent: bitangents.map_or([0.0; 3], |b| b[i]),
        };

        // 输出顶点 -> 源顶点
        let source_of_vertex: Vec<usize>;
        let mut mesh = Mesh::new(batch.next_mesh_id(), name);
        if self.services.contains(ServiceFlags::DUPLICATE_VERTEX) {
            source_of_vertex = triangles.iter().flatten().map(|&i| i as usize).collect();
            mesh.indices = (0..source_of_vertex.len() as u32).collect();
        } else {
            source_of_vertex = (0..vertex_count).collect();
            mesh.indices = triangles.iter().flatten().copied().collect();
        }

        mesh.vertices = source_of_vertex.iter().map(|&i| build_vertex(i)).collect();
        mesh.extra_uv_sets = uv_sets
            .iter()
            .skip(1)
            .map(|uvs| source_of_vertex.iter().map(|&i| uvs[i]).collect())
            .collect();
        mesh.format = format;

        if self.services.contains(ServiceFlags::BOUNDING_BOX) {
            mesh.aabb = Aabb::from_points(mesh.vertices.iter().map(|v| &v.position));
        }

        if let Some(index) = source.material_index() {
            match self.material_ids.get(index) {
                Some(&material) => mesh.material = Some(material),
                None => report.warn(ImportWarning::InvalidMaterialReference {
                    mesh: mesh.name.clone(),
                    material: index,
                }),
            }
        }

        if self.services.contains(ServiceFlags::TANGENT_SPACE) && !mesh.has_tangents() {
            report.warn(ImportWarning::MissingTangents {
                mesh: mesh.name.clone(),
            });
        }

        if let Err(reason) = mesh.validate() {
            report.warn(ImportWarning::DroppedMesh {
                mesh: mesh.name,
                reason,
            });
            return None;
        }

        // 网格确定保留后才登记骨骼
        if let Some(influences) = influences {
            let bone_ids: Vec<BoneId> = source
                .bones()
                .iter()
                .map(|raw| self.register_bone(&raw.name, raw.offset, batch))
                .collect();
            mesh.influences = source_of_vertex
                .iter()
                .map(|&i| {
                    influences[i]
                        .iter()
                        .map(|&(bone, weight)| BoneWeight {
                            bone: bone_ids[bone],
                            weight,
                        })
                        .collect()
                })
                .collect();
        }

        crate::import_debug!(
            mesh = %mesh.name,
            id = %mesh.id,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "Translated mesh"
        );
        Some(mesh)
    }

    fn register_bone(
        &mut self,
        name: &str,
        offset: Matrix4,
        batch: &mut SceneBatch,
    ) -> BoneId {
        if let Some(&id) = self.bone_ids.get(name) {
            return id;
        }
        let id = batch.next_bone_id();
        batch.bones.push(Bone {
            id,
            name: name.to_string(),
            offset,
            node: None,
        });
        self.bone_ids.insert(name.to_string(), id);
        id
    }
}

/// 按源顶点收集 (源骨骼下标, 权重)
///
/// 非正数和非有限值的权重被丢弃，其余权重归一化到和为 1。
/// 没有任何有效权重时返回 `None`。
fn collect_influences<M: SourceMesh>(source: &M) -> Option<Vec<Vec<(usize, f32)>>> {
    let vertex_count = source.positions().len();
    let mut influences: Vec<Vec<(usize, f32)>> = vec![Vec::new(); vertex_count];
    let mut any = false;

    for (bone, raw) in source.bones().iter().enumerate() {
        for &(vertex, weight) in &raw.weights {
            if !weight.is_finite() || weight <= 0.0 {
                continue;
            }
            if let Some(list) = influences.get_mut(vertex as usize) {
                list.push((bone, weight));
                any = true;
            }
        }
    }

    if !any {
        return None;
    }

    for list in &mut influences {
        let sum: f32 = list.iter().map(|(_, w)| w).sum();
        if sum > 0.0 {
            list.iter_mut().for_each(|(_, w)| *w /= sum);
        }
    }
    Some(influences)
}

fn channel(data: Option<&[[f32; 3]]>, vertex_count: usize) -> Option<&[[f32; 3]]> {
    data.filter(|d| d.len() == vertex_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneDatabase;
    use crate::source::{RawBone, RawMesh, RawScene};
    use approx::assert_relative_eq;

    fn quad() -> RawMesh {
        let mut mesh = RawMesh::new("Quad");
        mesh.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        mesh.faces = vec![vec![0, 1, 2], vec![0, 2, 3]];
        mesh
    }

    fn translate(mesh: RawMesh, services: ServiceFlags) -> (SceneBatch, ImportReport) {
        let mut scene = RawScene::with_root("Root");
        scene.add_mesh(mesh);
        let database = SceneDatabase::new();
        let mut batch = SceneBatch::for_database(&database);
        let mut report = ImportReport::default();
        MeshTranslator::new(services, &[]).translate_all(&scene, &mut batch, &mut report);
        (batch, report)
    }

    #[test]
    fn test_shared_vertices() {
        let (batch, _) = translate(quad(), ServiceFlags::empty());
        let mesh = &batch.meshes[0];

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(mesh.aabb.is_none());
        assert_eq!(mesh.format, VertexFormat::POSITION);
    }

    #[test]
    fn test_duplicate_vertex() {
        let (batch, _) = translate(quad(), ServiceFlags::DUPLICATE_VERTEX);
        let mesh = &batch.meshes[0];

        assert_eq!(mesh.vertex_count(), 3 * mesh.triangle_count());
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.vertices[3].position, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[5].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_bounding_box() {
        let (batch, _) = translate(quad(), ServiceFlags::BOUNDING_BOX);
        let aabb = batch.meshes[0].aabb.unwrap();

        assert_eq!(aabb.min, [0.0, 0.0, 0.0]);
        assert_eq!(aabb.max, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_polygons_skipped_and_empty_mesh_dropped() {
        let mut mesh = quad();
        mesh.faces = vec![vec![0, 1, 2, 3]];
        let (batch, report) = translate(mesh, ServiceFlags::empty());

        assert!(batch.meshes.is_empty());
        assert!(report.warnings.contains(&ImportWarning::SkippedFaces {
            mesh: "Quad".to_string(),
            count: 1
        }));
        assert!(matches!(report.warnings.last(), Some(ImportWarning::DroppedMesh { .. })));
    }

    #[test]
    fn test_influences_are_normalized_and_bones_deduplicated() {
        let mut mesh = quad();
        mesh.bones = vec![
            RawBone {
                name: "Hip".to_string(),
                offset: Matrix4::identity(),
                weights: vec![(0, 2.0), (1, 1.0), (2, -1.0)],
            },
            RawBone {
                name: "Knee".to_string(),
                offset: Matrix4::identity(),
                weights: vec![(0, 2.0), (3, f32::NAN)],
            },
        ];
        let mut other = quad();
        other.name = "Other".to_string();
        other.bones = vec![RawBone {
            name: "Hip".to_string(),
            offset: Matrix4::identity(),
            weights: vec![(0, 1.0)],
        }];

        let mut scene = RawScene::with_root("Root");
        scene.add_mesh(mesh);
        scene.add_mesh(other);
        let database = SceneDatabase::new();
        let mut batch = SceneBatch::for_database(&database);
        let mut report = ImportReport::default();
        MeshTranslator::new(ServiceFlags::empty(), &[]).translate_all(&scene, &mut batch, &mut report);

        assert_eq!(batch.bones.len(), 2);
        let mesh = &batch.meshes[0];
        assert!(mesh.format.contains(VertexFormat::BONE_WEIGHTS));
        assert_eq!(mesh.influences[0].len(), 2);
        for list in mesh.influences.iter().filter(|l| !l.is_empty()) {
            let sum: f32 = list.iter().map(|w| w.weight).sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
        }
        assert!(mesh.influences[2].is_empty());
        assert!(mesh.influences[3].is_empty());
        assert_eq!(batch.meshes[1].influences[0][0].bone, BoneId(0));
    }

    #[test]
    fn test_dropped_mesh_registers_no_bones() {
        let mut mesh = quad();
        mesh.faces = vec![vec![0, 1]];
        mesh.bones = vec![RawBone {
            name: "Hip".to_string(),
            offset: Matrix4::identity(),
            weights: vec![(0, 1.0)],
        }];
        let (batch, _) = translate(mesh, ServiceFlags::empty());

        assert!(batch.meshes.is_empty());
        assert!(batch.bones.is_empty());
    }

    #[test]
    fn test_missing_tangents_and_material_reference() {
        let mut mesh = quad();
        mesh.material = Some(4);
        let (batch, report) = translate(mesh, ServiceFlags::TANGENT_SPACE);

        assert_eq!(batch.meshes[0].material, None);
        assert_eq!(report.warnings.len(), 2);
    }
}
