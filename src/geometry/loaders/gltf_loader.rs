/// glTF 2.0 解析器
///
/// 使用 gltf crate 读取 `.gltf` / `.glb` 文件。
///
/// - 每个图元（primitive）对应一个 `RawMesh`
/// - glTF 节点与 `RawNode` 一一对应，另外合成一个以文件名命名的根节点，
///   默认场景的顶层节点挂在它下面
/// - 蒙皮网格的骨骼取自第一个引用该网格的节点的 skin
/// - 嵌入的图片记作 `*N`（N 为图片下标）
/// - UV 的 V 坐标读取时翻转为左下角原点，与 OBJ 一致
use super::{file_stem, postprocess, ImportFlags, SceneParser};
use crate::core::error::ParseError;
use crate::core::math::{matrix_from_columns, Matrix4};
use crate::scene::TextureSlot;
use crate::source::{
    ColorProperty, RawBone, RawMaterial, RawMesh, RawNode, RawScene, ScalarProperty,
};
use gltf::mesh::Mode;
use std::collections::HashMap;
use std::path::Path;

/// glTF 格式解析器
pub struct GltfParser;

impl SceneParser for GltfParser {
    fn parse(&self, path: &Path, flags: ImportFlags) -> Result<RawScene, ParseError> {
        if !path.exists() {
            return Err(ParseError::External(format!("file not found: {}", path.display())));
        }

        let gltf::Gltf { document, blob } = gltf::Gltf::open(path)
            .map_err(|e| ParseError::External(format!("gltf 解析失败: {}", e)))?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)
            .map_err(|e| ParseError::External(format!("gltf 缓冲区加载失败: {}", e)))?;

        let Some(gltf_scene) = document.default_scene().or_else(|| document.scenes().next()) else {
            return Err(ParseError::Empty);
        };

        let mut scene = RawScene::with_root(file_stem(path));

        for material in document.materials() {
            scene.add_material(convert_material(&material));
        }

        // 每个网格第一次被引用时使用的 skin
        let mut mesh_skins: HashMap<usize, gltf::Skin> = HashMap::new();
        for node in document.nodes() {
            if let (Some(mesh), Some(skin)) = (node.mesh(), node.skin()) {
                mesh_skins.entry(mesh.index()).or_insert(skin);
            }
        }

        // glTF 网格下标 -> RawMesh 下标列表
        let mut mesh_map: Vec<Vec<usize>> = Vec::with_capacity(document.meshes().len());
        for mesh in document.meshes() {
            let skin = mesh_skins.get(&mesh.index());
            let primitive_count = mesh.primitives().len();
            let base_name = mesh
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh_{}", mesh.index()));

            let mut indices = Vec::with_capacity(primitive_count);
            for primitive in mesh.primitives() {
                let name = if primitive_count > 1 {
                    format!("{}_{}", base_name, primitive.index())
                } else {
                    base_name.clone()
                };
                let raw = convert_primitive(name, &primitive, skin, &buffers)?;
                indices.push(scene.add_mesh(raw));
            }
            mesh_map.push(indices);
        }

        // glTF 节点 i 对应 RawNode i + 1
        const NODE_OFFSET: usize = 1;
        for node in document.nodes() {
            let name = node
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("node_{}", node.index()));
            let mut raw = RawNode::new(name)
                .with_transform(matrix_from_columns(node.transform().matrix()));
            raw.children = node.children().map(|c| c.index() + NODE_OFFSET).collect();
            if let Some(mesh) = node.mesh() {
                raw.meshes = mesh_map.get(mesh.index()).cloned().unwrap_or_default();
            }
            scene.nodes.push(raw);
        }
        let root = scene.root;
        scene.nodes[root].children = gltf_scene.nodes().map(|n| n.index() + NODE_OFFSET).collect();

        postprocess::apply(&mut scene, flags)?;

        tracing::info!(
            "成功解析 glTF 文件: {} 个节点, {} 个网格, {} 个材质",
            scene.nodes.len(),
            scene.meshes.len(),
            scene.materials.len()
        );

        Ok(scene)
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["gltf", "glb"]
    }
}

fn convert_primitive(
    name: String,
    primitive: &gltf::Primitive,
    skin: Option<&gltf::Skin>,
    buffers: &[gltf::buffer::Data],
) -> Result<RawMesh, ParseError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let mut mesh = RawMesh::new(name);
    mesh.material = primitive.material().index();

    let Some(positions) = reader.read_positions() else {
        return Err(ParseError::External(format!("图元 '{}' 缺少 POSITION 属性", mesh.name)));
    };
    mesh.positions = positions.collect();

    mesh.normals = reader.read_normals().map(Iterator::collect);

    // glTF 切线是 vec4，w 分量给出副切线的方向；
    // 下面 V 坐标被翻转，副切线随之取反
    if let (Some(tangents), Some(normals)) = (reader.read_tangents(), mesh.normals.as_ref()) {
        let tangents: Vec<[f32; 4]> = tangents.collect();
        let bitangents = tangents
            .iter()
            .zip(normals)
            .map(|(t, n)| {
                let b = [
                    n[1] * t[2] - n[2] * t[1],
                    n[2] * t[0] - n[0] * t[2],
                    n[0] * t[1] - n[1] * t[0],
                ];
                [-b[0] * t[3], -b[1] * t[3], -b[2] * t[3]]
            })
            .collect();
        mesh.tangents = Some(tangents.iter().map(|t| [t[0], t[1], t[2]]).collect());
        mesh.bitangents = Some(bitangents);
    }

    // glTF 的 UV 原点在左上角，这里转换为与 OBJ 一致的左下角原点
    let mut set = 0;
    while let Some(uvs) = reader.read_tex_coords(set) {
        mesh.uv_sets.push(uvs.into_f32().map(|[u, v]| [u, 1.0 - v]).collect());
        set += 1;
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..mesh.positions.len() as u32).collect(),
    };
    mesh.faces = assemble_faces(primitive.mode(), &indices);

    if let (Some(skin), Some(joints), Some(weights)) =
        (skin, reader.read_joints(0), reader.read_weights(0))
    {
        mesh.bones = read_bones(skin, joints.into_u16(), weights.into_f32(), buffers);
    }

    Ok(mesh)
}

/// 按图元模式把索引流组装成面
fn assemble_faces(mode: Mode, indices: &[u32]) -> Vec<Vec<u32>> {
    match mode {
        Mode::Triangles => indices.chunks_exact(3).map(<[u32]>::to_vec).collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    vec![w[0], w[1], w[2]]
                } else {
                    vec![w[1], w[0], w[2]]
                }
            })
            .collect(),
        Mode::TriangleFan => indices
            .get(1..)
            .unwrap_or_default()
            .windows(2)
            .map(|w| vec![indices[0], w[0], w[1]])
            .collect(),
        Mode::Lines => indices.chunks_exact(2).map(<[u32]>::to_vec).collect(),
        Mode::LineStrip => indices.windows(2).map(<[u32]>::to_vec).collect(),
        Mode::LineLoop => {
            let mut faces: Vec<Vec<u32>> = indices.windows(2).map(<[u32]>::to_vec).collect();
            if let (Some(&first), Some(&last)) = (indices.first(), indices.last()) {
                if indices.len() > 2 {
                    faces.push(vec![last, first]);
                }
            }
            faces
        }
        Mode::Points => indices.iter().map(|&i| vec![i]).collect(),
    }
}

fn read_bones(
    skin: &gltf::Skin,
    joints: impl Iterator<Item = [u16; 4]>,
    weights: impl Iterator<Item = [f32; 4]>,
    buffers: &[gltf::buffer::Data],
) -> Vec<RawBone> {
    let reader = skin.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
    let inverse_binds: Vec<[[f32; 4]; 4]> = reader
        .read_inverse_bind_matrices()
        .map(Iterator::collect)
        .unwrap_or_default();

    let mut bones: Vec<RawBone> = skin
        .joints()
        .enumerate()
        .map(|(i, joint)| RawBone {
            name: joint
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("node_{}", joint.index())),
            offset: inverse_binds
                .get(i)
                .copied()
                .map(matrix_from_columns)
                .unwrap_or_else(Matrix4::identity),
            weights: Vec::new(),
        })
        .collect();

    for (vertex, (joint, weight)) in joints.zip(weights).enumerate() {
        for (j, w) in joint.iter().zip(weight.iter()) {
            if *w > 0.0 {
                if let Some(bone) = bones.get_mut(*j as usize) {
                    bone.weights.push((vertex as u32, *w));
                }
            }
        }
    }

    // 不影响任何顶点的骨骼不输出
    bones.retain(|bone| !bone.weights.is_empty());
    bones
}

fn convert_material(material: &gltf::Material) -> RawMaterial {
    let name = material
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or_default()));
    let mut raw = RawMaterial::new(name);

    let pbr = material.pbr_metallic_roughness();
    let base = pbr.base_color_factor();
    raw.colors.insert(ColorProperty::Diffuse, [base[0], base[1], base[2]]);
    raw.colors.insert(ColorProperty::Emissive, material.emissive_factor());
    raw.scalars.insert(ScalarProperty::Opacity, base[3]);
    raw.scalars.insert(ScalarProperty::Metallic, pbr.metallic_factor());
    raw.scalars.insert(ScalarProperty::Roughness, pbr.roughness_factor());

    let textures = [
        (TextureSlot::Diffuse, pbr.base_color_texture().map(|info| info.texture())),
        (TextureSlot::Normal, material.normal_texture().map(|t| t.texture())),
        (TextureSlot::Occlusion, material.occlusion_texture().map(|t| t.texture())),
        (TextureSlot::Emissive, material.emissive_texture().map(|info| info.texture())),
        (
            TextureSlot::Roughness,
            pbr.metallic_roughness_texture().map(|info| info.texture()),
        ),
    ];
    for (slot, texture) in textures {
        if let Some(texture) = texture {
            raw.textures.insert(slot, texture_reference(&texture.source()));
        }
    }
    // 金属度和粗糙度共用一张贴图
    if let Some(reference) = raw.textures.get(&TextureSlot::Roughness).cloned() {
        raw.textures.insert(TextureSlot::Metallic, reference);
    }

    raw
}

/// 外部图片返回 URI，嵌入的图片返回 `*N`
fn texture_reference(image: &gltf::Image) -> String {
    match image.source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => uri.to_string(),
        _ => format!("*{}", image.index()),
    }
}
