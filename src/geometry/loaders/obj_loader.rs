/// OBJ 文件解析器
///
/// 使用 tobj crate 解析 Wavefront OBJ 格式的3D模型及其 MTL 材质库。
/// 文件本身只描述一组扁平的对象，因此解析出的场景图是一个以文件名命名的根节点，
/// 每个对象对应根节点下的一个子节点。
use super::{file_stem, postprocess, ImportFlags, SceneParser};
use crate::core::error::ParseError;
use crate::scene::TextureSlot;
use crate::source::{ColorProperty, RawMaterial, RawMesh, RawNode, RawScene, ScalarProperty};
use std::path::Path;

/// OBJ 格式解析器
///
/// # 特性
///
/// - 使用 tobj crate 解析 OBJ 文件，单一索引
/// - 保留原始多边形，三角化交给 `TRIANGULATE` 标志
/// - MTL 中的漫反射、法线、高光、环境光、透明度和自发光贴图
/// - PBR 扩展参数 `Pr` / `Pm`
///
/// MTL 文件缺失或损坏时只记录警告，场景照常输出（没有材质）。
pub struct ObjParser;

impl SceneParser for ObjParser {
    fn parse(&self, path: &Path, flags: ImportFlags) -> Result<RawScene, ParseError> {
        // 检查文件是否存在
        if !path.exists() {
            return Err(ParseError::External(format!("file not found: {}", path.display())));
        }

        let load_options = tobj::LoadOptions {
            triangulate: false,
            single_index: true,
            ..Default::default()
        };

        let (models, materials) = tobj::load_obj(path, &load_options)
            .map_err(|e| ParseError::External(format!("tobj 解析失败: {}", e)))?;

        let materials = materials.unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load MTL library, importing without materials");
            Vec::new()
        });

        let mut scene = RawScene::with_root(file_stem(path));

        for material in &materials {
            scene.add_material(convert_material(material));
        }

        // 遍历所有模型（OBJ 可能包含多个对象）
        for model in &models {
            let mesh = convert_mesh(model)?;
            let mesh_index = scene.add_mesh(mesh);
            scene.add_node(scene.root, RawNode::new(model.name.clone()).with_meshes([mesh_index]));
        }

        postprocess::apply(&mut scene, flags)?;

        tracing::info!(
            "成功解析 OBJ 文件: {} 个对象, {} 个材质",
            scene.meshes.len(),
            scene.materials.len()
        );

        Ok(scene)
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["obj"]
    }
}

fn convert_mesh(model: &tobj::Model) -> Result<RawMesh, ParseError> {
    let mesh = &model.mesh;

    if mesh.positions.len() % 3 != 0 {
        return Err(ParseError::External(format!(
            "顶点位置数据不完整: {} 个浮点数",
            mesh.positions.len()
        )));
    }

    let mut raw = RawMesh::new(model.name.clone());
    raw.positions = triples(&mesh.positions);
    raw.material = mesh.material_id;

    let vertex_count = raw.positions.len();
    if !mesh.normals.is_empty() && mesh.normals.len() == vertex_count * 3 {
        raw.normals = Some(triples(&mesh.normals));
    }
    if !mesh.texcoords.is_empty() && mesh.texcoords.len() == vertex_count * 2 {
        raw.uv_sets.push(mesh.texcoords.chunks_exact(2).map(|c| [c[0], c[1]]).collect());
    }

    // tobj 只在存在非三角形面时填充 face_arities
    if mesh.face_arities.is_empty() {
        raw.faces = mesh.indices.chunks_exact(3).map(<[u32]>::to_vec).collect();
    } else {
        let mut start = 0usize;
        for &arity in &mesh.face_arities {
            let end = start + arity as usize;
            let Some(face) = mesh.indices.get(start..end) else {
                return Err(ParseError::External(format!(
                    "对象 '{}' 的面索引数据不完整",
                    model.name
                )));
            };
            raw.faces.push(face.to_vec());
            start = end;
        }
    }

    Ok(raw)
}

fn convert_material(material: &tobj::Material) -> RawMaterial {
    let mut raw = RawMaterial::new(material.name.clone());

    let textures = [
        (TextureSlot::Diffuse, material.diffuse_texture.as_deref()),
        (TextureSlot::Normal, material.normal_texture.as_deref()),
        (TextureSlot::Specular, material.specular_texture.as_deref()),
        (TextureSlot::Ambient, material.ambient_texture.as_deref()),
        (TextureSlot::Opacity, material.dissolve_texture.as_deref()),
        (TextureSlot::Emissive, param(material, "map_Ke")),
        (TextureSlot::Roughness, param(material, "map_Pr")),
        (TextureSlot::Metallic, param(material, "map_Pm")),
    ];
    for (slot, reference) in textures {
        if let Some(reference) = reference.filter(|r| !r.is_empty()) {
            raw.textures.insert(slot, reference.to_string());
        }
    }
    // PBR 扩展写法的法线贴图
    if !raw.textures.contains_key(&TextureSlot::Normal) {
        if let Some(reference) = param(material, "norm") {
            raw.textures.insert(TextureSlot::Normal, reference.to_string());
        }
    }

    let colors = [
        (ColorProperty::Diffuse, material.diffuse),
        (ColorProperty::Specular, material.specular),
        (ColorProperty::Ambient, material.ambient),
        (ColorProperty::Emissive, param(material, "Ke").and_then(parse_color)),
    ];
    for (property, value) in colors {
        if let Some(value) = value {
            raw.colors.insert(property, value);
        }
    }

    let scalars = [
        (ScalarProperty::Opacity, material.dissolve),
        (ScalarProperty::Shininess, material.shininess),
        (ScalarProperty::Roughness, param(material, "Pr").and_then(|v| v.trim().parse().ok())),
        (ScalarProperty::Metallic, param(material, "Pm").and_then(|v| v.trim().parse().ok())),
    ];
    for (property, value) in scalars {
        if let Some(value) = value {
            raw.scalars.insert(property, value);
        }
    }

    raw
}

fn param<'a>(material: &'a tobj::Material, key: &str) -> Option<&'a str> {
    material.unknown_param.get(key).map(String::as_str)
}

fn parse_color(value: &str) -> Option<[f32; 3]> {
    let mut parts = value.split_whitespace().map(|p| p.parse::<f32>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(r)), Some(Ok(g)), Some(Ok(b))) => Some([r, g, b]),
        _ => None,
    }
}

fn triples(values: &[f32]) -> Vec<[f32; 3]> {
    values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}
