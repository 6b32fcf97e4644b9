//! 解析阶段的后处理
//!
//! 解析器读出 `RawScene` 后，按导入标志依次执行：
//!
//! 1. VALIDATE_DATA
//! 2. TRIANGULATE
//! 3. REMOVE_UNUSED
//! 4. GEN_NORMALS
//! 5. CALC_TANGENT_SPACE
//! 6. LIMIT_BONE_WEIGHTS
//! 7. MAKE_LEFT_HANDED / FLIP_UVS / FLIP_WINDING_ORDER

use std::collections::HashSet;

use super::flags::{ImportFlags, MAX_BONE_WEIGHTS};
use crate::core::error::ParseError;
use crate::core::math::mirror_z;
use crate::geometry::math_utils::{compute_tangent_space, reconstruct_normals, triangulate_fan};
use crate::source::{RawMesh, RawScene};

/// 按标志执行全部后处理步骤
pub fn apply(scene: &mut RawScene, flags: ImportFlags) -> Result<(), ParseError> {
    if flags.contains(ImportFlags::VALIDATE_DATA) {
        validate(scene)?;
    }
    if flags.contains(ImportFlags::TRIANGULATE) {
        scene.meshes.iter_mut().for_each(triangulate);
    }
    if flags.contains(ImportFlags::REMOVE_UNUSED) {
        remove_unused(scene);
    }
    if flags.contains(ImportFlags::GEN_NORMALS) {
        scene.meshes.iter_mut().for_each(generate_normals);
    }
    if flags.contains(ImportFlags::CALC_TANGENT_SPACE) {
        scene.meshes.iter_mut().for_each(generate_tangents);
    }
    if flags.contains(ImportFlags::LIMIT_BONE_WEIGHTS) {
        scene.meshes.iter_mut().for_each(limit_bone_weights);
    }
    if flags.contains(ImportFlags::MAKE_LEFT_HANDED) {
        make_left_handed(scene);
    }
    if flags.contains(ImportFlags::FLIP_UVS) {
        scene.meshes.iter_mut().for_each(flip_uvs);
    }
    if flags.contains(ImportFlags::FLIP_WINDING_ORDER) {
        for mesh in &mut scene.meshes {
            mesh.faces.iter_mut().for_each(|face| face.reverse());
        }
    }
    Ok(())
}

/// 检查层级引用，清理越界的几何数据
///
/// 层级引用（根节点、子节点、网格）越界是致命错误；
/// 面、材质、骨骼权重中的越界引用会被丢弃。
pub fn validate(scene: &mut RawScene) -> Result<(), ParseError> {
    if scene.root >= scene.nodes.len() {
        return Err(ParseError::InvalidReference(format!(
            "root node {} out of {} nodes",
            scene.root,
            scene.nodes.len()
        )));
    }

    let node_count = scene.nodes.len();
    let mesh_count = scene.meshes.len();
    for node in &scene.nodes {
        if let Some(child) = node.children.iter().find(|&&c| c >= node_count) {
            return Err(ParseError::InvalidReference(format!(
                "node '{}' has child {} out of {} nodes",
                node.name, child, node_count
            )));
        }
        if let Some(mesh) = node.meshes.iter().find(|&&m| m >= mesh_count) {
            return Err(ParseError::InvalidReference(format!(
                "node '{}' references mesh {} out of {} meshes",
                node.name, mesh, mesh_count
            )));
        }
    }

    let material_count = scene.materials.len();
    for mesh in &mut scene.meshes {
        let vertex_count = mesh.positions.len();

        let before = mesh.faces.len();
        mesh.faces
            .retain(|face| face.iter().all(|&i| (i as usize) < vertex_count));
        if mesh.faces.len() != before {
            tracing::warn!(
                mesh = %mesh.name,
                dropped = before - mesh.faces.len(),
                "丢弃索引越界的面"
            );
        }

        for channel in [&mut mesh.normals, &mut mesh.tangents, &mut mesh.bitangents] {
            if channel.as_ref().is_some_and(|c| c.len() != vertex_count) {
                tracing::warn!(mesh = %mesh.name, "顶点通道长度与位置数不一致，已忽略");
                *channel = None;
            }
        }
        mesh.uv_sets.retain(|uvs| uvs.len() == vertex_count);

        if mesh.material.is_some_and(|m| m >= material_count) {
            tracing::warn!(mesh = %mesh.name, material = ?mesh.material, "材质引用越界，已清除");
            mesh.material = None;
        }

        for bone in &mut mesh.bones {
            bone.weights.retain(|(v, w)| (*v as usize) < vertex_count && w.is_finite());
        }
    }

    Ok(())
}

/// 扇形三角化多边形，丢弃点和线
pub fn triangulate(mesh: &mut RawMesh) {
    if mesh.is_triangulated() {
        return;
    }
    mesh.faces = mesh
        .faces
        .iter()
        .flat_map(|face| triangulate_fan(face))
        .map(|tri| tri.to_vec())
        .collect();
}

/// 删除未被引用的节点、网格和材质，并重映射下标
///
/// 空叶子节点（没有网格、没有保留的子节点）会被删除；根节点始终保留。
/// 从根节点不可达的节点也视为未使用。
pub fn remove_unused(scene: &mut RawScene) {
    let node_count = scene.nodes.len();
    if scene.root >= node_count {
        return;
    }

    // 前序遍历得到可达节点，逆序处理即可保证子节点先于父节点
    let mut order = Vec::with_capacity(node_count);
    let mut visited = HashSet::new();
    let mut stack = vec![scene.root];
    while let Some(index) = stack.pop() {
        if index >= node_count || !visited.insert(index) {
            continue;
        }
        order.push(index);
        stack.extend(scene.nodes[index].children.iter().rev());
    }

    let mut keep = vec![false; node_count];
    for &index in order.iter().rev() {
        let node = &scene.nodes[index];
        keep[index] = index == scene.root
            || !node.meshes.is_empty()
            || node.children.iter().any(|&c| c < node_count && keep[c]);
    }

    // 保持原有的数组顺序
    let node_remap = build_remap(&keep);
    let removed_nodes = node_count - node_remap.iter().flatten().count();
    let mut nodes = Vec::with_capacity(node_count - removed_nodes);
    for (index, node) in std::mem::take(&mut scene.nodes).into_iter().enumerate() {
        if keep[index] {
            nodes.push(node);
        }
    }
    for node in &mut nodes {
        node.children = node.children.iter().filter_map(|&c| node_remap.get(c).copied().flatten()).collect();
    }
    scene.root = node_remap[scene.root].unwrap_or_default();
    scene.nodes = nodes;

    // 网格
    let mut used_meshes = vec![false; scene.meshes.len()];
    for node in &scene.nodes {
        for &mesh in &node.meshes {
            if let Some(used) = used_meshes.get_mut(mesh) {
                *used = true;
            }
        }
    }
    let mesh_remap = build_remap(&used_meshes);
    let removed_meshes = retain_by_mask(&mut scene.meshes, &used_meshes);
    for node in &mut scene.nodes {
        node.meshes = node.meshes.iter().filter_map(|&m| mesh_remap.get(m).copied().flatten()).collect();
    }

    // 材质
    let mut used_materials = vec![false; scene.materials.len()];
    for mesh in &scene.meshes {
        if let Some(used) = mesh.material.and_then(|m| used_materials.get_mut(m)) {
            *used = true;
        }
    }
    let material_remap = build_remap(&used_materials);
    let removed_materials = retain_by_mask(&mut scene.materials, &used_materials);
    for mesh in &mut scene.meshes {
        mesh.material = mesh.material.and_then(|m| material_remap.get(m).copied().flatten());
    }

    if removed_nodes + removed_meshes + removed_materials > 0 {
        tracing::debug!(
            nodes = removed_nodes,
            meshes = removed_meshes,
            materials = removed_materials,
            "Removed unused scene data"
        );
    }
}

fn build_remap(keep: &[bool]) -> Vec<Option<usize>> {
    let mut next = 0;
    keep.iter()
        .map(|&k| {
            if k {
                next += 1;
                Some(next - 1)
            } else {
                None
            }
        })
        .collect()
}

fn retain_by_mask<T>(items: &mut Vec<T>, keep: &[bool]) -> usize {
    let before = items.len();
    let mut index = 0;
    items.retain(|_| {
        index += 1;
        keep[index - 1]
    });
    before - items.len()
}

/// 缺少法线时按面积加权重建
pub fn generate_normals(mesh: &mut RawMesh) {
    if mesh.normals.is_some() || mesh.positions.is_empty() {
        return;
    }
    tracing::debug!(mesh = %mesh.name, "网格缺少法线数据，正在重建");
    mesh.normals = Some(reconstruct_normals(&mesh.positions, &mesh.faces));
}

/// 生成切线空间；缺少法线或 UV 时跳过
pub fn generate_tangents(mesh: &mut RawMesh) {
    if mesh.tangents.is_some() {
        return;
    }
    let count = mesh.positions.len();
    let normals = mesh.normals.as_ref().filter(|n| n.len() == count);
    let uvs = mesh.uv_sets.first().filter(|uv| uv.len() == count);
    let (Some(normals), Some(uvs)) = (normals, uvs) else {
        tracing::debug!(mesh = %mesh.name, "缺少法线或UV坐标，跳过切线空间计算");
        return;
    };
    let (tangents, bitangents) = compute_tangent_space(&mesh.positions, normals, uvs, &mesh.faces);
    mesh.tangents = Some(tangents);
    mesh.bitangents = Some(bitangents);
}

/// 每个顶点只保留权重最大的 `MAX_BONE_WEIGHTS` 个影响，并重新归一化
pub fn limit_bone_weights(mesh: &mut RawMesh) {
    if mesh.bones.is_empty() {
        return;
    }

    // 每个顶点的 (骨骼, 权重)
    let mut per_vertex: Vec<Vec<(usize, f32)>> = vec![Vec::new(); mesh.positions.len()];
    for (bone_index, bone) in mesh.bones.iter().enumerate() {
        for &(vertex, weight) in &bone.weights {
            if let Some(list) = per_vertex.get_mut(vertex as usize) {
                list.push((bone_index, weight));
            }
        }
    }

    if per_vertex.iter().all(|list| list.len() <= MAX_BONE_WEIGHTS) {
        return;
    }

    for bone in &mut mesh.bones {
        bone.weights.clear();
    }
    for (vertex, mut list) in per_vertex.into_iter().enumerate() {
        if list.len() > MAX_BONE_WEIGHTS {
            list.sort_by(|a, b| b.1.total_cmp(&a.1));
            list.truncate(MAX_BONE_WEIGHTS);
            let sum: f32 = list.iter().map(|(_, w)| w).sum();
            if sum > 0.0 {
                list.iter_mut().for_each(|(_, w)| *w /= sum);
            }
        }
        for (bone_index, weight) in list {
            mesh.bones[bone_index].weights.push((vertex as u32, weight));
        }
    }
}

/// 沿 Z 轴镜像几何数据、节点变换和骨骼偏移
pub fn make_left_handed(scene: &mut RawScene) {
    fn flip(v: &mut [f32; 3]) {
        v[2] = -v[2];
    }

    for mesh in &mut scene.meshes {
        mesh.positions.iter_mut().for_each(flip);
        for channel in [&mut mesh.normals, &mut mesh.tangents, &mut mesh.bitangents] {
            if let Some(values) = channel {
                values.iter_mut().for_each(flip);
            }
        }
        for bone in &mut mesh.bones {
            bone.offset = mirror_z(&bone.offset);
        }
    }
    for node in &mut scene.nodes {
        node.transform = mirror_z(&node.transform);
    }
}

/// v = 1 - v；副切线随 V 方向一起反向
pub fn flip_uvs(mesh: &mut RawMesh) {
    for uvs in &mut mesh.uv_sets {
        uvs.iter_mut().for_each(|uv| uv[1] = 1.0 - uv[1]);
    }
    if let Some(bitangents) = &mut mesh.bitangents {
        bitangents
            .iter_mut()
            .for_each(|b| *b = [-b[0], -b[1], -b[2]]);
    }
}
