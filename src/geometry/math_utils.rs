//! 几何数学工具模块
//!
//! 提供解析阶段后处理用到的数学函数，包括：
//! - 法线重建（从三角形面计算顶点法线）
//! - 切线空间计算（用于法线贴图）
//! - 多边形的扇形三角化
//!
//! 这些函数直接作用于原始通道数组（位置、法线、UV、面），
//! 由 `loaders::postprocess` 按导入标志调用。

/// 将一个多边形扇形三角化
///
/// 以第一个顶点为扇心，`n` 边形产生 `n - 2` 个三角形。
/// 少于3个顶点的面（点、线）不产生三角形。
pub fn triangulate_fan(face: &[u32]) -> Vec<[u32; 3]> {
    if face.len() < 3 {
        return Vec::new();
    }
    (1..face.len() - 1)
        .map(|i| [face[0], face[i], face[i + 1]])
        .collect()
}

/// 从三角形面重建顶点法线
///
/// 遍历所有三角形，计算每个面的法线（未归一化，因此按面积加权），
/// 将面法线累加到该面的三个顶点，最后归一化所有顶点的法线向量。
///
/// 非三角形的面会被忽略，越界的索引也会被忽略。
///
/// # 示例
///
/// ```rust
/// use dist_scene::geometry::math_utils::reconstruct_normals;
///
/// let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
/// let faces = vec![vec![0, 1, 2]];
///
/// let normals = reconstruct_normals(&positions, &faces);
/// assert_eq!(normals[0], [0.0, 0.0, 1.0]);
/// ```
pub fn reconstruct_normals(positions: &[[f32; 3]], faces: &[Vec<u32>]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];

    for face in faces.iter().filter(|f| f.len() == 3) {
        let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }

        let edge1 = sub(positions[i1], positions[i0]);
        let edge2 = sub(positions[i2], positions[i0]);
        let face_normal = cross(edge1, edge2);

        for &i in &[i0, i1, i2] {
            normals[i] = add(normals[i], face_normal);
        }
    }

    normals.into_iter().map(normalize).collect()
}

/// 计算顶点的切线和副切线
///
/// 使用UV坐标导数计算每个顶点的切线向量，
/// 切线指向U增加的方向，副切线指向V增加的方向。
///
/// # 算法
///
/// 1. 对于每个三角形:
///    - 位置导数 dp1, dp2，UV导数 duv1, duv2
///    - r = 1 / (duv1.x * duv2.y - duv1.y * duv2.x)，行列式接近零的三角形跳过
///    - tangent = (dp1 * duv2.y - dp2 * duv1.y) * r
///    - bitangent = (dp2 * duv1.x - dp1 * duv2.x) * r
///    - 累加到三个顶点
///
/// 2. Gram-Schmidt 正交化切线：tangent = normalize(t - n * dot(n, t))，
///    副切线只做归一化。
///
/// # 前置条件
///
/// `normals` 与 `uvs` 的长度必须等于 `positions` 的长度。
pub fn compute_tangent_space(
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: &[[f32; 2]],
    faces: &[Vec<u32>],
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let count = positions.len();
    let mut tangents = vec![[0.0f32; 3]; count];
    let mut bitangents = vec![[0.0f32; 3]; count];

    for face in faces.iter().filter(|f| f.len() == 3) {
        let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
        if i0 >= count || i1 >= count || i2 >= count {
            continue;
        }

        let dp1 = sub(positions[i1], positions[i0]);
        let dp2 = sub(positions[i2], positions[i0]);
        let duv1 = [uvs[i1][0] - uvs[i0][0], uvs[i1][1] - uvs[i0][1]];
        let duv2 = [uvs[i2][0] - uvs[i0][0], uvs[i2][1] - uvs[i0][1]];

        let det = duv1[0] * duv2[1] - duv1[1] * duv2[0];

        // 避免除以零
        if det.abs() < 1e-6 {
            continue;
        }
        let r = 1.0 / det;

        let tangent = scale(sub(scale(dp1, duv2[1]), scale(dp2, duv1[1])), r);
        let bitangent = scale(sub(scale(dp2, duv1[0]), scale(dp1, duv2[0])), r);

        for &i in &[i0, i1, i2] {
            tangents[i] = add(tangents[i], tangent);
            bitangents[i] = add(bitangents[i], bitangent);
        }
    }

    for i in 0..count {
        let n = normals[i];
        let t = tangents[i];
        tangents[i] = normalize(sub(t, scale(n, dot(n, t))));
        bitangents[i] = normalize(bitangents[i]);
    }

    (tangents, bitangents)
}

// ============================================================================
// 辅助函数
// ============================================================================

#[inline]
fn add(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn scale(a: [f32; 3], s: f32) -> [f32; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

/// 两个3D向量的叉乘
#[inline]
fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// 归一化3D向量，长度为零时返回零向量
#[inline]
fn normalize(v: [f32; 3]) -> [f32; 3] {
    let length = dot(v, v).sqrt();

    if length < 1e-6 {
        [0.0, 0.0, 0.0]
    } else {
        scale(v, 1.0 / length)
    }
}

// ============================================================================
// 测试
// ============================================================================
