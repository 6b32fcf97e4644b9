//! 数学库模块
//!
//! 基于 `nalgebra` 的类型别名和导入管线需要的少量矩阵辅助函数。
//! 所有矩阵都是列向量约定：`world = parent_world * local`。

pub use nalgebra::{
    Matrix4 as Mat4, Point3 as Pt3, Vector3 as Vec3,
};

// 类型别名，使用更简洁的名称
pub type Vector3 = Vec3<f32>;
pub type Matrix4 = Mat4<f32>;
pub type Point3 = Pt3<f32>;

/// 数学常量
pub mod constants {
    /// 浮点数比较的 epsilon
    pub const EPSILON: f32 = 1e-6;
}

/// 用矩阵变换一个点（w = 1）
#[inline]
pub fn transform_point(matrix: &Matrix4, point: [f32; 3]) -> [f32; 3] {
    let p = matrix.transform_point(&Point3::new(point[0], point[1], point[2]));
    [p.x, p.y, p.z]
}

/// 从列主序的 4x4 数组构建矩阵（glTF 的存储方式）
#[inline]
pub fn matrix_from_columns(columns: [[f32; 4]; 4]) -> Matrix4 {
    Matrix4::from_fn(|row, col| columns[col][row])
}

/// 沿 Z 轴镜像一个变换：`S * m * S`，其中 `S = diag(1, 1, -1, 1)`
///
/// 用于右手坐标系到左手坐标系的转换。
pub fn mirror_z(matrix: &Matrix4) -> Matrix4 {
    let mut m = *matrix;
    for i in 0..4 {
        if i != 2 {
            m[(2, i)] = -m[(2, i)];
            m[(i, 2)] = -m[(i, 2)];
        }
    }
    m
}
