//! 导入报告
//!
//! 可恢复的问题不会中止导入，而是记录在这里并同时输出到日志。

use std::fmt;

use crate::scene::TextureSlot;

/// 一次导入中遇到的可恢复问题
#[derive(Debug, Clone, PartialEq)]
pub enum ImportWarning {
    /// 网格没有可用的几何数据，已丢弃
    DroppedMesh { mesh: String, reason: String },

    /// 贴图引用无法解析为文件
    MissingTexture {
        material: String,
        slot: TextureSlot,
        reference: String,
    },

    /// 非三角形的面被跳过
    SkippedFaces { mesh: String, count: usize },

    /// 请求了切线空间但网格没有切线（缺少法线或 UV）
    MissingTangents { mesh: String },

    /// 网格引用了不存在的材质
    InvalidMaterialReference { mesh: String, material: usize },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DroppedMesh { mesh, reason } => write!(f, "mesh '{}' dropped: {}", mesh, reason),
            Self::MissingTexture { material, slot, reference } => write!(
                f,
                "material '{}' {} texture '{}' not found",
                material,
                slot.name(),
                reference
            ),
            Self::SkippedFaces { mesh, count } => {
                write!(f, "mesh '{}': skipped {} non-triangle faces", mesh, count)
            }
            Self::MissingTangents { mesh } => write!(f, "mesh '{}' has no tangents", mesh),
            Self::InvalidMaterialReference { mesh, material } => {
                write!(f, "mesh '{}' references missing material {}", mesh, material)
            }
        }
    }
}

/// `Producer::execute` 的结果摘要
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub nodes_added: usize,
    pub meshes_added: usize,
    pub materials_added: usize,
    pub bones_added: usize,
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    #[inline]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub(crate) fn warn(&mut self, warning: ImportWarning) {
        match &warning {
            ImportWarning::DroppedMesh { mesh, reason } => {
                crate::import_warn!(mesh = %mesh, reason = %reason, "Mesh dropped");
            }
            ImportWarning::MissingTexture { material, slot, reference } => {
                crate::import_warn!(
                    material = %material,
                    slot = slot.name(),
                    reference = %reference,
                    "Texture not found"
                );
            }
            ImportWarning::SkippedFaces { mesh, count } => {
                crate::import_warn!(mesh = %mesh, count, "Skipped non-triangle faces");
            }
            ImportWarning::MissingTangents { mesh } => {
                crate::import_warn!(mesh = %mesh, "Mesh has no tangents");
            }
            ImportWarning::InvalidMaterialReference { mesh, material } => {
                crate::import_warn!(mesh = %mesh, material, "Mesh references missing material");
            }
        }
        self.warnings.push(warning);
    }
}
