//! 材质翻译器
//!
//! 源材质 i 对应规范化材质 `material_base + i`，顺序不变。
//! 贴图引用依次在以下位置查找：
//!
//! 1. 引用本身（绝对路径，或相对当前目录）
//! 2. 模型文件所在目录
//! 3. 每个额外搜索目录：先按原引用，再只按文件名
//!
//! 都找不到时记为 `TextureSource::Missing`，导入继续。

use std::path::{Path, PathBuf};

use super::report::{ImportReport, ImportWarning};
use crate::scene::{Material, MaterialId, MaterialParams, SceneBatch, TextureSlot, TextureSource};
use crate::source::{ColorProperty, ScalarProperty, SourceMaterial, SourceScene};

pub(crate) struct MaterialTranslator<'a> {
    model_dir: &'a Path,
    search_folders: &'a [PathBuf],
}

impl<'a> MaterialTranslator<'a> {
    pub fn new(model_dir: &'a Path, search_folders: &'a [PathBuf]) -> Self {
        Self {
            model_dir,
            search_folders,
        }
    }

    /// 翻译全部材质，返回源下标到材质 ID 的映射
    pub fn translate_all<S: SourceScene>(
        &self,
        scene: &S,
        batch: &mut SceneBatch,
        report: &mut ImportReport,
    ) -> Vec<MaterialId> {
        let mut ids = Vec::with_capacity(scene.materials().len());
        for source in scene.materials() {
            let material = self.translate(source, batch.next_material_id(), report);
            ids.push(material.id);
            batch.materials.push(material);
        }
        ids
    }

    fn translate<M: SourceMaterial>(
        &self,
        source: &M,
        id: MaterialId,
        report: &mut ImportReport,
    ) -> Material {
        let mut material = Material::new(id, source.name());
        material.params = extract_params(source);

        for slot in TextureSlot::ALL {
            let Some(reference) = source.texture(slot).filter(|r| !r.is_empty()) else {
                continue;
            };
            let resolved = self.resolve(reference);
            if resolved.is_missing() {
                report.warn(ImportWarning::MissingTexture {
                    material: material.name.clone(),
                    slot,
                    reference: reference.to_string(),
                });
            }
            material.textures.insert(slot, resolved);
        }

        crate::import_debug!(
            material = %material.name,
            id = %material.id,
            textures = material.textures.len(),
            "Translated material"
        );
        material
    }

    /// 把一个贴图引用解析为文件、嵌入图片或缺失
    pub fn resolve(&self, reference: &str) -> TextureSource {
        // 嵌入图片引用："*3"
        if let Some(index) = reference.strip_prefix('*').and_then(|i| i.parse().ok()) {
            return TextureSource::Embedded(index);
        }

        let normalized = reference.replace('\\', "/");
        let relative = Path::new(&normalized);

        let mut candidates = vec![relative.to_path_buf()];
        if relative.is_relative() {
            candidates.push(self.model_dir.join(relative));
        }
        let file_name = relative.file_name();
        for folder in self.search_folders {
            if relative.is_relative() {
                candidates.push(folder.join(relative));
            }
            if let Some(file_name) = file_name {
                candidates.push(folder.join(file_name));
            }
        }

        candidates
            .into_iter()
            .find(|candidate| candidate.is_file())
            .map(TextureSource::File)
            .unwrap_or_else(|| TextureSource::Missing(reference.to_string()))
    }
}

fn extract_params<M: SourceMaterial>(source: &M) -> MaterialParams {
    let defaults = MaterialParams::default();
    MaterialParams {
        diffuse_color: source.color(ColorProperty::Diffuse).unwrap_or(defaults.diffuse_color),
        specular_color: source.color(ColorProperty::Specular).unwrap_or(defaults.specular_color),
        emissive_color: source.color(ColorProperty::Emissive).unwrap_or(defaults.emissive_color),
        ambient_color: source.color(ColorProperty::Ambient).unwrap_or(defaults.ambient_color),
        opacity: source.scalar(ScalarProperty::Opacity).unwrap_or(defaults.opacity),
        shininess: source.scalar(ScalarProperty::Shininess).unwrap_or(defaults.shininess),
        metallic: source.scalar(ScalarProperty::Metallic).unwrap_or(defaults.metallic),
        roughness: source.scalar(ScalarProperty::Roughness).unwrap_or(defaults.roughness),
    }
}
