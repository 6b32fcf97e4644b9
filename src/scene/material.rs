//! 规范化材质

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ids::MaterialId;

/// 可识别的贴图槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureSlot {
    Diffuse,
    Normal,
    Specular,
    Emissive,
    Occlusion,
    Roughness,
    Metallic,
    Ambient,
    Opacity,
}

impl TextureSlot {
    /// 所有槽位，材质翻译器按此顺序查询
    pub const ALL: [TextureSlot; 9] = [
        TextureSlot::Diffuse,
        TextureSlot::Normal,
        TextureSlot::Specular,
        TextureSlot::Emissive,
        TextureSlot::Occlusion,
        TextureSlot::Roughness,
        TextureSlot::Metallic,
        TextureSlot::Ambient,
        TextureSlot::Opacity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TextureSlot::Diffuse => "diffuse",
            TextureSlot::Normal => "normal",
            TextureSlot::Specular => "specular",
            TextureSlot::Emissive => "emissive",
            TextureSlot::Occlusion => "occlusion",
            TextureSlot::Roughness => "roughness",
            TextureSlot::Metallic => "metallic",
            TextureSlot::Ambient => "ambient",
            TextureSlot::Opacity => "opacity",
        }
    }
}

/// 贴图引用解析的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// 找到了存在的文件
    File(PathBuf),

    /// 嵌入在模型文件中的图片（下标）
    Embedded(usize),

    /// 无法解析，保留原始引用
    Missing(String),
}

impl TextureSource {
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, TextureSource::Missing(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            TextureSource::File(path) => Some(path),
            _ => None,
        }
    }
}

/// 材质的标量和颜色参数
///
/// 源材质中没有的参数使用默认值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialParams {
    pub diffuse_color: [f32; 3],
    pub specular_color: [f32; 3],
    pub emissive_color: [f32; 3],
    pub ambient_color: [f32; 3],
    pub opacity: f32,
    pub shininess: f32,
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            diffuse_color: [1.0, 1.0, 1.0],
            specular_color: [0.0, 0.0, 0.0],
            emissive_color: [0.0, 0.0, 0.0],
            ambient_color: [0.0, 0.0, 0.0],
            opacity: 1.0,
            shininess: 0.0,
            metallic: 0.0,
            roughness: 1.0,
        }
    }
}

/// 规范化材质
#[derive(Debug, Clone)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub textures: BTreeMap<TextureSlot, TextureSource>,
    pub params: MaterialParams,
}

impl Material {
    pub fn new(id: MaterialId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            textures: BTreeMap::new(),
            params: MaterialParams::default(),
        }
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureSource> {
        self.textures.get(&slot)
    }

    /// 已解析到文件的贴图路径
    pub fn texture_path(&self, slot: TextureSlot) -> Option<&Path> {
        self.texture(slot).and_then(TextureSource::path)
    }

    /// 所有未能解析的贴图槽位
    pub fn missing_textures(&self) -> impl Iterator<Item = (TextureSlot, &str)> + '_ {
        self.textures.iter().filter_map(|(slot, source)| match source {
            TextureSource::Missing(reference) => Some((*slot, reference.as_str())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = MaterialParams::default();
        assert_eq!(params.opacity, 1.0);
        assert_eq!(params.diffuse_color, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_texture_queries() {
        let mut material = Material::new(MaterialId(0), "Brick");
        material
            .textures
            .insert(TextureSlot::Diffuse, TextureSource::File(PathBuf::from("brick.png")));
        material
            .textures
            .insert(TextureSlot::Normal, TextureSource::Missing("brick_n.png".to_string()));

        assert_eq!(material.texture_path(TextureSlot::Diffuse), Some(Path::new("brick.png")));
        assert!(material.texture_path(TextureSlot::Normal).is_none());
        assert!(material.texture(TextureSlot::Specular).is_none());

        let missing: Vec<_> = material.missing_textures().collect();
        assert_eq!(missing, vec![(TextureSlot::Normal, "brick_n.png")]);
    }
}
