/// 场景解析器模块
///
/// 解析器位于导入管线的能力边界另一侧：它们打开模型文件，
/// 按 `ImportFlags` 执行后处理，输出一个只读的 `RawScene`。
///
/// # 支持的格式
///
/// - **OBJ**: Wavefront OBJ 格式（使用 tobj crate）
/// - **glTF**: glTF 2.0 / GLB（使用 gltf crate）
///
/// # 使用示例
///
/// ```rust,no_run
/// use dist_scene::geometry::loaders::{parser_for_path, ImportFlags};
/// use std::path::Path;
///
/// let path = Path::new("model.obj");
/// let parser = parser_for_path(path)?;
/// let scene = parser.parse(path, ImportFlags::BASE)?;
/// println!("节点数: {}", scene.nodes.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
use crate::core::error::{ImportError, ParseError, Result};
use crate::source::RawScene;
use std::path::Path;

pub mod flags;
pub mod postprocess;
pub mod obj_loader;
pub mod gltf_loader;

// 重新导出解析器
pub use flags::{ImportFlags, MAX_BONE_WEIGHTS};
pub use obj_loader::ObjParser;
pub use gltf_loader::GltfParser;

/// 场景解析器 trait
///
/// 所有格式的解析器都实现此 trait；`Producer` 只通过它访问解析能力。
///
/// # 实现要求
///
/// - 解析器应该是无状态的
/// - 返回的 `RawScene` 已经执行过 `flags` 要求的后处理
/// - 任何失败都以 `ParseError` 返回，不应 panic
pub trait SceneParser {
    /// 解析模型文件
    fn parse(&self, path: &Path, flags: ImportFlags) -> std::result::Result<RawScene, ParseError>;

    /// 支持的扩展名列表（小写，不含点号）
    fn supported_extensions(&self) -> &'static [&'static str];
}

/// 根据文件扩展名选择合适的解析器
///
/// # 错误
///
/// 扩展名缺失或不受支持时返回 `ImportError::UnsupportedFormat`。
pub fn parser_for_path(path: &Path) -> Result<Box<dyn SceneParser>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| {
            ImportError::UnsupportedFormat(format!("无法确定文件扩展名: {}", path.display()))
        })?;

    let parsers: [Box<dyn SceneParser>; 2] = [Box::new(ObjParser), Box::new(GltfParser)];
    parsers
        .into_iter()
        .find(|parser| parser.supported_extensions().contains(&extension.as_str()))
        .ok_or_else(|| ImportError::UnsupportedFormat(format!("不支持的文件格式: .{}", extension)))
}

/// 文件名（不含扩展名），用作合成根节点的名称
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unnamed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(ObjParser.supported_extensions().contains(&"obj"));
        assert!(GltfParser.supported_extensions().contains(&"gltf"));
        assert!(GltfParser.supported_extensions().contains(&"glb"));
    }

    #[test]
    fn test_parser_for_path() {
        let parser = parser_for_path(Path::new("scene/Model.OBJ")).unwrap();
        assert_eq!(parser.supported_extensions(), &["obj"]);

        let parser = parser_for_path(Path::new("scene/model.glb")).unwrap();
        assert!(parser.supported_extensions().contains(&"glb"));
    }

    #[test]
    fn test_parser_for_unknown_format() {
        assert!(matches!(
            parser_for_path(Path::new("model.fbx")),
            Err(ImportError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            parser_for_path(Path::new("model")),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("assets/Sponza.gltf")), "Sponza");
    }
}
