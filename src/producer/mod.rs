//! 导入流程编排
//!
//! `Producer` 持有一个模型路径、一个解析器和一组服务开关。
//! `execute` 调用解析器，然后依次运行材质、网格、层级三个翻译器，
//! 最后把结果一次性提交到场景数据库。
//!
//! # 状态
//!
//! ```text
//! Configured ──execute──▶ Running ──▶ Done
//!                                 └─▶ Failed
//! ```
//!
//! `execute` 只能调用一次；失败时数据库不会被修改。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use dist_scene::producer::Producer;
//! use dist_scene::scene::SceneDatabase;
//!
//! let mut producer = Producer::new("assets/sponza.obj")?;
//! producer.activate_triangulate_service();
//! producer.activate_bounding_box_service();
//!
//! let mut database = SceneDatabase::new();
//! let report = producer.execute(&mut database)?;
//! println!("导入了 {} 个网格", report.meshes_added);
//! # Ok::<(), dist_scene::core::ImportError>(())
//! ```

mod hierarchy_translator;
mod material_translator;
mod mesh_translator;
pub mod report;
pub mod services;

pub use report::{ImportReport, ImportWarning};
pub use services::ServiceFlags;

use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::core::error::{ImportError, Result};
use crate::geometry::loaders::{parser_for_path, ImportFlags, SceneParser};
use crate::scene::{SceneBatch, SceneDatabase};
use crate::source::SourceScene;
use hierarchy_translator::HierarchyTranslator;
use material_translator::MaterialTranslator;
use mesh_translator::MeshTranslator;

/// 导入器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerState {
    /// 可以修改服务开关
    Configured,
    /// `execute` 正在进行
    Running,
    /// 导入成功，结果已提交
    Done,
    /// 导入失败，没有提交任何数据
    Failed,
}

/// 模型导入器
pub struct Producer {
    path: PathBuf,
    parser: Box<dyn SceneParser>,
    services: ServiceFlags,
    extra_texture_folders: Vec<PathBuf>,
    state: ProducerState,
}

macro_rules! service_switch {
    ($flag:ident, $activate:ident, $deactivate:ident, $query:ident) => {
        pub fn $activate(&mut self) {
            self.set_service(ServiceFlags::$flag, true);
        }

        pub fn $deactivate(&mut self) {
            self.set_service(ServiceFlags::$flag, false);
        }

        pub fn $query(&self) -> bool {
            self.services.contains(ServiceFlags::$flag)
        }
    };
}

impl Producer {
    /// 按扩展名选择解析器
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let parser = parser_for_path(&path)?;
        Ok(Self::from_parts(path, parser))
    }

    /// 使用指定的解析器
    pub fn with_parser<P: SceneParser + 'static>(path: impl Into<PathBuf>, parser: P) -> Self {
        Self::from_parts(path.into(), Box::new(parser))
    }

    fn from_parts(path: PathBuf, parser: Box<dyn SceneParser>) -> Self {
        Self {
            path,
            parser,
            services: ServiceFlags::empty(),
            extra_texture_folders: Vec::new(),
            state: ProducerState::Configured,
        }
    }

    /// 应用配置文件中的服务开关和贴图目录
    pub fn with_config(mut self, config: &Config) -> Self {
        self.services = config.services.to_flags();
        self.extra_texture_folders
            .extend(config.textures.extra_search_folders.iter().cloned());
        self
    }

    service_switch!(
        DUPLICATE_VERTEX,
        activate_duplicate_vertex_service,
        deactivate_duplicate_vertex_service,
        is_duplicate_vertex_service_active
    );
    service_switch!(
        BOUNDING_BOX,
        activate_bounding_box_service,
        deactivate_bounding_box_service,
        is_bounding_box_service_active
    );
    service_switch!(
        FLATTEN_HIERARCHY,
        activate_flatten_hierarchy_service,
        deactivate_flatten_hierarchy_service,
        is_flatten_hierarchy_service_active
    );
    service_switch!(
        TRIANGULATE,
        activate_triangulate_service,
        deactivate_triangulate_service,
        is_triangulate_service_active
    );
    service_switch!(
        TANGENT_SPACE,
        activate_tangent_space_service,
        deactivate_tangent_space_service,
        is_tangent_space_service_active
    );
    service_switch!(
        CLEAN_UNUSED,
        activate_clean_unused_service,
        deactivate_clean_unused_service,
        is_clean_unused_service_active
    );

    /// 导入开始后服务开关不可修改
    fn set_service(&mut self, flag: ServiceFlags, enabled: bool) {
        if self.state != ProducerState::Configured {
            crate::import_warn!(state = ?self.state, ?flag, "Service flags are frozen once import has started");
            return;
        }
        self.services.set(flag, enabled);
    }

    pub fn services(&self) -> ServiceFlags {
        self.services
    }

    /// 当前服务开关对应的解析器标志
    pub fn import_flags(&self) -> ImportFlags {
        self.services.import_flags()
    }

    /// 添加一个额外的贴图搜索目录
    ///
    /// 贴图引用在模型目录中找不到时，会依次在这些目录中查找。
    pub fn add_extra_texture_search_folder(&mut self, folder: impl Into<PathBuf>) {
        self.extra_texture_folders.push(folder.into());
    }

    pub fn extra_texture_search_folders(&self) -> &[PathBuf] {
        &self.extra_texture_folders
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> ProducerState {
        self.state
    }

    /// 执行导入
    ///
    /// # 错误
    ///
    /// - `AlreadyExecuted`：不是第一次调用
    /// - `FileNotFound`：模型文件不存在
    /// - `Parse`：解析器失败
    /// - `OrphanedMeshReference` / `OrphanedMesh` / `CyclicHierarchy`：层级数据无效
    ///
    /// 出错时 `database` 保持不变。
    pub fn execute(&mut self, database: &mut SceneDatabase) -> Result<ImportReport> {
        if self.state != ProducerState::Configured {
            return Err(ImportError::AlreadyExecuted);
        }
        self.state = ProducerState::Running;

        match self.run(database) {
            Ok(report) => {
                self.state = ProducerState::Done;
                crate::import_info!(
                    path = %self.path.display(),
                    nodes = report.nodes_added,
                    meshes = report.meshes_added,
                    materials = report.materials_added,
                    bones = report.bones_added,
                    warnings = report.warnings.len(),
                    "Import finished"
                );
                Ok(report)
            }
            Err(e) => {
                self.state = ProducerState::Failed;
                crate::import_error!(path = %self.path.display(), error = %e, "Import failed");
                Err(e)
            }
        }
    }

    fn run(&self, database: &mut SceneDatabase) -> Result<ImportReport> {
        if !self.path.is_file() {
            return Err(ImportError::FileNotFound(self.path.clone()));
        }

        let flags = self.import_flags();
        crate::import_info!(path = %self.path.display(), ?flags, "Importing model");

        let scene = self.parser.parse(&self.path, flags)?;
        self.translate(&scene, database)
    }

    /// 三个翻译器写入暂存区，全部成功后才提交
    fn translate<S: SourceScene>(&self, scene: &S, database: &mut SceneDatabase) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        let mut batch = SceneBatch::for_database(database);
        let model_dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        let material_ids = MaterialTranslator::new(model_dir, &self.extra_texture_folders)
            .translate_all(scene, &mut batch, &mut report);
        let mesh_ids = MeshTranslator::new(self.services, &material_ids)
            .translate_all(scene, &mut batch, &mut report);
        HierarchyTranslator::new(self.services, &mesh_ids).translate(scene, &mut batch)?;

        report.nodes_added = batch.nodes.len();
        report.meshes_added = batch.meshes.len();
        report.materials_added = batch.materials.len();
        report.bones_added = batch.bones.len();

        database.commit(batch);
        Ok(report)
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("path", &self.path)
            .field("parser", &self.parser.supported_extensions())
            .field("services", &self.services)
            .field("extra_texture_folders", &self.extra_texture_folders)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ParseError;
    use crate::source::{RawMesh, RawNode, RawScene};

    struct FixedParser(RawScene);

    impl SceneParser for FixedParser {
        fn parse(&self, _path: &Path, _flags: ImportFlags) -> std::result::Result<RawScene, ParseError> {
            Ok(self.0.clone())
        }

        fn supported_extensions(&self) -> &'static [&'static str] {
            &["fixed"]
        }
    }

    fn triangle_scene() -> RawScene {
        let mut scene = RawScene::with_root("Root");
        let mut mesh = RawMesh::new("Tri");
        mesh.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        mesh.faces = vec![vec![0, 1, 2]];
        let mesh = scene.add_mesh(mesh);
        scene.add_node(0, RawNode::new("A").with_meshes([mesh]));
        scene
    }

    #[test]
    fn test_service_toggles() {
        let mut producer = Producer::with_parser("model.fixed", FixedParser(triangle_scene()));
        assert!(!producer.is_bounding_box_service_active());

        producer.activate_bounding_box_service();
        producer.activate_clean_unused_service();
        assert!(producer.is_bounding_box_service_active());
        assert!(producer.import_flags().contains(ImportFlags::REMOVE_UNUSED));

        producer.deactivate_bounding_box_service();
        assert!(!producer.is_bounding_box_service_active());
        assert_eq!(producer.services(), ServiceFlags::CLEAN_UNUSED);
    }

    #[test]
    fn test_missing_file_fails_without_commit() {
        let mut producer = Producer::with_parser("does/not/exist.fixed", FixedParser(triangle_scene()));
        let mut database = SceneDatabase::new();

        assert!(matches!(producer.execute(&mut database), Err(ImportError::FileNotFound(_))));
        assert_eq!(producer.state(), ProducerState::Failed);
        assert!(database.is_empty());
    }

    #[test]
    fn test_execute_once() {
        let file = tempfile::Builder::new().suffix(".fixed").tempfile().unwrap();
        let mut producer = Producer::with_parser(file.path(), FixedParser(triangle_scene()));
        let mut database = SceneDatabase::new();

        let report = producer.execute(&mut database).unwrap();
        assert_eq!(producer.state(), ProducerState::Done);
        assert_eq!(report.meshes_added, 1);
        assert_eq!(report.nodes_added, 2);

        assert!(matches!(producer.execute(&mut database), Err(ImportError::AlreadyExecuted)));
        assert_eq!(database.meshes().len(), 1);

        // 导入开始后开关不再变化
        producer.activate_duplicate_vertex_service();
        assert!(!producer.is_duplicate_vertex_service_active());
    }

    #[test]
    fn test_with_config() {
        let config = Config::from_toml_str(
            r#"
            [services]
            flatten_hierarchy = true
            [textures]
            extra_search_folders = ["shared/textures"]
            "#,
        )
        .unwrap();
        let producer = Producer::with_parser("model.fixed", FixedParser(triangle_scene())).with_config(&config);

        assert!(producer.is_flatten_hierarchy_service_active());
        assert_eq!(producer.extra_texture_search_folders(), &[PathBuf::from("shared/textures")]);
    }

    #[test]
    fn test_new_rejects_unknown_extension() {
        assert!(matches!(Producer::new("model.xyz"), Err(ImportError::UnsupportedFormat(_))));
    }
}
