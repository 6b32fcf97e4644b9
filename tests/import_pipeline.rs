//! 通过桩解析器驱动完整的导入流程

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use approx::assert_relative_eq;
use dist_scene::core::math::{Matrix4, Vector3};
use dist_scene::core::ParseError;
use dist_scene::geometry::loaders::{postprocess, ImportFlags, SceneParser};
use dist_scene::scene::{MaterialId, MeshId, NodeId, TextureSlot, TextureSource};
use dist_scene::source::{RawBone, RawMaterial, RawMesh, RawNode, RawScene};
use dist_scene::{ImportError, ImportWarning, Producer, ProducerState, SceneDatabase};
use tempfile::NamedTempFile;

/// 返回固定场景的解析器，记录收到的导入标志
struct StubParser {
    scene: Option<RawScene>,
    postprocess: bool,
    received: Rc<Cell<Option<ImportFlags>>>,
}

impl StubParser {
    fn new(scene: RawScene) -> Self {
        Self {
            scene: Some(scene),
            postprocess: false,
            received: Rc::new(Cell::new(None)),
        }
    }

    fn failing() -> Self {
        Self {
            scene: None,
            postprocess: false,
            received: Rc::new(Cell::new(None)),
        }
    }

    fn with_postprocess(mut self) -> Self {
        self.postprocess = true;
        self
    }
}

impl SceneParser for StubParser {
    fn parse(&self, _path: &Path, flags: ImportFlags) -> Result<RawScene, ParseError> {
        self.received.set(Some(flags));
        let mut scene = self.scene.clone().ok_or(ParseError::Empty)?;
        if self.postprocess {
            postprocess::apply(&mut scene, flags)?;
        }
        Ok(scene)
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        &["stub"]
    }
}

fn model_file() -> NamedTempFile {
    tempfile::Builder::new().suffix(".stub").tempfile().unwrap()
}

fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

fn triangle(name: &str) -> RawMesh {
    let mut mesh = RawMesh::new(name);
    mesh.positions = vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 3.0, 1.0]];
    mesh.faces = vec![vec![0, 1, 2]];
    mesh
}

/// 两个共享一条边的三角形
fn quad(name: &str) -> RawMesh {
    let mut mesh = RawMesh::new(name);
    mesh.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 4]);
    mesh.faces = vec![vec![0, 1, 2], vec![0, 2, 3]];
    mesh
}

/// root → A → B(mesh 0)，root → C(mesh 1)
fn nested_scene() -> RawScene {
    let mut scene = RawScene::with_root("Root");
    scene.nodes[0].transform = translation(0.0, 0.0, 5.0);
    let first = scene.add_mesh(quad("First"));
    let second = scene.add_mesh(triangle("Second"));
    let a = scene.add_node(
        0,
        RawNode::new("A").with_transform(Matrix4::from_axis_angle(&Vector3::z_axis(), 0.5)),
    );
    scene.add_node(
        a,
        RawNode::new("B")
            .with_transform(translation(1.0, 2.0, 3.0))
            .with_meshes([first]),
    );
    scene.add_node(
        0,
        RawNode::new("C")
            .with_transform(translation(-4.0, 0.0, 0.0))
            .with_meshes([second]),
    );
    scene
}

fn import(scene: RawScene, configure: impl FnOnce(&mut Producer)) -> (SceneDatabase, dist_scene::ImportReport) {
    let file = model_file();
    let mut producer = Producer::with_parser(file.path(), StubParser::new(scene));
    configure(&mut producer);
    let mut database = SceneDatabase::new();
    let report = producer.execute(&mut database).unwrap();
    (database, report)
}

#[test]
fn service_toggles_round_trip() {
    let mut producer = Producer::with_parser("model.stub", StubParser::new(RawScene::with_root("Root")));

    producer.deactivate_duplicate_vertex_service();
    producer.activate_duplicate_vertex_service();
    assert!(producer.is_duplicate_vertex_service_active());

    producer.deactivate_bounding_box_service();
    producer.activate_bounding_box_service();
    assert!(producer.is_bounding_box_service_active());

    producer.deactivate_flatten_hierarchy_service();
    producer.activate_flatten_hierarchy_service();
    assert!(producer.is_flatten_hierarchy_service_active());

    producer.deactivate_triangulate_service();
    producer.activate_triangulate_service();
    assert!(producer.is_triangulate_service_active());

    producer.deactivate_tangent_space_service();
    producer.activate_tangent_space_service();
    assert!(producer.is_tangent_space_service_active());

    producer.deactivate_clean_unused_service();
    producer.activate_clean_unused_service();
    assert!(producer.is_clean_unused_service_active());

    producer.deactivate_tangent_space_service();
    assert!(!producer.is_tangent_space_service_active());
    assert!(producer.is_clean_unused_service_active());
}

#[test]
fn parser_receives_derived_flags() {
    let file = model_file();
    let parser = StubParser::new(nested_scene());
    let received = Rc::clone(&parser.received);
    let mut producer = Producer::with_parser(file.path(), parser);
    producer.activate_triangulate_service();
    producer.activate_duplicate_vertex_service();

    producer.execute(&mut SceneDatabase::new()).unwrap();

    let flags = received.get().unwrap();
    assert_eq!(flags, ImportFlags::BASE | ImportFlags::TRIANGULATE);
}

#[test]
fn single_triangle_scenario() {
    let mut scene = RawScene::with_root("Root");
    let mesh = scene.add_mesh(triangle("Tri"));
    scene.nodes[0].meshes.push(mesh);

    let (database, _) = import(scene, |p| {
        p.activate_bounding_box_service();
        p.activate_triangulate_service();
    });

    let mesh = &database.meshes()[0];
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.triangle_count(), 1);
    assert!(mesh.vertices.iter().all(|v| v.texcoord == [0.0, 0.0]));
    assert_eq!(mesh.uv_set_count(), 0);

    let aabb = mesh.aabb.unwrap();
    assert_eq!(aabb.min, [0.0, 0.0, 0.0]);
    assert_eq!(aabb.max, [2.0, 3.0, 1.0]);
}

#[test]
fn flatten_single_child_scenario() {
    let t1 = translation(3.0, 0.0, -2.0) * Matrix4::new_scaling(2.0);
    let mut scene = RawScene::with_root("Root");
    let mesh = scene.add_mesh(triangle("M"));
    scene.add_node(0, RawNode::new("A").with_transform(t1).with_meshes([mesh]));

    let (database, _) = import(scene, |p| p.activate_flatten_hierarchy_service());

    let root = database.node(database.roots()[0]).unwrap();
    assert_eq!(root.children.len(), 1);
    let a = database.node(root.children[0]).unwrap();
    assert_eq!(a.name, "A");
    assert_relative_eq!(a.transform, t1);
    assert_eq!(a.meshes, vec![MeshId(0)]);
}

#[test]
fn duplicate_vertex_controls_vertex_sharing() {
    let (shared, _) = import(nested_scene(), |_| {});
    let quad = shared.find_mesh("First").unwrap();
    assert!(quad.vertex_count() <= 4);
    assert_eq!(quad.triangle_count(), 2);

    let (duplicated, _) = import(nested_scene(), |p| p.activate_duplicate_vertex_service());
    for mesh in duplicated.meshes() {
        assert_eq!(mesh.vertex_count(), 3 * mesh.triangle_count());
    }
}

#[test]
fn bounding_box_contains_every_position() {
    let (database, _) = import(nested_scene(), |p| p.activate_bounding_box_service());
    for mesh in database.meshes() {
        let aabb = mesh.aabb.unwrap();
        assert!(mesh.vertices.iter().all(|v| aabb.contains(v.position)));
    }

    let (database, _) = import(nested_scene(), |_| {});
    assert!(database.meshes().iter().all(|m| m.aabb.is_none()));
}

#[test]
fn flatten_preserves_world_placement() {
    let (tree, _) = import(nested_scene(), |_| {});
    let (flat, _) = import(nested_scene(), |p| p.activate_flatten_hierarchy_service());

    let root = flat.roots()[0];
    for node in flat.nodes().iter().filter(|n| n.id != root) {
        assert_eq!(node.parent, Some(root));
        assert!(node.children.is_empty());
    }

    let before = tree.mesh_instances();
    let after = flat.mesh_instances();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.mesh, a.mesh);
        assert_relative_eq!(b.world_transform, a.world_transform, epsilon = 1e-5);
    }
}

#[test]
fn materials_are_index_stable_across_imports() {
    let mut scene = nested_scene();
    scene.add_material(RawMaterial::new("Stone"));
    scene.add_material(RawMaterial::new("Wood"));
    scene.meshes[1].material = Some(1);

    let file = model_file();
    let mut database = SceneDatabase::new();
    Producer::with_parser(file.path(), StubParser::new(scene.clone()))
        .execute(&mut database)
        .unwrap();
    Producer::with_parser(file.path(), StubParser::new(scene))
        .execute(&mut database)
        .unwrap();

    let names: Vec<&str> = database.materials().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Stone", "Wood", "Stone", "Wood"]);
    for (i, material) in database.materials().iter().enumerate() {
        assert_eq!(material.id, MaterialId(i as u32));
    }

    // 第二次导入的 ID 从已有数量开始
    assert_eq!(database.roots(), &[NodeId(0), NodeId(4)]);
    assert_eq!(database.find_mesh("Second").unwrap().material, Some(MaterialId(1)));
    assert_eq!(database.meshes()[3].material, Some(MaterialId(3)));
    assert_eq!(database.meshes()[3].id, MeshId(3));
}

#[test]
fn influences_sum_to_one() {
    let mut scene = nested_scene();
    scene.meshes[0].bones = vec![
        RawBone {
            name: "A".to_string(),
            offset: Matrix4::identity(),
            weights: vec![(0, 0.2), (1, 3.0), (2, 0.7)],
        },
        RawBone {
            name: "Tip".to_string(),
            offset: Matrix4::identity(),
            weights: vec![(0, 0.6), (2, 0.7), (3, 0.0)],
        },
    ];

    let (database, report) = import(scene, |_| {});

    assert_eq!(report.bones_added, 2);
    let mesh = database.find_mesh("First").unwrap();
    assert!(mesh.is_skinned());
    for list in mesh.influences.iter().filter(|l| !l.is_empty()) {
        let sum: f32 = list.iter().map(|w| w.weight).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
    }
    assert!(mesh.influences[3].is_empty());

    // 骨骼关联到同名节点
    let bone = database.bones().iter().find(|b| b.name == "A").unwrap();
    assert_eq!(bone.node, database.find_node("A").map(|n| n.id));
    assert!(database.bones().iter().find(|b| b.name == "Tip").unwrap().node.is_none());
}

#[test]
fn missing_textures_are_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("albedo.png"), b"png").unwrap();
    let model = dir.path().join("model.stub");
    std::fs::write(&model, b"").unwrap();

    let mut scene = nested_scene();
    scene.add_material(
        RawMaterial::new("Painted")
            .with_texture(TextureSlot::Diffuse, "albedo.png")
            .with_texture(TextureSlot::Normal, "textures/missing_n.png"),
    );

    let mut producer = Producer::with_parser(&model, StubParser::new(scene));
    let mut database = SceneDatabase::new();
    let report = producer.execute(&mut database).unwrap();

    let material = database.find_material("Painted").unwrap();
    assert_eq!(
        material.texture(TextureSlot::Diffuse),
        Some(&TextureSource::File(dir.path().join("albedo.png")))
    );
    assert!(material.texture(TextureSlot::Normal).unwrap().is_missing());
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ImportWarning::MissingTexture { slot: TextureSlot::Normal, .. }
    )));
}

#[test]
fn extra_search_folder_redirects_textures() {
    let shared = tempfile::tempdir().unwrap();
    std::fs::write(shared.path().join("bricks.png"), b"png").unwrap();

    let mut scene = nested_scene();
    scene.add_material(RawMaterial::new("Wall").with_texture(TextureSlot::Diffuse, "C:\\art\\bricks.png"));

    let (database, report) = import(scene, |p| p.add_extra_texture_search_folder(shared.path()));

    let material = database.find_material("Wall").unwrap();
    assert_eq!(
        material.texture_path(TextureSlot::Diffuse),
        Some(shared.path().join("bricks.png").as_path())
    );
    assert!(!report.has_warnings());
}

#[test]
fn empty_meshes_are_dropped_and_references_removed() {
    let mut scene = nested_scene();
    let empty = scene.add_mesh(RawMesh::new("Empty"));
    scene.nodes[0].meshes.push(empty);

    let (database, report) = import(scene, |_| {});

    assert_eq!(database.meshes().len(), 2);
    assert!(database.find_mesh("Empty").is_none());
    assert!(database.node(NodeId(0)).unwrap().meshes.is_empty());
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, ImportWarning::DroppedMesh { mesh, .. } if mesh == "Empty")));
}

#[test]
fn parser_failure_commits_nothing() {
    let file = model_file();
    let mut producer = Producer::with_parser(file.path(), StubParser::failing());
    let mut database = SceneDatabase::new();

    let result = producer.execute(&mut database);

    assert!(matches!(result, Err(ImportError::Parse(ParseError::Empty))));
    assert_eq!(producer.state(), ProducerState::Failed);
    assert!(database.is_empty());
    assert!(matches!(producer.execute(&mut database), Err(ImportError::AlreadyExecuted)));
}

#[test]
fn invalid_hierarchy_commits_nothing() {
    let mut scene = nested_scene();
    scene.nodes[0].meshes.push(9);

    let file = model_file();
    let mut database = SceneDatabase::new();
    let result = Producer::with_parser(file.path(), StubParser::new(scene)).execute(&mut database);

    assert!(matches!(
        result,
        Err(ImportError::OrphanedMeshReference { mesh: 9, .. })
    ));
    assert!(database.is_empty());
}

#[test]
fn parser_side_services_reach_geometry() {
    let mut scene = RawScene::with_root("Root");
    let mut mesh = RawMesh::new("Panel");
    mesh.positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
    mesh.uv_sets = vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]];
    mesh.faces = vec![vec![0, 1, 2, 3]];
    let mesh = scene.add_mesh(mesh);
    scene.add_node(0, RawNode::new("Holder").with_meshes([mesh]));
    scene.add_node(0, RawNode::new("Anchor"));
    scene.add_material(RawMaterial::new("Unused"));

    let file = model_file();
    let mut producer = Producer::with_parser(file.path(), StubParser::new(scene).with_postprocess());
    producer.activate_triangulate_service();
    producer.activate_tangent_space_service();
    producer.activate_clean_unused_service();
    let mut database = SceneDatabase::new();
    let report = producer.execute(&mut database).unwrap();

    let mesh = database.find_mesh("Panel").unwrap();
    assert_eq!(mesh.triangle_count(), 2);
    assert!(mesh.has_tangents());
    // 法线由解析器生成，并随左手坐标系转换镜像
    assert_relative_eq!(mesh.vertices[0].normal[2].abs(), 1.0, epsilon = 1e-5);
    assert!(database.find_node("Anchor").is_none());
    assert!(database.materials().is_empty());
    assert!(!report.has_warnings());
}
