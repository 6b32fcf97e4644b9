//! DistScene 命令行工具
//!
//! 导入一个模型文件，打印规范化后的场景摘要。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件 dist_scene.toml 中的服务开关
//! cargo run -- assets/sponza.obj
//!
//! # 命令行覆盖
//! cargo run -- assets/sponza.obj --triangulate --bounding-box --texture-dir D:/Textures
//! ```

use anyhow::{bail, Context};
use dist_scene::core::log;
use dist_scene::{Config, Producer, SceneDatabase};
use tracing::info;

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载配置文件（dist_scene.toml）
/// 2. 应用命令行参数覆盖
/// 3. 初始化日志系统
/// 4. 导入模型并输出摘要
fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default("dist_scene.toml");

    // 2. 应用命令行参数，剩下的第一个位置参数是模型路径
    let positional = config.apply_args(&args);
    let Some(model) = positional.into_iter().next() else {
        bail!("usage: dist_scene <model> [--duplicate-vertex] [--bounding-box] [--flatten] \
               [--triangulate] [--tangent-space] [--clean-unused] [--texture-dir <dir>]");
    };
    config.validate().context("Invalid configuration")?;

    // 3. 初始化日志系统
    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, config.logging.file_output, log_file);
    info!(version = env!("CARGO_PKG_VERSION"), "DistScene starting...");

    // 4. 导入
    let mut producer = Producer::new(&model)
        .with_context(|| format!("Cannot import {}", model))?
        .with_config(&config);
    info!(services = ?producer.services(), flags = ?producer.import_flags(), "Import configuration");

    let mut database = SceneDatabase::new();
    let report = producer
        .execute(&mut database)
        .with_context(|| format!("Failed to import {}", model))?;

    println!("{}", model);
    println!(
        "  节点: {}  网格: {}  材质: {}  骨骼: {}",
        report.nodes_added, report.meshes_added, report.materials_added, report.bones_added
    );
    println!(
        "  顶点: {}  三角形: {}",
        database.total_vertex_count(),
        database.total_triangle_count()
    );
    for mesh in database.meshes() {
        match mesh.aabb {
            Some(aabb) => println!(
                "  {} {}: {} 顶点, {} 三角形, AABB {:?} - {:?}",
                mesh.id,
                mesh.name,
                mesh.vertex_count(),
                mesh.triangle_count(),
                aabb.min,
                aabb.max
            ),
            None => println!(
                "  {} {}: {} 顶点, {} 三角形",
                mesh.id,
                mesh.name,
                mesh.vertex_count(),
                mesh.triangle_count()
            ),
        }
    }
    for material in database.materials() {
        for (slot, reference) in material.missing_textures() {
            println!("  缺失贴图: {} {} '{}'", material.name, slot.name(), reference);
        }
    }
    if report.has_warnings() {
        println!("  {} 个警告", report.warnings.len());
        for warning in &report.warnings {
            println!("    - {}", warning);
        }
    }

    Ok(())
}
