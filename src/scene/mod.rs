//! 规范化场景模块
//!
//! 导入管线的输出：场景数据库以及其中的节点、网格、材质、骨骼。
//! 生命周期内只在 `Producer::execute` 中被写入一次。

pub mod ids;
pub mod material;
pub mod node;
pub mod database;

pub use ids::{BoneId, MaterialId, MeshId, NodeId};
pub use material::{Material, MaterialParams, TextureSlot, TextureSource};
pub use node::{Bone, Node};
pub use database::{MeshInstance, SceneDatabase};
pub(crate) use database::SceneBatch;
