//! Bone hierarchy storage and world / inverse-bind matrix resolution.

mod bone;
mod hierarchy;
mod resolve;
mod transform;

use std::fmt;

use nalgebra::Matrix4;

use crate::error::RigError;

pub use bone::{Bone, BonePose, BoneTransform};
pub use hierarchy::BoneTreeNode;
pub use resolve::BindResolution;

/// One bone's freshly resolved world matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformChange {
    pub bone: usize,
    pub world: Matrix4<f32>,
}

/// Receives a [`TransformChange`] for every bone resolved by
/// [`BoneGraph::update`], in resolve order.
pub trait TransformObserver {
    fn transform_updated(&mut self, change: &TransformChange);
}

/// Flat arena of bones addressed by index.
///
/// The index space is shared with parent links and with skin remap tables, so
/// the bone list is fixed once the graph is built.
pub struct BoneGraph {
    bones: Vec<Bone>,
    order: Vec<usize>,
    root_transform: Matrix4<f32>,
    local_transform: Matrix4<f32>,
    world_matrices: Vec<Matrix4<f32>>,
    inverse_bind_matrices: Vec<Matrix4<f32>>,
    remap_table: Vec<u32>,
    stale: bool,
    bind_generation: u64,
    changes: Vec<TransformChange>,
    observers: Vec<Box<dyn TransformObserver>>,
}

impl fmt::Debug for BoneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoneGraph")
            .field("bones", &self.bones)
            .field("root_transform", &self.root_transform)
            .field("local_transform", &self.local_transform)
            .field("remap_table", &self.remap_table)
            .field("stale", &self.stale)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl BoneGraph {
    /// Build a graph, rejecting self-parented, dangling or cyclic parent links
    /// and duplicate bone names.
    ///
    /// World and inverse-bind matrices start as identity; call
    /// [`BoneGraph::reset_pose`] before reading them.
    pub fn new(bones: Vec<Bone>) -> Result<Self, RigError> {
        let order = hierarchy::resolve_order(&bones)?;
        let count = bones.len();
        Ok(Self {
            bones,
            order,
            root_transform: Matrix4::identity(),
            local_transform: Matrix4::identity(),
            world_matrices: vec![Matrix4::identity(); count],
            inverse_bind_matrices: vec![Matrix4::identity(); count],
            remap_table: Vec::new(),
            stale: true,
            bind_generation: 0,
            changes: Vec::new(),
            observers: Vec::new(),
        })
    }

    pub fn empty() -> Self {
        Self {
            bones: Vec::new(),
            order: Vec::new(),
            root_transform: Matrix4::identity(),
            local_transform: Matrix4::identity(),
            world_matrices: Vec::new(),
            inverse_bind_matrices: Vec::new(),
            remap_table: Vec::new(),
            stale: false,
            bind_generation: 0,
            changes: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn TransformObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Transform of this graph relative to the bone hosting it.
    pub fn with_local_transform(mut self, local_transform: Matrix4<f32>) -> Self {
        self.local_transform = local_transform;
        self
    }

    pub fn with_remap_table(mut self, remap_table: Vec<u32>) -> Self {
        self.remap_table = remap_table;
        self
    }

    // ─── Accessors ────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }

    pub fn bone_tree(&self) -> Vec<BoneTreeNode> {
        hierarchy::build_tree(&self.bones)
    }

    pub fn root_transform(&self) -> &Matrix4<f32> {
        &self.root_transform
    }

    pub fn set_root_transform(&mut self, root_transform: Matrix4<f32>) {
        self.root_transform = root_transform;
        self.stale = true;
    }

    pub fn local_transform(&self) -> &Matrix4<f32> {
        &self.local_transform
    }

    /// Mesh-local skinning index → bone index.
    pub fn remap_table(&self) -> &[u32] {
        &self.remap_table
    }

    pub fn world_matrix(&self, index: usize) -> Option<&Matrix4<f32>> {
        self.world_matrices.get(index)
    }

    pub fn world_matrices(&self) -> &[Matrix4<f32>] {
        &self.world_matrices
    }

    pub fn inverse_bind_matrix(&self, index: usize) -> Option<&Matrix4<f32>> {
        self.inverse_bind_matrices.get(index)
    }

    pub fn inverse_bind_matrices(&self) -> &[Matrix4<f32>] {
        &self.inverse_bind_matrices
    }

    /// Changes recorded by the most recent [`BoneGraph::update`].
    pub fn changes(&self) -> &[TransformChange] {
        &self.changes
    }

    /// True when poses changed since the last [`BoneGraph::update`].
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    // ─── Mutation ─────────────────────────────────────────────────────────────

    /// Replace a bone's pose as a whole.
    pub fn set_pose(&mut self, index: usize, pose: BonePose) -> Result<(), RigError> {
        let bone = self.bone_mut(index)?;
        bone.pose = pose;
        self.stale = true;
        Ok(())
    }

    /// Replace a bone's bind transform. Outstanding [`BindResolution`]s become
    /// stale.
    pub fn set_bind(&mut self, index: usize, bind: BoneTransform) -> Result<(), RigError> {
        let bone = self.bone_mut(index)?;
        bone.bind = bind;
        self.bind_generation += 1;
        Ok(())
    }

    /// Host `graph` under bone `host`. Its root follows the host's world
    /// matrix on every update.
    pub fn attach(&mut self, host: usize, graph: BoneGraph) -> Result<(), RigError> {
        let bone = self.bone_mut(host)?;
        bone.attachments.push(graph);
        self.stale = true;
        Ok(())
    }

    pub fn attachment_mut(&mut self, host: usize, slot: usize) -> Option<&mut BoneGraph> {
        self.bones.get_mut(host)?.attachments.get_mut(slot)
    }

    fn bone_mut(&mut self, index: usize) -> Result<&mut Bone, RigError> {
        let count = self.bones.len();
        self.bones
            .get_mut(index)
            .ok_or(RigError::BoneOutOfRange { index, count })
    }
}
