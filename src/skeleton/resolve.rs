use log::{debug, warn};
use nalgebra::{Matrix4, Point3};

use super::transform::{extract_rotation, inverse_scale, rebuild_inverse_bind_matrix};
use super::{BoneGraph, TransformChange};
use crate::error::RigError;

/// World-space bind transforms captured by [`BoneGraph::ensure_resolved`].
///
/// Only valid for the bind generation it was taken at.
#[derive(Debug, Clone)]
pub struct BindResolution {
    generation: u64,
    bind_worlds: Vec<Matrix4<f32>>,
}

impl BindResolution {
    pub fn bind_world(&self, index: usize) -> Option<&Matrix4<f32>> {
        self.bind_worlds.get(index)
    }
}

impl BoneGraph {
    // ─── Pose resolution ──────────────────────────────────────────────────────

    /// Resolve every bone's world matrix, parents before children, notify
    /// observers, then update attached graphs from their host bone.
    pub fn update(&mut self) {
        self.changes.clear();

        for position in 0..self.order.len() {
            let index = self.order[position];
            let world = self.compute_world_matrix(index);
            self.world_matrices[index] = world;

            let change = TransformChange { bone: index, world };
            for observer in &mut self.observers {
                observer.transform_updated(&change);
            }
            self.changes.push(change);

            for attachment in &mut self.bones[index].attachments {
                attachment.root_transform = world * attachment.local_transform;
                attachment.update();
            }
        }

        self.stale = false;
    }

    /// Requires the parent's world matrix to be resolved already.
    fn compute_world_matrix(&self, index: usize) -> Matrix4<f32> {
        let bone = &self.bones[index];
        let mut local = bone.pose.transform.to_matrix();

        if let Some(parent) = bone.parent {
            if bone.compensates_parent_scale() {
                local = inverse_scale(&self.bones[parent].pose.transform.scale) * local;
            }
            if !bone.pose.world_transform {
                return self.world_matrices[parent] * local;
            }
        }

        self.root_transform * local
    }

    /// Restore every pose (including attached graphs) to its bind transform,
    /// resolve, and rebuild inverse-bind matrices.
    ///
    /// A bone whose resolved transform cannot be inverted gets an all-zero
    /// inverse-bind matrix until the next reset.
    pub fn reset_pose(&mut self) {
        self.restore_bind_pose();
        self.update();
        self.rebuild_inverse_binds();
    }

    fn restore_bind_pose(&mut self) {
        for bone in &mut self.bones {
            bone.pose.transform = bone.bind;
            for attachment in &mut bone.attachments {
                attachment.restore_bind_pose();
            }
        }
        self.stale = true;
    }

    fn rebuild_inverse_binds(&mut self) {
        for (index, world) in self.world_matrices.iter().enumerate() {
            self.inverse_bind_matrices[index] =
                match rebuild_inverse_bind_matrix(&self.root_transform, world) {
                    Some(inverse) => inverse,
                    None => {
                        warn!(
                            "bone '{}' has a non-invertible bind transform; inverse bind set to zero",
                            self.bones[index].name
                        );
                        Matrix4::zeros()
                    }
                };
        }

        for bone in &mut self.bones {
            for attachment in &mut bone.attachments {
                attachment.rebuild_inverse_binds();
            }
        }
    }

    // ─── Bind-chain queries ───────────────────────────────────────────────────

    /// World transform from bind transforms only, ignoring pose, root
    /// transform and scale compensation.
    pub fn bone_transform(&self, index: usize) -> Result<Matrix4<f32>, RigError> {
        let bone = self.bones.get(index).ok_or(RigError::BoneOutOfRange {
            index,
            count: self.bones.len(),
        })?;

        let mut transform = bone.bind.to_matrix();
        let mut cursor = bone.parent;
        while let Some(parent) = cursor {
            let parent_bone = &self.bones[parent];
            transform = parent_bone.bind.to_matrix() * transform;
            cursor = parent_bone.parent;
        }

        Ok(transform)
    }

    pub fn bone_transform_by_name(&self, name: &str) -> Option<Matrix4<f32>> {
        self.find_bone(name)
            .and_then(|index| self.bone_transform(index).ok())
    }

    // ─── World → local rebinding ──────────────────────────────────────────────

    /// Snapshot every bone's bind transform, still authored in world space,
    /// for [`BoneGraph::rebind_to_local_space`].
    pub fn ensure_resolved(&self) -> BindResolution {
        BindResolution {
            generation: self.bind_generation,
            bind_worlds: self.bones.iter().map(|bone| bone.bind.to_matrix()).collect(),
        }
    }

    /// Reinterpret bind positions/rotations authored in world space as local
    /// to each bone's parent, then reset the pose.
    ///
    /// Each bone is expressed relative to its parent's world-space bind from
    /// `resolution`, so the result does not depend on which bones this call
    /// has already rewritten.
    pub fn rebind_to_local_space(&mut self, resolution: BindResolution) -> Result<(), RigError> {
        if resolution.generation != self.bind_generation
            || resolution.bind_worlds.len() != self.bones.len()
        {
            return Err(RigError::StaleResolution {
                taken: resolution.generation,
                current: self.bind_generation,
            });
        }

        for bone in &mut self.bones {
            let Some(parent) = bone.parent else {
                continue;
            };
            let Some(parent_inverse) = resolution.bind_worlds[parent].try_inverse() else {
                warn!(
                    "bone '{}' keeps its bind transform: parent transform is not invertible",
                    bone.name
                );
                continue;
            };

            bone.bind.position = parent_inverse
                .transform_point(&Point3::from(bone.bind.position))
                .coords;
            bone.bind.rotation = extract_rotation(&parent_inverse) * bone.bind.rotation;
        }

        self.bind_generation += 1;
        debug!("rebound {} bones to local space", self.bones.len());
        self.reset_pose();
        Ok(())
    }
}
