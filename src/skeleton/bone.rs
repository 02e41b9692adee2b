use nalgebra::{Matrix4, UnitQuaternion, Vector3};

use super::BoneGraph;
use super::transform::compose_trs;

/// Translation, rotation and scale of a bone relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl BoneTransform {
    pub fn new(
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Local matrix: scale and rotation about the origin, then translation.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        compose_trs(&self.position, &self.rotation, &self.scale)
    }
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Current (possibly animated) state of a bone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BonePose {
    pub transform: BoneTransform,
    /// Runtime override that enables segment scale compensation even when the
    /// bone itself does not request it.
    pub use_segment_scale_compensate: bool,
    /// The pose is expressed in the graph's root space, ignoring ancestors.
    pub world_transform: bool,
}

impl BonePose {
    pub fn from_transform(transform: BoneTransform) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }
}

/// A single joint of a [`BoneGraph`].
///
/// Bones are only reachable through shared references once they are owned by a
/// graph, so parent links stay valid for the lifetime of the graph.
#[derive(Debug)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    pub bind: BoneTransform,
    pub use_segment_scale_compensate: bool,
    pub(super) pose: BonePose,
    pub(super) attachments: Vec<BoneGraph>,
}

impl Bone {
    pub fn new(name: impl Into<String>, parent: Option<usize>, bind: BoneTransform) -> Self {
        Self {
            name: name.into(),
            parent,
            bind,
            use_segment_scale_compensate: false,
            pose: BonePose::from_transform(bind),
            attachments: Vec::new(),
        }
    }

    pub fn with_segment_scale_compensate(mut self, enabled: bool) -> Self {
        self.use_segment_scale_compensate = enabled;
        self
    }

    pub fn pose(&self) -> &BonePose {
        &self.pose
    }

    /// Skeletons hosted by this bone.
    pub fn attachments(&self) -> &[BoneGraph] {
        &self.attachments
    }

    pub(super) fn compensates_parent_scale(&self) -> bool {
        self.use_segment_scale_compensate || self.pose.use_segment_scale_compensate
    }
}
