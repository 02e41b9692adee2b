use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashSet},
};

use serde::Serialize;

use super::bone::Bone;
use crate::error::RigError;

/// Nested view of the bone hierarchy, roots first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoneTreeNode {
    pub index: usize,
    pub name: String,
    pub children: Vec<BoneTreeNode>,
}

// ─── Validation ───────────────────────────────────────────────────────────────

/// Validate parent links and return a parents-before-children resolve order.
///
/// The lowest-indexed bone whose parent is already resolved always comes
/// next, so a skeleton whose parents precede their children resolves in
/// plain index order.
pub(super) fn resolve_order(bones: &[Bone]) -> Result<Vec<usize>, RigError> {
    let mut names = HashSet::with_capacity(bones.len());
    for bone in bones {
        if !names.insert(bone.name.as_str()) {
            return Err(RigError::DuplicateBoneName {
                name: bone.name.clone(),
            });
        }
    }

    for (index, bone) in bones.iter().enumerate() {
        match bone.parent {
            Some(parent) if parent == index => {
                return Err(RigError::SelfParent {
                    bone: bone.name.clone(),
                });
            }
            Some(parent) if parent >= bones.len() => {
                return Err(RigError::DanglingParent {
                    bone: bone.name.clone(),
                    parent,
                    count: bones.len(),
                });
            }
            _ => {}
        }
    }

    let children = collect_children(bones);
    let mut order = Vec::with_capacity(bones.len());
    let mut ready: BinaryHeap<Reverse<usize>> = (0..bones.len())
        .filter(|&index| bones[index].parent.is_none())
        .map(Reverse)
        .collect();
    while let Some(Reverse(index)) = ready.pop() {
        order.push(index);
        ready.extend(children[index].iter().copied().map(Reverse));
    }

    if order.len() < bones.len() {
        let mut visited = vec![false; bones.len()];
        for &index in &order {
            visited[index] = true;
        }
        // Every unvisited bone leads into a cycle; walking up `len` links is
        // guaranteed to land on a member of it.
        let Some(mut cursor) = visited.iter().position(|seen| !seen) else {
            return Ok(order);
        };
        for _ in 0..bones.len() {
            if let Some(parent) = bones[cursor].parent {
                cursor = parent;
            }
        }
        return Err(RigError::ParentCycle {
            bone: bones[cursor].name.clone(),
        });
    }

    Ok(order)
}

pub(super) fn collect_children(bones: &[Bone]) -> Vec<Vec<usize>> {
    let mut children = vec![Vec::new(); bones.len()];
    for (index, bone) in bones.iter().enumerate() {
        if let Some(parent) = bone.parent
            && parent < bones.len()
        {
            children[parent].push(index);
        }
    }
    children
}

// ─── Tree view ────────────────────────────────────────────────────────────────

pub(super) fn build_tree(bones: &[Bone]) -> Vec<BoneTreeNode> {
    let children = collect_children(bones);
    (0..bones.len())
        .filter(|&index| bones[index].parent.is_none())
        .map(|index| build_node(bones, &children, index))
        .collect()
}

fn build_node(bones: &[Bone], children: &[Vec<usize>], index: usize) -> BoneTreeNode {
    BoneTreeNode {
        index,
        name: bones[index].name.clone(),
        children: children[index]
            .iter()
            .map(|&child| build_node(bones, children, child))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::BoneTransform;

    fn bone(name: &str, parent: Option<usize>) -> Bone {
        Bone::new(name, parent, BoneTransform::default())
    }

    #[test]
    fn given_children_before_parents_when_ordering_then_parents_come_first() {
        let bones = vec![bone("hand", Some(2)), bone("root", None), bone("arm", Some(1))];

        let order = resolve_order(&bones).expect("acyclic skeleton");
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn given_sorted_branching_skeleton_when_ordering_then_index_order_is_kept() {
        let bones = vec![
            bone("root", None),
            bone("a", Some(0)),
            bone("a_child", Some(1)),
            bone("b", Some(0)),
        ];

        let order = resolve_order(&bones).expect("acyclic skeleton");
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn given_self_parent_when_ordering_then_error_is_reported() {
        let bones = vec![bone("root", None), bone("loop", Some(1))];

        let error = resolve_order(&bones).unwrap_err();
        assert_eq!(
            error,
            RigError::SelfParent {
                bone: "loop".to_string()
            }
        );
    }

    #[test]
    fn given_two_bone_cycle_when_ordering_then_cycle_member_is_named() {
        let bones = vec![
            bone("root", None),
            bone("a", Some(2)),
            bone("b", Some(1)),
            bone("tail", Some(2)),
        ];

        match resolve_order(&bones) {
            Err(RigError::ParentCycle { bone }) => assert!(bone == "a" || bone == "b"),
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn given_out_of_range_parent_when_ordering_then_dangling_error_is_reported() {
        let bones = vec![bone("root", None), bone("orphan", Some(9))];

        assert!(matches!(
            resolve_order(&bones),
            Err(RigError::DanglingParent { parent: 9, count: 2, .. })
        ));
    }

    #[test]
    fn given_duplicate_names_when_ordering_then_error_is_reported() {
        let bones = vec![bone("root", None), bone("root", Some(0))];

        assert!(matches!(
            resolve_order(&bones),
            Err(RigError::DuplicateBoneName { .. })
        ));
    }

    #[test]
    fn given_branching_skeleton_when_building_tree_then_children_are_nested() {
        let bones = vec![
            bone("hips", None),
            bone("spine", Some(0)),
            bone("leg", Some(0)),
            bone("head", Some(1)),
        ];

        let tree = build_tree(&bones);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children[0].name, "head");
    }
}
