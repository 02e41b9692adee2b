use std::{mem, path::Path};

use anyhow::{Context, Result};
use gltf::{Document, mesh::Mode};
use log::{debug, info, warn};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::model::{SourceModel, SourceShape};
use crate::settings::PackSettings;
use crate::skeleton::{Bone, BoneGraph, BoneTransform};
use crate::vertex::{AttributeAssignment, IndexWidth, StreamValues, SubmeshIndices, VertexStream};

/// Load a glTF/GLB file into a [`SourceModel`].
pub fn import_model(path: &Path, settings: &PackSettings) -> Result<SourceModel> {
    let (document, buffers, _images) = gltf::import(path)
        .with_context(|| format!("failed to read glTF: {}", path.display()))?;

    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("model");

    let mut model = model_from_document(&document, &buffers, name)?;
    if settings.reset_pose_on_load {
        model.skeleton.reset_pose();
    }

    info!(
        "imported '{}': {} bones, {} shapes",
        model.name,
        model.skeleton.len(),
        model.shapes.len()
    );
    Ok(model)
}

/// Convert an already parsed document. Only the first skin becomes the
/// skeleton.
pub fn model_from_document(
    document: &Document,
    buffers: &[gltf::buffer::Data],
    name: &str,
) -> Result<SourceModel> {
    let skeleton = build_skeleton(document)?;
    let shapes = build_shapes(document, buffers);

    Ok(SourceModel {
        name: name.to_string(),
        skeleton,
        shapes,
    })
}

// ─── Skeleton ────────────────────────────────────────────────────────────────

fn build_skeleton(document: &Document) -> Result<BoneGraph> {
    let Some(skin) = document.skins().next() else {
        debug!("document has no skin; using an empty skeleton");
        return Ok(BoneGraph::empty());
    };

    let joint_nodes: Vec<usize> = skin.joints().map(|joint| joint.index()).collect();
    let mut bone_nodes = joint_nodes.clone();
    bone_nodes.sort_unstable();
    bone_nodes.dedup();

    let nodes: Vec<gltf::Node> = document.nodes().collect();
    let mut parent_of = vec![None; nodes.len()];
    for node in &nodes {
        for child in node.children() {
            parent_of[child.index()] = Some(node.index());
        }
    }

    let bone_of_node = |node: usize| bone_nodes.binary_search(&node).ok();

    let mut bones = Vec::with_capacity(bone_nodes.len());
    for &node_index in &bone_nodes {
        let node = &nodes[node_index];

        let mut ancestor = parent_of[node_index];
        let parent = loop {
            match ancestor {
                Some(candidate) => {
                    if let Some(bone) = bone_of_node(candidate) {
                        break Some(bone);
                    }
                    ancestor = parent_of[candidate];
                }
                None => break None,
            }
        };

        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node_index));
        bones.push(Bone::new(name, parent, node_bind(node)));
    }

    let remap_table: Vec<u32> = joint_nodes
        .iter()
        .filter_map(|&node| bone_of_node(node))
        .map(|bone| bone as u32)
        .collect();

    let skeleton = BoneGraph::new(bones)
        .with_context(|| format!("skin {} has an invalid joint hierarchy", skin.index()))?
        .with_remap_table(remap_table);
    Ok(skeleton)
}

fn node_bind(node: &gltf::Node) -> BoneTransform {
    let (translation, rotation, scale) = node.transform().decomposed();
    let [x, y, z, w] = rotation;
    BoneTransform::new(
        Vector3::from(translation),
        UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
        Vector3::from(scale),
    )
}

// ─── Geometry ────────────────────────────────────────────────────────────────

fn build_shapes(document: &Document, buffers: &[gltf::buffer::Data]) -> Vec<SourceShape> {
    let mut shapes = Vec::new();

    for mesh in document.meshes() {
        let base_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let mut groups: Vec<SourceShape> = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                warn!(
                    "skipping primitive {} of '{}': mode {:?} is not supported",
                    primitive.index(),
                    base_name,
                    primitive.mode()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));
            let streams = read_streams(&reader);
            let Some(vertex_count) = position_count(&streams) else {
                warn!(
                    "skipping primitive {} of '{}' without positions",
                    primitive.index(),
                    base_name
                );
                continue;
            };

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertex_count as u32).collect(),
            };

            add_primitive(&mut groups, streams, indices);
        }

        let group_count = groups.len();
        for (group, mut shape) in groups.into_iter().enumerate() {
            shape.name = if group_count == 1 {
                base_name.clone()
            } else {
                format!("{}_{}", base_name, group)
            };
            shapes.push(shape);
        }
    }

    shapes
}

fn read_streams<'a, 's, F>(reader: &gltf::mesh::Reader<'a, 's, F>) -> Vec<VertexStream>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let mut streams = Vec::new();

    if let Some(positions) = reader.read_positions() {
        streams.push(VertexStream::float(
            "_p0",
            positions.map(|[x, y, z]| [x, y, z, 0.0]).collect(),
        ));
    }
    if let Some(normals) = reader.read_normals() {
        streams.push(VertexStream::float(
            "_n0",
            normals.map(|[x, y, z]| [x, y, z, 0.0]).collect(),
        ));
    }
    if let Some(tangents) = reader.read_tangents() {
        streams.push(VertexStream::float("_t0", tangents.collect()));
    }
    if let Some(colors) = reader.read_colors(0) {
        streams.push(VertexStream::float("_c0", colors.into_rgba_f32().collect()));
    }

    let mut set = 0;
    while let Some(coords) = reader.read_tex_coords(set) {
        streams.push(VertexStream::float(
            format!("_u{}", set),
            coords.into_f32().map(|[u, v]| [u, v, 0.0, 0.0]).collect(),
        ));
        set += 1;
    }

    if let Some(joints) = reader.read_joints(0) {
        streams.push(VertexStream::int(
            "_i0",
            joints
                .into_u16()
                .map(|joint| joint.map(u32::from))
                .collect(),
        ));
    }
    if let Some(weights) = reader.read_weights(0) {
        streams.push(VertexStream::float("_w0", weights.into_f32().collect()));
    }

    streams
}

fn position_count(streams: &[VertexStream]) -> Option<usize> {
    streams
        .iter()
        .find(|stream| stream.name == "_p0")
        .map(VertexStream::len)
        .filter(|&count| count > 0)
}

fn same_stream_names(a: &[VertexStream], b: &[VertexStream]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(left, right)| left.name == right.name)
}

fn same_stream_types(a: &[VertexStream], b: &[VertexStream]) -> bool {
    a.iter()
        .zip(b)
        .all(|(left, right)| mem::discriminant(&left.values) == mem::discriminant(&right.values))
}

/// Append one primitive as a submesh of the group with the same stream names
/// and scalar types, opening a new group when there is none.
fn add_primitive(groups: &mut Vec<SourceShape>, streams: Vec<VertexStream>, indices: Vec<u32>) {
    let slot = groups.iter().position(|shape| {
        same_stream_names(&shape.streams, &streams) && same_stream_types(&shape.streams, &streams)
    });
    let slot = match slot {
        Some(slot) => slot,
        None => {
            if groups
                .iter()
                .any(|shape| same_stream_names(&shape.streams, &streams))
            {
                warn!("primitive changes vertex stream scalar types; packing it as a separate shape");
            }
            groups.push(SourceShape {
                name: String::new(),
                streams: streams.iter().map(empty_like).collect(),
                submeshes: Vec::new(),
                assignment: AttributeAssignment::new(),
            });
            groups.len() - 1
        }
    };
    let shape = &mut groups[slot];

    let first_vertex = shape.streams.first().map(VertexStream::len).unwrap_or(0) as u32;
    let max_index = indices.iter().max().copied().unwrap_or(0);
    shape.submeshes.push(SubmeshIndices {
        width: IndexWidth::for_max_index(max_index.saturating_add(first_vertex)),
        indices,
        first_vertex,
    });

    // Stream names and scalar types match the group's.
    for (target, source) in shape.streams.iter_mut().zip(streams) {
        match (&mut target.values, source.values) {
            (StreamValues::Float(values), StreamValues::Float(more)) => values.extend(more),
            (StreamValues::Int(values), StreamValues::Int(more)) => values.extend(more),
            _ => {}
        }
    }
}

fn empty_like(stream: &VertexStream) -> VertexStream {
    match stream.values {
        StreamValues::Float(_) => VertexStream::float(stream.name.clone(), Vec::new()),
        StreamValues::Int(_) => VertexStream::int(stream.name.clone(), Vec::new()),
    }
}
