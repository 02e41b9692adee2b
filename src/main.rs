use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};

use anyhow::{Context, Result};
use log::{error, info};
use serde::Serialize;

use rigpack::import::import_model;
use rigpack::model::{ShapeBuffers, SourceModel};
use rigpack::settings::{PackSettings, load_pack_settings, save_pack_settings};
use rigpack::skeleton::BoneTreeNode;
use rigpack::vertex::{IndexRun, VertexLayout};

#[derive(Serialize)]
struct ShapeManifest<'a> {
    name: &'a str,
    vertex_count: usize,
    layout: &'a VertexLayout,
    index_runs: &'a [IndexRun],
}

#[derive(Serialize)]
struct BoneManifest<'a> {
    name: &'a str,
    parent: Option<usize>,
    /// Column-major.
    world: Vec<f32>,
    inverse_bind: Vec<f32>,
}

#[derive(Serialize)]
struct SkeletonManifest<'a> {
    bones: Vec<BoneManifest<'a>>,
    tree: Vec<BoneTreeNode>,
    remap_table: &'a [u32],
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 && args.len() != 4 {
        eprintln!("Usage: rigpack <input.gltf|input.glb> <output-dir> [settings.json]");
        process::exit(2);
    }

    let input = PathBuf::from(&args[1]);
    let output_dir = PathBuf::from(&args[2]);
    let settings = match args.get(3) {
        Some(path) => load_pack_settings(Path::new(path))?,
        None => PackSettings::default(),
    };

    let model = import_model(&input, &settings)?;
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let mut packed = Vec::new();
    for (shape, result) in model.shapes.iter().zip(model.pack_all(&settings)) {
        match result {
            Ok(buffers) => {
                write_shape(&output_dir, &buffers)?;
                packed.push(buffers);
            }
            Err(err) => error!("shape '{}' was not packed: {}", shape.name, err),
        }
    }

    let manifests: Vec<ShapeManifest> = packed
        .iter()
        .map(|buffers| ShapeManifest {
            name: &buffers.name,
            vertex_count: buffers.vertex_count,
            layout: &buffers.layout,
            index_runs: &buffers.indices.runs,
        })
        .collect();
    write_json(&output_dir.join("layout.json"), &manifests)?;
    write_json(&output_dir.join("skeleton.json"), &skeleton_manifest(&model))?;
    save_pack_settings(&output_dir.join("settings.json"), &settings)?;

    println!("Model: {}", model.name);
    println!("Bones: {}", model.skeleton.len());
    println!("Shapes: {} packed, {} failed", packed.len(), model.shapes.len() - packed.len());

    Ok(())
}

fn write_shape(output_dir: &Path, buffers: &ShapeBuffers) -> Result<()> {
    let vertex_path = output_dir.join(format!("{}.vtx", buffers.name));
    fs::write(&vertex_path, &buffers.vertices)
        .with_context(|| format!("failed to write vertex buffer: {}", vertex_path.display()))?;

    let index_path = output_dir.join(format!("{}.idx", buffers.name));
    fs::write(&index_path, &buffers.indices.data)
        .with_context(|| format!("failed to write index buffer: {}", index_path.display()))?;

    info!(
        "wrote '{}': {} vertex bytes, {} index bytes",
        buffers.name,
        buffers.vertices.len(),
        buffers.indices.data.len()
    );
    Ok(())
}

fn skeleton_manifest(model: &SourceModel) -> SkeletonManifest<'_> {
    let skeleton = &model.skeleton;
    let bones = skeleton
        .bones()
        .iter()
        .zip(skeleton.world_matrices())
        .zip(skeleton.inverse_bind_matrices())
        .map(|((bone, world), inverse_bind)| BoneManifest {
            name: &bone.name,
            parent: bone.parent,
            world: world.as_slice().to_vec(),
            inverse_bind: inverse_bind.as_slice().to_vec(),
        })
        .collect();

    SkeletonManifest {
        bones,
        tree: skeleton.bone_tree(),
        remap_table: skeleton.remap_table(),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
