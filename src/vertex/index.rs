use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// Element width of one submesh's indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    pub fn byte_size(self) -> usize {
        match self {
            IndexWidth::U16 => size_of::<u16>(),
            IndexWidth::U32 => size_of::<u32>(),
        }
    }

    /// Narrowest width able to hold `max_index`.
    pub fn for_max_index(max_index: u32) -> Self {
        if max_index <= u16::MAX as u32 {
            IndexWidth::U16
        } else {
            IndexWidth::U32
        }
    }

    fn max_value(self) -> u64 {
        match self {
            IndexWidth::U16 => u16::MAX as u64,
            IndexWidth::U32 => u32::MAX as u64,
        }
    }
}

/// Local indices of one submesh plus the vertex they are relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmeshIndices {
    pub indices: Vec<u32>,
    pub first_vertex: u32,
    pub width: IndexWidth,
}

impl SubmeshIndices {
    /// Largest index after rebasing, if any.
    pub fn max_rebased(&self) -> Option<u64> {
        self.indices
            .iter()
            .max()
            .map(|&index| index as u64 + self.first_vertex as u64)
    }
}

/// Where one submesh's indices landed in the flattened buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexRun {
    pub byte_offset: usize,
    pub count: usize,
    pub width: IndexWidth,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedIndices {
    pub data: Vec<u8>,
    pub runs: Vec<IndexRun>,
}

impl FlattenedIndices {
    /// Width shared by every run, or `None` when runs disagree or there are
    /// no runs.
    pub fn uniform_width(&self) -> Option<IndexWidth> {
        let first = self.runs.first()?.width;
        self.runs
            .iter()
            .all(|run| run.width == first)
            .then_some(first)
    }

    pub fn index_count(&self) -> usize {
        self.runs.iter().map(|run| run.count).sum()
    }
}

/// Concatenates submesh index lists into one little-endian buffer.
///
/// # Arguments
///
/// * `submeshes` - Local indices per submesh, each rebased by its
///   `first_vertex` and written at its declared width.
///
/// # Returns
///
/// The flattened bytes with one [`IndexRun`] per submesh, or `IndexOverflow`
/// (and no output) when a rebased index does not fit its submesh's width.
pub fn flatten_indices(submeshes: &[SubmeshIndices]) -> Result<FlattenedIndices, RigError> {
    for (submesh, part) in submeshes.iter().enumerate() {
        if let Some(value) = part.max_rebased()
            && value > part.width.max_value()
        {
            return Err(RigError::IndexOverflow {
                submesh,
                value,
                width: part.width,
            });
        }
    }

    let total_bytes = submeshes
        .iter()
        .map(|part| part.indices.len() * part.width.byte_size())
        .sum();
    let mut data = Vec::with_capacity(total_bytes);
    let mut runs = Vec::with_capacity(submeshes.len());

    for part in submeshes {
        runs.push(IndexRun {
            byte_offset: data.len(),
            count: part.indices.len(),
            width: part.width,
        });

        for &index in &part.indices {
            let rebased = index + part.first_vertex;
            match part.width {
                IndexWidth::U16 => data.extend_from_slice(&(rebased as u16).to_le_bytes()),
                IndexWidth::U32 => data.extend_from_slice(&rebased.to_le_bytes()),
            }
        }
    }

    Ok(FlattenedIndices { data, runs })
}
