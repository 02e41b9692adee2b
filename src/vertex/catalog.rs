use serde::{Deserialize, Serialize};

/// Scalar type of one attribute lane in the interleaved buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Float,
    Int,
}

impl ScalarType {
    pub fn byte_size(self) -> usize {
        match self {
            ScalarType::Float => size_of::<f32>(),
            ScalarType::Int => size_of::<i32>(),
        }
    }
}

/// Known vertex attribute semantics, keyed by the two-character prefix of a
/// source attribute name (`_p0`, `_u1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeSemantic {
    Position,
    Normal,
    Tangent,
    Bitangent,
    Color,
    TexCoord,
    BoneWeight,
    BoneIndex,
}

impl AttributeSemantic {
    pub const ALL: [AttributeSemantic; 8] = [
        AttributeSemantic::Position,
        AttributeSemantic::Normal,
        AttributeSemantic::Tangent,
        AttributeSemantic::Bitangent,
        AttributeSemantic::Color,
        AttributeSemantic::TexCoord,
        AttributeSemantic::BoneWeight,
        AttributeSemantic::BoneIndex,
    ];

    pub fn code(self) -> &'static str {
        match self {
            AttributeSemantic::Position => "_p",
            AttributeSemantic::Normal => "_n",
            AttributeSemantic::Tangent => "_t",
            AttributeSemantic::Bitangent => "_b",
            AttributeSemantic::Color => "_c",
            AttributeSemantic::TexCoord => "_u",
            AttributeSemantic::BoneWeight => "_w",
            AttributeSemantic::BoneIndex => "_i",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|semantic| semantic.code() == code)
    }

    /// Semantic of a source attribute name such as `_u1`.
    pub fn from_attribute_name(name: &str) -> Option<Self> {
        name.get(..2).and_then(Self::from_code)
    }

    pub fn element_count(self) -> usize {
        match self {
            AttributeSemantic::TexCoord => 2,
            AttributeSemantic::Position | AttributeSemantic::Normal => 3,
            AttributeSemantic::Tangent
            | AttributeSemantic::Bitangent
            | AttributeSemantic::Color
            | AttributeSemantic::BoneWeight
            | AttributeSemantic::BoneIndex => 4,
        }
    }

    pub fn scalar_type(self) -> ScalarType {
        match self {
            AttributeSemantic::BoneIndex => ScalarType::Int,
            _ => ScalarType::Float,
        }
    }

    /// Bytes one attribute of this semantic occupies in a vertex.
    pub fn byte_size(self) -> usize {
        self.element_count() * self.scalar_type().byte_size()
    }
}

/// Shader-facing name for a destination attribute name. Unlisted names are
/// returned unchanged.
pub fn shader_name(name: &str) -> &str {
    match name {
        "_p0" => "vPosition",
        "_n0" => "vNormal",
        "_w0" => "vBoneWeight",
        "_i0" => "vBoneIndex",
        "_u0" => "vTexCoord0",
        "_u1" => "vTexCoord1",
        "_u2" => "vTexCoord2",
        "_c0" => "vColor",
        "_t0" => "vTangent",
        "_b0" => "vBitangent",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_each_semantic_when_round_tripping_code_then_same_semantic_is_found() {
        for semantic in AttributeSemantic::ALL {
            assert_eq!(AttributeSemantic::from_code(semantic.code()), Some(semantic));
        }
    }

    #[test]
    fn given_attribute_names_when_resolving_semantic_then_prefix_decides() {
        assert_eq!(
            AttributeSemantic::from_attribute_name("_u1"),
            Some(AttributeSemantic::TexCoord)
        );
        assert_eq!(
            AttributeSemantic::from_attribute_name("_i0"),
            Some(AttributeSemantic::BoneIndex)
        );
        assert_eq!(AttributeSemantic::from_attribute_name("_x0"), None);
        assert_eq!(AttributeSemantic::from_attribute_name("_"), None);
    }

    #[test]
    fn given_catalog_when_sizing_then_constants_match_layout_rules() {
        assert_eq!(AttributeSemantic::TexCoord.byte_size(), 8);
        assert_eq!(AttributeSemantic::Position.byte_size(), 12);
        assert_eq!(AttributeSemantic::BoneIndex.byte_size(), 16);
        assert_eq!(AttributeSemantic::BoneIndex.scalar_type(), ScalarType::Int);
        assert_eq!(AttributeSemantic::Color.scalar_type(), ScalarType::Float);
    }

    #[test]
    fn given_destination_names_when_mapping_to_shader_then_known_names_are_translated() {
        assert_eq!(shader_name("_p0"), "vPosition");
        assert_eq!(shader_name("_u2"), "vTexCoord2");
        assert_eq!(shader_name("_u3"), "_u3");
    }
}
