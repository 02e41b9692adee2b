use log::debug;
use serde::Serialize;

use super::assignment::AttributeAssignment;
use super::catalog::{AttributeSemantic, ScalarType, shader_name};

/// One destination attribute placed inside the interleaved vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAttribute {
    /// Destination (shader-facing) attribute name.
    pub name: String,
    /// Source attribute stream the data is read from.
    pub source: String,
    pub semantic: AttributeSemantic,
    pub element_count: usize,
    pub scalar_type: ScalarType,
    /// Byte offset within one vertex.
    pub offset: usize,
    /// First placement of its source attribute. Fan-out duplicates reuse the
    /// canonical offset and add nothing to the stride.
    pub canonical: bool,
}

impl PlannedAttribute {
    pub fn byte_size(&self) -> usize {
        self.element_count * self.scalar_type.byte_size()
    }

    pub fn stride_contribution(&self) -> usize {
        if self.canonical { self.byte_size() } else { 0 }
    }

    pub fn shader_name(&self) -> &str {
        shader_name(&self.name)
    }
}

/// Planned interleaved layout: attributes in source encounter order plus the
/// total vertex stride.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VertexLayout {
    pub attributes: Vec<PlannedAttribute>,
    pub stride: usize,
}

impl VertexLayout {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&PlannedAttribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }
}

/// Plans the interleaved layout for a shape's source attributes.
///
/// Unknown attribute codes and sources without a binding are skipped. Offsets
/// accumulate in source order, never destination order.
///
/// # Arguments
///
/// * `source_attributes` - Source attribute names (`_p0`, `_u1`, ...) in stream order.
/// * `assignment` - Material bindings; empty keeps source names as destinations.
///
/// # Returns
///
/// Planned attributes with byte offsets, plus the vertex stride.
pub fn plan_layout<I, S>(source_attributes: I, assignment: &AttributeAssignment) -> VertexLayout
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut attributes = Vec::new();
    let mut offset = 0usize;

    for source in source_attributes {
        let source = source.as_ref();
        let Some(semantic) = AttributeSemantic::from_attribute_name(source) else {
            debug!("skipping vertex attribute '{}' with unknown semantic", source);
            continue;
        };

        let attribute_offset = offset;
        let place = move |name: &str, canonical: bool| PlannedAttribute {
            name: name.to_string(),
            source: source.to_string(),
            semantic,
            element_count: semantic.element_count(),
            scalar_type: semantic.scalar_type(),
            offset: attribute_offset,
            canonical,
        };

        if assignment.is_empty() {
            attributes.push(place(source, true));
            offset += semantic.byte_size();
            continue;
        }

        let mut placed = false;
        for destination in assignment.destinations_for(source) {
            attributes.push(place(destination, !placed));
            placed = true;
        }

        if placed {
            offset += semantic.byte_size();
        } else {
            debug!("vertex attribute '{}' is not bound by the material", source);
        }
    }

    VertexLayout {
        attributes,
        stride: offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_empty_assignment_when_planning_then_offsets_increase_by_element_size() {
        let layout = plan_layout(["_p0", "_n0", "_u0", "_i0"], &AttributeAssignment::new());

        let offsets: Vec<usize> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 32]);
        assert_eq!(layout.stride, 48);
        assert!(layout.attributes.iter().all(|a| a.canonical));
        assert_eq!(
            layout.stride,
            layout.attributes.iter().map(PlannedAttribute::stride_contribution).sum::<usize>()
        );
        assert_eq!(layout.find("_i0").map(|a| a.scalar_type), Some(ScalarType::Int));
    }

    #[test]
    fn given_same_inputs_when_planning_twice_then_layouts_are_identical() {
        let assignment = AttributeAssignment::new().bind("_p0", "_p0").bind("_u0", "_u1");
        let sources = ["_p0", "_u0", "_c0"];

        assert_eq!(
            plan_layout(sources, &assignment),
            plan_layout(sources, &assignment)
        );
    }

    #[test]
    fn given_fan_out_when_planning_then_duplicates_share_offset_without_stride() {
        let assignment = AttributeAssignment::new()
            .bind("_p0", "_p0")
            .bind("_u0", "_u0")
            .bind("_u0", "_u1");

        let layout = plan_layout(["_p0", "_u0"], &assignment);

        let u0 = layout.find("_u0").expect("u0 planned");
        let u1 = layout.find("_u1").expect("u1 planned");
        assert_eq!(u0.offset, u1.offset);
        assert!(u0.canonical);
        assert!(!u1.canonical);
        assert_eq!(u1.source, "_u0");
        assert_eq!(layout.stride, 12 + 8);
    }

    #[test]
    fn given_unknown_and_unbound_attributes_when_planning_then_they_are_skipped() {
        let assignment = AttributeAssignment::new().bind("_n0", "_n0").bind("_zz", "_zz");

        let layout = plan_layout(["_x0", "_p0", "_n0"], &assignment);

        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].name, "_n0");
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.stride, 12);
    }

    #[test]
    fn given_two_texcoord_sets_when_planning_then_each_takes_its_own_slice() {
        let layout = plan_layout(["_u0", "_u1"], &AttributeAssignment::new());

        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.stride, 16);
    }

    #[test]
    fn given_destination_order_differs_when_planning_then_source_order_decides_offsets() {
        let assignment = AttributeAssignment::new().bind("_n0", "_n0").bind("_p0", "_p0");

        let layout = plan_layout(["_p0", "_n0"], &assignment);

        assert_eq!(layout.find("_p0").map(|a| a.offset), Some(0));
        assert_eq!(layout.find("_n0").map(|a| a.offset), Some(12));
    }

    #[test]
    fn given_no_attributes_when_planning_then_layout_is_empty() {
        let layout = plan_layout(Vec::<String>::new(), &AttributeAssignment::new());

        assert!(layout.is_empty());
        assert_eq!(layout.stride, 0);
    }
}
