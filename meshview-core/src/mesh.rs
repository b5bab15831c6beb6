//! Mesh data structures and functionality
//!
//! A parsed mesh file becomes a [`MeshBlock`]: dense node coordinates plus
//! elements keyed by their Gmsh element type. The viewer consumes the
//! [`SurfaceMesh`] lowered from it, which carries only triangles.

use crate::{Point3f, Vector3f};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Element types understood by the viewer, by Gmsh type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Point,
    Line,
    Triangle,
    Quad,
    Tetrahedron,
    Hexahedron,
    Prism,
    Pyramid,
}

impl ElementType {
    /// Map a Gmsh element type code to its element type.
    ///
    /// Returns `None` for codes the viewer does not handle (higher-order
    /// elements and the like); readers skip those elements.
    pub fn from_msh_code(code: u32) -> Option<ElementType> {
        match code {
            15 => Some(ElementType::Point),
            1 => Some(ElementType::Line),
            2 => Some(ElementType::Triangle),
            3 => Some(ElementType::Quad),
            4 => Some(ElementType::Tetrahedron),
            5 => Some(ElementType::Hexahedron),
            6 => Some(ElementType::Prism),
            7 => Some(ElementType::Pyramid),
            _ => None,
        }
    }

    /// Number of nodes in an element of this type
    pub fn node_count(&self) -> usize {
        match self {
            ElementType::Point => 1,
            ElementType::Line => 2,
            ElementType::Triangle => 3,
            ElementType::Quad => 4,
            ElementType::Tetrahedron => 4,
            ElementType::Hexahedron => 8,
            ElementType::Prism => 6,
            ElementType::Pyramid => 5,
        }
    }

    /// True for volume elements, whose boundary facets form the rendered surface
    pub fn is_volume(&self) -> bool {
        matches!(
            self,
            ElementType::Tetrahedron
                | ElementType::Hexahedron
                | ElementType::Prism
                | ElementType::Pyramid
        )
    }
}

/// A single mesh element: its type and its node indices into `MeshBlock::nodes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementType,
    pub nodes: Vec<u32>,
}

impl Element {
    pub fn new(kind: ElementType, nodes: Vec<u32>) -> Self {
        Self { kind, nodes }
    }
}

/// A structured mesh as produced by a mesh file reader
///
/// Node tags in mesh files are arbitrary and possibly sparse; readers remap
/// them so every `Element` holds dense, in-bounds indices into `nodes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshBlock {
    pub nodes: Vec<Point3f>,
    pub elements: Vec<Element>,
}

impl MeshBlock {
    /// Create a new empty mesh block
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Count the elements of one type
    pub fn count_of(&self, kind: ElementType) -> usize {
        self.elements.iter().filter(|e| e.kind == kind).count()
    }

    /// Check if the mesh block is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.elements.is_empty()
    }

    /// Lower the mesh block to a renderable triangle surface.
    ///
    /// Surface elements (triangles, quads) are kept as drawn; quads are
    /// fan-split. Volume elements contribute only their boundary facets: a
    /// facet shared by two volume elements is interior and dropped. Lines
    /// and points do not produce triangles.
    pub fn to_surface(&self) -> SurfaceMesh {
        let mut triangles = Vec::new();
        let mut facet_counts: HashMap<[u32; 4], u32> = HashMap::new();

        // First pass: count volume facets so shared ones can be dropped.
        for element in &self.elements {
            if element.kind.is_volume() {
                for facet in element_facets(element) {
                    *facet_counts.entry(facet_key(&facet)).or_insert(0) += 1;
                }
            }
        }

        // Second pass: emit surface elements and boundary facets in element
        // order, so the output is deterministic.
        for element in &self.elements {
            match element.kind {
                ElementType::Triangle => {
                    let n = &element.nodes;
                    triangles.push([n[0], n[1], n[2]]);
                }
                ElementType::Quad => {
                    let n = &element.nodes;
                    triangles.push([n[0], n[1], n[2]]);
                    triangles.push([n[0], n[2], n[3]]);
                }
                kind if kind.is_volume() => {
                    for facet in element_facets(element) {
                        if facet_counts[&facet_key(&facet)] == 1 {
                            push_facet(&mut triangles, &facet);
                        }
                    }
                }
                _ => {}
            }
        }

        SurfaceMesh {
            vertices: self.nodes.clone(),
            triangles,
            normals: None,
        }
    }
}

/// A boundary facet of a volume element: 3 or 4 oriented node indices
type Facet = (usize, [u32; 4]);

fn tri(a: u32, b: u32, c: u32) -> Facet {
    (3, [a, b, c, 0])
}

fn quad(a: u32, b: u32, c: u32, d: u32) -> Facet {
    (4, [a, b, c, d])
}

/// Outward-oriented facets of a volume element, in Gmsh node ordering
fn element_facets(element: &Element) -> Vec<Facet> {
    let n = &element.nodes;
    match element.kind {
        ElementType::Tetrahedron => vec![
            tri(n[0], n[2], n[1]),
            tri(n[0], n[1], n[3]),
            tri(n[1], n[2], n[3]),
            tri(n[0], n[3], n[2]),
        ],
        ElementType::Hexahedron => vec![
            quad(n[0], n[3], n[2], n[1]),
            quad(n[4], n[5], n[6], n[7]),
            quad(n[0], n[1], n[5], n[4]),
            quad(n[1], n[2], n[6], n[5]),
            quad(n[2], n[3], n[7], n[6]),
            quad(n[3], n[0], n[4], n[7]),
        ],
        ElementType::Prism => vec![
            tri(n[0], n[2], n[1]),
            tri(n[3], n[4], n[5]),
            quad(n[0], n[1], n[4], n[3]),
            quad(n[1], n[2], n[5], n[4]),
            quad(n[2], n[0], n[3], n[5]),
        ],
        ElementType::Pyramid => vec![
            quad(n[0], n[3], n[2], n[1]),
            tri(n[0], n[1], n[4]),
            tri(n[1], n[2], n[4]),
            tri(n[2], n[3], n[4]),
            tri(n[3], n[0], n[4]),
        ],
        _ => vec![],
    }
}

/// Orientation-independent key for facet sharing: sorted nodes, tris padded
fn facet_key(facet: &Facet) -> [u32; 4] {
    let (len, nodes) = facet;
    let mut key = [u32::MAX; 4];
    key[..*len].copy_from_slice(&nodes[..*len]);
    key[..*len].sort_unstable();
    key
}

fn push_facet(triangles: &mut Vec<[u32; 3]>, facet: &Facet) {
    let (len, n) = facet;
    triangles.push([n[0], n[1], n[2]]);
    if *len == 4 {
        triangles.push([n[0], n[2], n[3]]);
    }
}

/// A triangle mesh ready for rendering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurfaceMesh {
    pub vertices: Vec<Point3f>,
    pub triangles: Vec<[u32; 3]>,
    pub normals: Option<Vec<Vector3f>>,
}

impl SurfaceMesh {
    /// Create a new empty surface mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a surface mesh from vertices and triangles
    pub fn from_vertices_and_triangles(vertices: Vec<Point3f>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            normals: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }

    /// Compute area-weighted vertex normals from triangle geometry.
    ///
    /// Degenerate triangles contribute nothing; vertices used by no triangle
    /// get a unit Z normal so the buffer stays well-formed.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3f::zeros(); self.vertices.len()];

        for t in &self.triangles {
            let v0 = self.vertices[t[0] as usize];
            let v1 = self.vertices[t[1] as usize];
            let v2 = self.vertices[t[2] as usize];

            // Cross product length is twice the triangle area, so the raw
            // sum is already area-weighted.
            let face_normal = (v1 - v0).cross(&(v2 - v0));
            for &i in t {
                normals[i as usize] += face_normal;
            }
        }

        for normal in &mut normals {
            let len = normal.norm();
            if len > f32::EPSILON {
                *normal /= len;
            } else {
                *normal = Vector3f::new(0.0, 0.0, 1.0);
            }
        }

        self.normals = Some(normals);
    }

    /// Axis-aligned bounding box of the vertices, if any
    pub fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices[1..] {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tet_nodes() -> Vec<Point3f> {
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn triangle_elements_pass_through() {
        let block = MeshBlock {
            nodes: unit_tet_nodes(),
            elements: vec![Element::new(ElementType::Triangle, vec![0, 1, 2])],
        };
        let surface = block.to_surface();
        assert_eq!(surface.triangle_count(), 1);
        assert_eq!(surface.triangles[0], [0, 1, 2]);
    }

    #[test]
    fn quad_elements_are_split() {
        let block = MeshBlock {
            nodes: vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            elements: vec![Element::new(ElementType::Quad, vec![0, 1, 2, 3])],
        };
        let surface = block.to_surface();
        assert_eq!(surface.triangle_count(), 2);
    }

    #[test]
    fn single_tet_exposes_all_faces() {
        let block = MeshBlock {
            nodes: unit_tet_nodes(),
            elements: vec![Element::new(ElementType::Tetrahedron, vec![0, 1, 2, 3])],
        };
        let surface = block.to_surface();
        assert_eq!(surface.triangle_count(), 4);
    }

    #[test]
    fn shared_tet_face_is_interior() {
        let mut nodes = unit_tet_nodes();
        nodes.push(Point3f::new(1.0, 1.0, 1.0));
        let block = MeshBlock {
            nodes,
            elements: vec![
                Element::new(ElementType::Tetrahedron, vec![0, 1, 2, 3]),
                Element::new(ElementType::Tetrahedron, vec![1, 2, 3, 4]),
            ],
        };
        // 8 faces total, the shared (1,2,3) face is dropped from both sides.
        let surface = block.to_surface();
        assert_eq!(surface.triangle_count(), 6);
    }

    #[test]
    fn hex_surface_is_twelve_triangles() {
        let nodes = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
            Point3f::new(1.0, 0.0, 1.0),
            Point3f::new(1.0, 1.0, 1.0),
            Point3f::new(0.0, 1.0, 1.0),
        ];
        let block = MeshBlock {
            nodes,
            elements: vec![Element::new(
                ElementType::Hexahedron,
                vec![0, 1, 2, 3, 4, 5, 6, 7],
            )],
        };
        let surface = block.to_surface();
        assert_eq!(surface.triangle_count(), 12);
    }

    #[test]
    fn lines_and_points_produce_no_triangles() {
        let block = MeshBlock {
            nodes: unit_tet_nodes(),
            elements: vec![
                Element::new(ElementType::Line, vec![0, 1]),
                Element::new(ElementType::Point, vec![2]),
            ],
        };
        assert_eq!(block.to_surface().triangle_count(), 0);
    }

    #[test]
    fn flat_triangle_normals_point_up() {
        let mut surface = SurfaceMesh::from_vertices_and_triangles(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        surface.compute_vertex_normals();
        let normals = surface.normals.as_ref().unwrap();
        for n in normals {
            assert_relative_eq!(n.x, 0.0, epsilon = 1e-6);
            assert_relative_eq!(n.y, 0.0, epsilon = 1e-6);
            assert_relative_eq!(n.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn unused_vertex_gets_default_normal() {
        let mut surface = SurfaceMesh::from_vertices_and_triangles(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(5.0, 5.0, 5.0),
            ],
            vec![[0, 1, 2]],
        );
        surface.compute_vertex_normals();
        let normals = surface.normals.as_ref().unwrap();
        assert_relative_eq!(normals[3].norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn bounding_box_spans_vertices() {
        let surface = SurfaceMesh::from_vertices_and_triangles(
            vec![
                Point3f::new(-1.0, 2.0, 0.5),
                Point3f::new(3.0, -4.0, 0.0),
                Point3f::new(0.0, 0.0, 7.0),
            ],
            vec![[0, 1, 2]],
        );
        let (min, max) = surface.bounding_box().unwrap();
        assert_eq!(min, Point3f::new(-1.0, -4.0, 0.0));
        assert_eq!(max, Point3f::new(3.0, 2.0, 7.0));
    }

    #[test]
    fn empty_mesh_has_no_bounding_box() {
        assert!(SurfaceMesh::new().bounding_box().is_none());
    }

    #[test]
    fn msh_codes_map_to_element_types() {
        assert_eq!(ElementType::from_msh_code(2), Some(ElementType::Triangle));
        assert_eq!(ElementType::from_msh_code(4), Some(ElementType::Tetrahedron));
        assert_eq!(ElementType::from_msh_code(15), Some(ElementType::Point));
        assert_eq!(ElementType::from_msh_code(99), None);
    }
}
