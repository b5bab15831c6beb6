//! Mesh file reading for meshview
//!
//! This crate provides the parsing capability consumed by the viewer shell:
//! raw file bytes in, a structured [`MeshBlock`] out. Currently the Gmsh MSH
//! format is supported (versions 2.2 ASCII/binary and 4.1 ASCII).

pub mod msh;

pub use msh::MshReader;

use meshview_core::{Error, MeshBlock, Result};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<MeshBlock>;
}

/// Auto-detect format by extension and read a mesh
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<MeshBlock> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some("msh") => MshReader::read_mesh(path),
        _ => Err(Error::UnsupportedFormat(format!(
            "unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};
    use meshview_core::ElementType;
    use std::fs;
    use std::io::Write;

    const TWO_TRIANGLES_V2: &str = "\
$MeshFormat
2.2 0 8
$EndMeshFormat
$Nodes
4
1 0.0 0.0 0.0
2 1.0 0.0 0.0
3 1.0 1.0 0.0
4 0.0 1.0 0.0
$EndNodes
$Elements
2
1 2 2 0 1 1 2 3
2 2 2 0 1 1 3 4
$EndElements
";

    #[test]
    fn reads_v2_ascii_triangles() {
        let block = MshReader::parse(TWO_TRIANGLES_V2.as_bytes()).unwrap();
        assert_eq!(block.node_count(), 4);
        assert_eq!(block.element_count(), 2);
        assert_eq!(block.count_of(ElementType::Triangle), 2);
        assert_eq!(block.elements[0].nodes, vec![0, 1, 2]);
        assert_eq!(block.elements[1].nodes, vec![0, 2, 3]);
    }

    #[test]
    fn remaps_sparse_node_tags() {
        let data = "\
$MeshFormat
2.2 0 8
$EndMeshFormat
$Nodes
3
10 0.0 0.0 0.0
20 1.0 0.0 0.0
35 0.0 1.0 0.0
$EndNodes
$Elements
1
1 2 2 0 1 10 20 35
$EndElements
";
        let block = MshReader::parse(data.as_bytes()).unwrap();
        assert_eq!(block.elements[0].nodes, vec![0, 1, 2]);
    }

    #[test]
    fn undefined_node_tag_is_a_parse_error() {
        let data = "\
$MeshFormat
2.2 0 8
$EndMeshFormat
$Nodes
1
1 0.0 0.0 0.0
$EndNodes
$Elements
1
1 2 2 0 1 1 2 3
$EndElements
";
        let err = MshReader::parse(data.as_bytes()).unwrap_err();
        assert!(err.is_parse(), "expected parse error, got {err:?}");
    }

    #[test]
    fn skips_unknown_sections_and_element_types() {
        let data = "\
$MeshFormat
2.2 0 8
$EndMeshFormat
$PhysicalNames
1
2 1 \"surface\"
$EndPhysicalNames
$Nodes
3
1 0.0 0.0 0.0
2 1.0 0.0 0.0
3 0.0 1.0 0.0
$EndNodes
$Elements
2
1 2 2 0 1 1 2 3
2 9 2 0 1 1 2 3 1 2 3
$EndElements
";
        // Type 9 (6-node triangle) is skipped, the linear triangle survives.
        let block = MshReader::parse(data.as_bytes()).unwrap();
        assert_eq!(block.element_count(), 1);
        assert_eq!(block.count_of(ElementType::Triangle), 1);
    }

    #[test]
    fn reads_v2_binary_little_endian() {
        let mut data = Vec::new();
        data.extend_from_slice(b"$MeshFormat\n2.2 1 8\n");
        data.write_i32::<LittleEndian>(1).unwrap();
        data.extend_from_slice(b"\n$EndMeshFormat\n$Nodes\n3\n");
        for (tag, coords) in [
            (1, [0.0, 0.0, 0.0]),
            (2, [1.0, 0.0, 0.0]),
            (3, [0.0, 1.0, 0.0]),
        ] {
            data.write_i32::<LittleEndian>(tag).unwrap();
            for c in coords {
                data.write_f64::<LittleEndian>(c).unwrap();
            }
        }
        data.extend_from_slice(b"\n$EndNodes\n$Elements\n1\n");
        // Block header: element type 2 (triangle), one element, two tags.
        data.write_i32::<LittleEndian>(2).unwrap();
        data.write_i32::<LittleEndian>(1).unwrap();
        data.write_i32::<LittleEndian>(2).unwrap();
        // Element record: tag, physical/geometric tags, node tags.
        for v in [1, 0, 1, 1, 2, 3] {
            data.write_i32::<LittleEndian>(v).unwrap();
        }
        data.extend_from_slice(b"\n$EndElements\n");

        let block = MshReader::parse(&data).unwrap();
        assert_eq!(block.node_count(), 3);
        assert_eq!(block.count_of(ElementType::Triangle), 1);
        assert_eq!(block.elements[0].nodes, vec![0, 1, 2]);
    }

    #[test]
    fn reads_v4_ascii() {
        let data = "\
$MeshFormat
4.1 0 8
$EndMeshFormat
$Nodes
1 4 1 4
2 1 0 4
1
2
3
4
0.0 0.0 0.0
1.0 0.0 0.0
1.0 1.0 0.0
0.0 1.0 0.0
$EndNodes
$Elements
1 1 1 1
2 1 3 1
1 1 2 3 4
$EndElements
";
        let block = MshReader::parse(data.as_bytes()).unwrap();
        assert_eq!(block.node_count(), 4);
        assert_eq!(block.count_of(ElementType::Quad), 1);
        assert_eq!(block.elements[0].nodes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn rejects_bad_magic() {
        let err = MshReader::parse(b"not a mesh file\n").unwrap_err();
        assert!(err.is_parse(), "expected parse error, got {err:?}");
    }

    #[test]
    fn rejects_truncated_nodes() {
        let data = "\
$MeshFormat
2.2 0 8
$EndMeshFormat
$Nodes
5
1 0.0 0.0 0.0
";
        let err = MshReader::parse(data.as_bytes()).unwrap_err();
        assert!(err.is_parse(), "expected parse error, got {err:?}");
    }

    #[test]
    fn rejects_binary_node_count_beyond_input() {
        let mut data = Vec::new();
        data.extend_from_slice(b"$MeshFormat\n2.2 1 8\n");
        data.write_i32::<LittleEndian>(1).unwrap();
        data.extend_from_slice(b"\n$EndMeshFormat\n$Nodes\n659000000000000000\n");
        let err = MshReader::parse(&data).unwrap_err();
        assert!(err.is_parse(), "expected parse error, got {err:?}");
    }

    #[test]
    fn rejects_ascii_node_count_beyond_input() {
        let data = "\
$MeshFormat
2.2 0 8
$EndMeshFormat
$Nodes
999999999999999999
1 0.0 0.0 0.0
";
        let err = MshReader::parse(data.as_bytes()).unwrap_err();
        assert!(err.is_parse(), "expected parse error, got {err:?}");
    }

    #[test]
    fn rejects_negative_binary_element_header() {
        let mut data = Vec::new();
        data.extend_from_slice(b"$MeshFormat\n2.2 1 8\n");
        data.write_i32::<LittleEndian>(1).unwrap();
        data.extend_from_slice(b"\n$EndMeshFormat\n$Nodes\n0\n$EndNodes\n$Elements\n1\n");
        // Block header: triangle, one element, negative tag count.
        data.write_i32::<LittleEndian>(2).unwrap();
        data.write_i32::<LittleEndian>(1).unwrap();
        data.write_i32::<LittleEndian>(-1).unwrap();
        let err = MshReader::parse(&data).unwrap_err();
        assert!(err.is_parse(), "expected parse error, got {err:?}");
    }

    #[test]
    fn rejects_binary_v4() {
        let mut data = Vec::new();
        data.extend_from_slice(b"$MeshFormat\n4.1 1 8\n");
        data.write_i32::<LittleEndian>(1).unwrap();
        data.extend_from_slice(b"\n$EndMeshFormat\n");
        let err = MshReader::parse(&data).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)), "got {err:?}");
    }

    #[test]
    fn rejects_unknown_version() {
        let data = "$MeshFormat\n9.9 0 8\n$EndMeshFormat\n";
        let err = MshReader::parse(data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)), "got {err:?}");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_mesh("does_not_exist.msh").unwrap_err();
        assert!(err.is_io(), "expected I/O error, got {err:?}");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = read_mesh("mesh.stl").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)), "got {err:?}");
    }

    #[test]
    fn reads_mesh_from_disk() {
        let temp_file = "test_read_mesh.msh";
        let mut file = fs::File::create(temp_file).unwrap();
        file.write_all(TWO_TRIANGLES_V2.as_bytes()).unwrap();
        drop(file);

        let block = read_mesh(temp_file).unwrap();
        assert_eq!(block.node_count(), 4);
        assert_eq!(block.element_count(), 2);

        let _ = fs::remove_file(temp_file);
    }
}
