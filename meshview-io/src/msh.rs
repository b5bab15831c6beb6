//! Gmsh MSH format support
//!
//! The reader handles the format versions produced by mainstream Gmsh
//! releases: 2.2 in ASCII and binary (either endianness), and 4.1 in ASCII.
//! Sections the viewer has no use for (`$PhysicalNames`, `$Entities`, ...)
//! are skipped, as are element types outside [`ElementType`]'s reach.

use crate::MeshReader;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use meshview_core::{Element, ElementType, Error, MeshBlock, Point3f, Result};
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Reader for Gmsh `.msh` files
pub struct MshReader;

impl MshReader {
    /// Parse a whole MSH file from raw bytes.
    pub fn parse(data: &[u8]) -> Result<MeshBlock> {
        let mut cursor = Cursor::new(data);

        let magic = cursor.expect_content_line()?;
        if magic != "$MeshFormat" {
            return Err(Error::Parse(format!(
                "expected $MeshFormat header, found {magic:?}"
            )));
        }

        let format_line = cursor.expect_content_line()?;
        let mut fields = format_line.split_whitespace();
        let version = fields.next().unwrap_or("");
        let file_type: u32 = parse_num(fields.next(), "file type")?;
        let _data_size: u32 = parse_num(fields.next(), "data size")?;
        let binary = file_type == 1;

        // Owned copy: the cursor keeps borrowing the input below.
        let version = version.to_string();

        let endian = if binary {
            let probe = cursor.read_bytes(4, "$MeshFormat endianness probe")?;
            let endian = match (LittleEndian::read_i32(probe), BigEndian::read_i32(probe)) {
                (1, _) => Endian::Little,
                (_, 1) => Endian::Big,
                _ => {
                    return Err(Error::Parse(
                        "invalid endianness probe in $MeshFormat".to_string(),
                    ))
                }
            };
            cursor.skip_newline();
            endian
        } else {
            Endian::Little
        };

        cursor.expect_line("$EndMeshFormat")?;

        let layout = match version.as_str() {
            "2.2" | "2.1" | "2" => {
                if binary {
                    Layout::V2Binary(endian)
                } else {
                    Layout::V2Ascii
                }
            }
            "4.1" if !binary => Layout::V4Ascii,
            "4.1" | "4" => {
                return Err(Error::UnsupportedFormat(
                    "binary MSH 4.x files are not supported".to_string(),
                ))
            }
            other => {
                return Err(Error::UnsupportedFormat(format!(
                    "MSH version {other} is not supported"
                )))
            }
        };

        let mut nodes: Vec<Point3f> = Vec::new();
        let mut node_index: HashMap<u64, u32> = HashMap::new();
        let mut elements: Vec<Element> = Vec::new();

        while let Some(section) = cursor.next_content_line()? {
            match section {
                "$Nodes" => {
                    match layout {
                        Layout::V2Ascii => parse_nodes_v2_ascii(&mut cursor, &mut nodes, &mut node_index)?,
                        Layout::V2Binary(endian) => {
                            parse_nodes_v2_binary(&mut cursor, endian, &mut nodes, &mut node_index)?
                        }
                        Layout::V4Ascii => parse_nodes_v4_ascii(&mut cursor, &mut nodes, &mut node_index)?,
                    }
                    cursor.expect_line("$EndNodes")?;
                }
                "$Elements" => {
                    match layout {
                        Layout::V2Ascii => parse_elements_v2_ascii(&mut cursor, &node_index, &mut elements)?,
                        Layout::V2Binary(endian) => {
                            parse_elements_v2_binary(&mut cursor, endian, &node_index, &mut elements)?
                        }
                        Layout::V4Ascii => parse_elements_v4_ascii(&mut cursor, &node_index, &mut elements)?,
                    }
                    cursor.expect_line("$EndElements")?;
                }
                other if other.starts_with('$') => {
                    log::debug!("skipping MSH section {other}");
                    cursor.skip_section(other)?;
                }
                other => {
                    return Err(Error::Parse(format!(
                        "unexpected content outside a section: {other:?}"
                    )))
                }
            }
        }

        Ok(MeshBlock { nodes, elements })
    }
}

impl MeshReader for MshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<MeshBlock> {
        let data = fs::read(path)?;
        Self::parse(&data)
    }
}

#[derive(Clone, Copy)]
enum Layout {
    V2Ascii,
    V2Binary(Endian),
    V4Ascii,
}

#[derive(Clone, Copy)]
enum Endian {
    Little,
    Big,
}

impl Endian {
    fn i32(self, buf: &[u8]) -> i32 {
        match self {
            Endian::Little => LittleEndian::read_i32(buf),
            Endian::Big => BigEndian::read_i32(buf),
        }
    }

    fn f64(self, buf: &[u8]) -> f64 {
        match self {
            Endian::Little => LittleEndian::read_f64(buf),
            Endian::Big => BigEndian::read_f64(buf),
        }
    }
}

/// Byte cursor over the file contents.
///
/// MSH mixes line-oriented text with raw binary payloads, so this walks the
/// input as bytes and interprets lines on demand.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_line(&mut self) -> Result<&'a str> {
        if self.pos >= self.data.len() {
            return Err(Error::Parse("unexpected end of file".to_string()));
        }
        let rest = &self.data[self.pos..];
        let (end, next) = match rest.iter().position(|&b| b == b'\n') {
            Some(i) => (i, i + 1),
            None => (rest.len(), rest.len()),
        };
        self.pos += next;
        let mut line = &rest[..end];
        if line.ends_with(b"\r") {
            line = &line[..line.len() - 1];
        }
        std::str::from_utf8(line)
            .map(str::trim)
            .map_err(|_| Error::Parse("non-text data where a line was expected".to_string()))
    }

    /// Next non-empty line, or `None` at end of input.
    fn next_content_line(&mut self) -> Result<Option<&'a str>> {
        while self.pos < self.data.len() {
            let line = self.read_line()?;
            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Next non-empty line, failing at end of input.
    fn expect_content_line(&mut self) -> Result<&'a str> {
        self.next_content_line()?
            .ok_or_else(|| Error::Parse("unexpected end of file".to_string()))
    }

    fn expect_line(&mut self, expected: &str) -> Result<()> {
        let line = self.expect_content_line()?;
        if line != expected {
            return Err(Error::Parse(format!(
                "expected {expected}, found {line:?}"
            )));
        }
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_bytes(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(Error::Parse(format!("truncated file while reading {what}")));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Consume the line break following a binary payload, if present.
    fn skip_newline(&mut self) {
        if self.data.get(self.pos) == Some(&b'\r') {
            self.pos += 1;
        }
        if self.data.get(self.pos) == Some(&b'\n') {
            self.pos += 1;
        }
    }

    /// Skip a section body up to and including its `$End...` terminator.
    fn skip_section(&mut self, name: &'a str) -> Result<()> {
        let terminator = format!("$End{}", &name[1..]);
        loop {
            let line = self.read_line().map_err(|_| {
                Error::Parse(format!("section {name} is missing its {terminator}"))
            })?;
            if line == terminator {
                return Ok(());
            }
        }
    }
}

/// Byte length of `count` fixed-width records, rejecting declared counts the
/// remaining input cannot possibly hold.
fn record_span(count: usize, record_len: usize, remaining: usize, what: &str) -> Result<usize> {
    count
        .checked_mul(record_len)
        .filter(|&len| len <= remaining)
        .ok_or_else(|| Error::Parse(format!("{what} count {count} exceeds remaining input")))
}

fn parse_num<T: FromStr>(token: Option<&str>, what: &str) -> Result<T>
where
    T::Err: Display,
{
    let token = token.ok_or_else(|| Error::Parse(format!("missing {what}")))?;
    token
        .parse()
        .map_err(|e| Error::Parse(format!("invalid {what} {token:?}: {e}")))
}

fn insert_node(
    tag: u64,
    point: Point3f,
    nodes: &mut Vec<Point3f>,
    node_index: &mut HashMap<u64, u32>,
) -> Result<()> {
    if node_index.insert(tag, nodes.len() as u32).is_some() {
        return Err(Error::Parse(format!("duplicate node tag {tag} in $Nodes")));
    }
    nodes.push(point);
    Ok(())
}

fn lookup_nodes(tags: &[u64], node_index: &HashMap<u64, u32>) -> Result<Vec<u32>> {
    tags.iter()
        .map(|tag| {
            node_index.get(tag).copied().ok_or_else(|| {
                Error::Parse(format!("element references undefined node tag {tag}"))
            })
        })
        .collect()
}

fn parse_nodes_v2_ascii(
    cursor: &mut Cursor,
    nodes: &mut Vec<Point3f>,
    node_index: &mut HashMap<u64, u32>,
) -> Result<()> {
    let count: usize = parse_num(Some(cursor.expect_content_line()?), "node count")?;
    // A node line takes at least 8 bytes; the declared count is untrusted.
    nodes.reserve(count.min(cursor.remaining() / 8));
    for _ in 0..count {
        let line = cursor.expect_content_line()?;
        let mut fields = line.split_whitespace();
        let tag: u64 = parse_num(fields.next(), "node tag")?;
        let x: f64 = parse_num(fields.next(), "node x coordinate")?;
        let y: f64 = parse_num(fields.next(), "node y coordinate")?;
        let z: f64 = parse_num(fields.next(), "node z coordinate")?;
        insert_node(tag, Point3f::new(x as f32, y as f32, z as f32), nodes, node_index)?;
    }
    Ok(())
}

fn parse_nodes_v2_binary(
    cursor: &mut Cursor,
    endian: Endian,
    nodes: &mut Vec<Point3f>,
    node_index: &mut HashMap<u64, u32>,
) -> Result<()> {
    let count: usize = parse_num(Some(cursor.expect_content_line()?), "node count")?;
    // Each record is an i32 tag followed by three f64 coordinates.
    let span = record_span(count, 28, cursor.remaining(), "node")?;
    let records = cursor.read_bytes(span, "$Nodes binary records")?;
    nodes.reserve(count);
    for record in records.chunks_exact(28) {
        let tag = endian.i32(&record[0..4]) as u64;
        let x = endian.f64(&record[4..12]) as f32;
        let y = endian.f64(&record[12..20]) as f32;
        let z = endian.f64(&record[20..28]) as f32;
        insert_node(tag, Point3f::new(x, y, z), nodes, node_index)?;
    }
    cursor.skip_newline();
    Ok(())
}

fn parse_nodes_v4_ascii(
    cursor: &mut Cursor,
    nodes: &mut Vec<Point3f>,
    node_index: &mut HashMap<u64, u32>,
) -> Result<()> {
    let header = cursor.expect_content_line()?;
    let mut fields = header.split_whitespace();
    let num_blocks: usize = parse_num(fields.next(), "entity block count")?;
    let num_nodes: usize = parse_num(fields.next(), "node count")?;
    nodes.reserve(num_nodes.min(cursor.remaining() / 8));

    for _ in 0..num_blocks {
        let block = cursor.expect_content_line()?;
        let mut fields = block.split_whitespace();
        let _dim: u32 = parse_num(fields.next(), "entity dimension")?;
        let _entity: i64 = parse_num(fields.next(), "entity tag")?;
        let parametric: u32 = parse_num(fields.next(), "parametric flag")?;
        let block_nodes: usize = parse_num(fields.next(), "block node count")?;
        if parametric != 0 {
            return Err(Error::UnsupportedFormat(
                "parametric nodes are not supported".to_string(),
            ));
        }

        let mut tags = Vec::with_capacity(block_nodes.min(cursor.remaining() / 2));
        for _ in 0..block_nodes {
            tags.push(parse_num(Some(cursor.expect_content_line()?), "node tag")?);
        }
        for tag in tags {
            let line = cursor.expect_content_line()?;
            let mut fields = line.split_whitespace();
            let x: f64 = parse_num(fields.next(), "node x coordinate")?;
            let y: f64 = parse_num(fields.next(), "node y coordinate")?;
            let z: f64 = parse_num(fields.next(), "node z coordinate")?;
            insert_node(tag, Point3f::new(x as f32, y as f32, z as f32), nodes, node_index)?;
        }
    }
    Ok(())
}

fn parse_elements_v2_ascii(
    cursor: &mut Cursor,
    node_index: &HashMap<u64, u32>,
    elements: &mut Vec<Element>,
) -> Result<()> {
    let count: usize = parse_num(Some(cursor.expect_content_line()?), "element count")?;
    for _ in 0..count {
        let line = cursor.expect_content_line()?;
        let mut fields = line.split_whitespace();
        let _tag: u64 = parse_num(fields.next(), "element tag")?;
        let type_code: u32 = parse_num(fields.next(), "element type")?;
        let num_tags: usize = parse_num(fields.next(), "element tag count")?;
        for _ in 0..num_tags {
            let _: i64 = parse_num(fields.next(), "element tag value")?;
        }

        let Some(kind) = ElementType::from_msh_code(type_code) else {
            log::debug!("skipping element of unsupported type {type_code}");
            continue;
        };
        let mut tags = Vec::with_capacity(kind.node_count());
        for _ in 0..kind.node_count() {
            tags.push(parse_num(fields.next(), "element node tag")?);
        }
        elements.push(Element::new(kind, lookup_nodes(&tags, node_index)?));
    }
    Ok(())
}

fn parse_elements_v2_binary(
    cursor: &mut Cursor,
    endian: Endian,
    node_index: &HashMap<u64, u32>,
    elements: &mut Vec<Element>,
) -> Result<()> {
    let count: usize = parse_num(Some(cursor.expect_content_line()?), "element count")?;
    let mut remaining = count;
    while remaining > 0 {
        let header = cursor.read_bytes(12, "$Elements block header")?;
        let type_code = endian.i32(&header[0..4]);
        let block_count = endian.i32(&header[4..8]);
        let num_tags = endian.i32(&header[8..12]);
        if type_code < 0 || block_count < 0 || num_tags < 0 {
            return Err(Error::Parse(format!(
                "negative field in $Elements block header ({type_code} {block_count} {num_tags})"
            )));
        }
        let type_code = type_code as u32;
        let block_count = block_count as usize;
        let num_tags = num_tags as usize;
        if block_count > remaining {
            return Err(Error::Parse(
                "element block exceeds declared element count".to_string(),
            ));
        }

        // Binary blocks cannot be skipped without knowing the record width.
        let kind = ElementType::from_msh_code(type_code).ok_or_else(|| {
            Error::Parse(format!(
                "unsupported element type {type_code} in binary $Elements"
            ))
        })?;

        let record_len = 4 * (1 + num_tags + kind.node_count());
        let span = record_span(block_count, record_len, cursor.remaining(), "element")?;
        let records = cursor.read_bytes(span, "$Elements binary records")?;
        for record in records.chunks_exact(record_len) {
            let node_bytes = &record[4 * (1 + num_tags)..];
            let tags: Vec<u64> = node_bytes
                .chunks_exact(4)
                .map(|b| endian.i32(b) as u64)
                .collect();
            elements.push(Element::new(kind, lookup_nodes(&tags, node_index)?));
        }
        remaining -= block_count;
    }
    cursor.skip_newline();
    Ok(())
}

fn parse_elements_v4_ascii(
    cursor: &mut Cursor,
    node_index: &HashMap<u64, u32>,
    elements: &mut Vec<Element>,
) -> Result<()> {
    let header = cursor.expect_content_line()?;
    let mut fields = header.split_whitespace();
    let num_blocks: usize = parse_num(fields.next(), "entity block count")?;
    let _num_elements: usize = parse_num(fields.next(), "element count")?;

    for _ in 0..num_blocks {
        let block = cursor.expect_content_line()?;
        let mut fields = block.split_whitespace();
        let _dim: u32 = parse_num(fields.next(), "entity dimension")?;
        let _entity: i64 = parse_num(fields.next(), "entity tag")?;
        let type_code: u32 = parse_num(fields.next(), "element type")?;
        let block_count: usize = parse_num(fields.next(), "block element count")?;

        let kind = ElementType::from_msh_code(type_code);
        if kind.is_none() {
            log::debug!("skipping element block of unsupported type {type_code}");
        }
        for _ in 0..block_count {
            let line = cursor.expect_content_line()?;
            let Some(kind) = kind else { continue };
            let mut fields = line.split_whitespace();
            let _tag: u64 = parse_num(fields.next(), "element tag")?;
            let mut tags = Vec::with_capacity(kind.node_count());
            for _ in 0..kind.node_count() {
                tags.push(parse_num(fields.next(), "element node tag")?);
            }
            elements.push(Element::new(kind, lookup_nodes(&tags, node_index)?));
        }
    }
    Ok(())
}
