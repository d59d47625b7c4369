use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::Vertex;

/// CPU-side mesh produced by the parser, ready for GPU upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Material description parsed from an MTL file. Texture fields are file
/// names relative to the OBJ's directory; either may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub albedo_map: Option<String>,
    pub normal_map: Option<String>,
    pub specular_color: [f32; 3],
    pub specular_power: f32,
    pub specular_coefficient: f32,
}

impl MaterialData {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            albedo_map: None,
            normal_map: None,
            specular_color: [0.0; 3],
            // MTL files in the wild frequently omit an exponent.
            specular_power: 16.0,
            specular_coefficient: 0.0,
        }
    }
}

/// One model record per `usemtl` group: mesh name + material name, resolved
/// to real objects when the scene is assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelData {
    pub mesh: String,
    pub material: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjScene {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub models: Vec<ModelData>,
}

impl ObjScene {
    /// Parses an OBJ file from disk, loading `mtllib` companions relative to
    /// the OBJ's directory.
    pub fn load(path: &Path) -> Result<ObjScene> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("reading OBJ file {}", path.display()))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        parse_obj(&source, |mtl_name| {
            let mtl_path = dir.join(mtl_name);
            fs::read_to_string(&mtl_path)
                .with_context(|| format!("reading MTL file {}", mtl_path.display()))
        })
    }
}

/// A face corner as written in the file: 1-based position/normal indices,
/// texcoord index 0 reserved for "no uv".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: i32,
    texcoord: i32,
    normal: i32,
}

struct SubMesh {
    name: String,
    material: String,
    triangles: Vec<[Corner; 3]>,
}

/// Parses OBJ text into CPU-side scene data. `load_mtl` resolves `mtllib`
/// directives to MTL text; tests pass a closure over in-memory fixtures.
pub fn parse_obj(
    source: &str,
    mut load_mtl: impl FnMut(&str) -> Result<String>,
) -> Result<ObjScene> {
    let lines: Vec<&str> = source.lines().collect();

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    // Slot 0 is the reserved "no uv" coordinate; vt entries follow it.
    let mut texcoords: Vec<[f32; 2]> = vec![[0.5, 0.5]];

    let mut materials: Vec<MaterialData> = Vec::new();
    let mut submeshes: Vec<SubMesh> = Vec::new();

    for (line_no, raw) in lines.iter().enumerate() {
        let mut tokens = raw.split_whitespace();
        let Some(header) = tokens.next() else { continue };
        match header {
            "v" => positions.push(parse_floats3(tokens, line_no, "v")?),
            "vn" => normals.push(parse_floats3(tokens, line_no, "vn")?),
            "vt" => {
                let uv = parse_floats2(tokens, line_no, "vt")?;
                texcoords.push(uv);
            }
            "mtllib" => {
                let Some(file) = tokens.next() else {
                    bail!("line {}: mtllib without a file name", line_no + 1);
                };
                let mtl_source = load_mtl(file)?;
                parse_mtl(&mtl_source, &mut materials)?;
            }
            "usemtl" => {
                let Some(material) = tokens.next() else {
                    bail!("line {}: usemtl without a material name", line_no + 1);
                };
                let name = group_name(&lines, line_no)
                    .unwrap_or_else(|| format!("mesh{}", submeshes.len()));
                submeshes.push(SubMesh {
                    name,
                    material: material.to_string(),
                    triangles: Vec::new(),
                });
            }
            "f" => {
                if submeshes.is_empty() {
                    // Plain OBJ exports can start with faces before any
                    // usemtl; give them an anonymous group.
                    submeshes.push(SubMesh {
                        name: "mesh0".to_string(),
                        material: String::new(),
                        triangles: Vec::new(),
                    });
                }
                let corners = parse_face(tokens, line_no)?;
                let submesh = submeshes.last_mut().unwrap();
                submesh.triangles.push([corners[0], corners[1], corners[2]]);
                if let Some(fourth) = corners.get(3) {
                    submesh.triangles.push([corners[0], corners[2], *fourth]);
                }
            }
            _ => {}
        }
    }

    let mut meshes = Vec::with_capacity(submeshes.len());
    let mut models = Vec::with_capacity(submeshes.len());
    for submesh in &submeshes {
        let mesh = build_mesh(submesh, &positions, &texcoords, &normals)?;
        models.push(ModelData {
            mesh: mesh.name.clone(),
            material: submesh.material.clone(),
        });
        meshes.push(mesh);
    }

    Ok(ObjScene {
        meshes,
        materials,
        models,
    })
}

/// Parses MTL text, appending to `materials`.
pub fn parse_mtl(source: &str, materials: &mut Vec<MaterialData>) -> Result<()> {
    for (line_no, raw) in source.lines().enumerate() {
        let mut tokens = raw.split_whitespace();
        let Some(header) = tokens.next() else { continue };
        if header == "newmtl" {
            let Some(name) = tokens.next() else {
                bail!("line {}: newmtl without a name", line_no + 1);
            };
            materials.push(MaterialData::named(name));
            continue;
        }

        let is_directive = matches!(header, "map_Kd" | "map_bump" | "Ks" | "Ns");
        if !is_directive {
            continue;
        }
        let Some(current) = materials.last_mut() else {
            bail!("line {}: {} before any newmtl", line_no + 1, header);
        };
        match header {
            "map_Kd" => current.albedo_map = tokens.next().map(str::to_string),
            "map_bump" => {
                // First map wins; some exporters repeat the directive.
                if current.normal_map.is_none() {
                    current.normal_map = tokens.next().map(str::to_string);
                }
            }
            "Ks" => current.specular_color = parse_floats3(tokens, line_no, "Ks")?,
            "Ns" => {
                current.specular_coefficient = parse_float(tokens.next(), line_no, "Ns")?;
            }
            _ => unreachable!(),
        }
    }
    Ok(())
}

/// A sub-mesh is named by a `g` line directly before or after its `usemtl`,
/// otherwise the caller synthesizes a name.
fn group_name(lines: &[&str], usemtl_line: usize) -> Option<String> {
    let adjacent = [
        usemtl_line.checked_sub(1).and_then(|i| lines.get(i)),
        lines.get(usemtl_line + 1),
    ];
    for line in adjacent.into_iter().flatten() {
        let mut tokens = line.split_whitespace();
        if tokens.next() == Some("g") {
            if let Some(name) = tokens.next() {
                return Some(name.to_string());
            }
        }
    }
    None
}

fn parse_face<'a>(
    tokens: impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<Vec<Corner>> {
    let mut corners = Vec::with_capacity(4);
    for group in tokens {
        let mut parts = group.split('/');
        let position = parse_index(parts.next(), line_no, group)?;
        let texcoord = match parts.next() {
            None | Some("") => 0,
            Some(t) => t
                .parse::<i32>()
                .map_err(|_| malformed_face(line_no, group))?,
        };
        let normal = parse_index(parts.next(), line_no, group)?;
        corners.push(Corner {
            position,
            texcoord,
            normal,
        });
    }
    if corners.len() != 3 && corners.len() != 4 {
        bail!(
            "line {}: face must have 3 or 4 corners, found {}",
            line_no + 1,
            corners.len()
        );
    }
    Ok(corners)
}

fn parse_index(part: Option<&str>, line_no: usize, group: &str) -> Result<i32> {
    let index = part
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i32>().ok())
        .ok_or_else(|| malformed_face(line_no, group))?;
    if index < 1 {
        return Err(malformed_face(line_no, group));
    }
    Ok(index)
}

fn malformed_face(line_no: usize, group: &str) -> anyhow::Error {
    anyhow::anyhow!("line {}: malformed face corner '{}'", line_no + 1, group)
}

fn parse_float(token: Option<&str>, line_no: usize, header: &str) -> Result<f32> {
    token
        .and_then(|s| s.parse::<f32>().ok())
        .with_context(|| format!("line {}: malformed {} entry", line_no + 1, header))
}

fn parse_floats2<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    line_no: usize,
    header: &str,
) -> Result<[f32; 2]> {
    Ok([
        parse_float(tokens.next(), line_no, header)?,
        parse_float(tokens.next(), line_no, header)?,
    ])
}

fn parse_floats3<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    line_no: usize,
    header: &str,
) -> Result<[f32; 3]> {
    Ok([
        parse_float(tokens.next(), line_no, header)?,
        parse_float(tokens.next(), line_no, header)?,
        parse_float(tokens.next(), line_no, header)?,
    ])
}

/// Resolves corner index triples into deduplicated vertices and a 32-bit
/// index list, then derives tangents.
fn build_mesh(
    submesh: &SubMesh,
    positions: &[[f32; 3]],
    texcoords: &[[f32; 2]],
    normals: &[[f32; 3]],
) -> Result<MeshData> {
    let mut seen: HashMap<Corner, u32> = HashMap::new();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for triangle in &submesh.triangles {
        for corner in triangle {
            if let Some(&slot) = seen.get(corner) {
                indices.push(slot);
                continue;
            }
            let position = *positions
                .get(corner.position as usize - 1)
                .with_context(|| format!("position index {} out of range", corner.position))?;
            let uv = *texcoords
                .get(corner.texcoord as usize)
                .with_context(|| format!("texcoord index {} out of range", corner.texcoord))?;
            let normal = *normals
                .get(corner.normal as usize - 1)
                .with_context(|| format!("normal index {} out of range", corner.normal))?;
            let slot = vertices.len() as u32;
            vertices.push(Vertex {
                position,
                normal,
                tangent: [0.0; 3],
                bitangent: [0.0; 3],
                // Flip the v-channel to image coordinates.
                texcoord: [uv[0], 1.0 - uv[1]],
            });
            seen.insert(*corner, slot);
            indices.push(slot);
        }
    }

    compute_tangents(&mut vertices, &indices);

    Ok(MeshData {
        name: submesh.name.clone(),
        vertices,
        indices,
    })
}

/// Derives tangent/bitangent per triangle from UV gradients and writes the
/// result to all three corners. A vertex shared between triangles keeps
/// whichever triangle was processed last -- no averaging. Surprising, but
/// matched to the shading this feeds; see DESIGN.md before "fixing".
pub fn compute_tangents(vertices: &mut [Vertex], indices: &[u32]) {
    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let (p0, p1, p2) = (
            vertices[i0].position,
            vertices[i1].position,
            vertices[i2].position,
        );
        let (t0, t1, t2) = (
            vertices[i0].texcoord,
            vertices[i1].texcoord,
            vertices[i2].texcoord,
        );

        let dp1 = sub3(p1, p0);
        let dp2 = sub3(p2, p0);
        let du1 = [t1[0] - t0[0], t1[1] - t0[1]];
        let du2 = [t2[0] - t0[0], t2[1] - t0[1]];

        let r = 1.0 / (du1[0] * du2[1] - du1[1] * du2[0]);
        let tangent = scale3(sub3(scale3(dp1, du2[1]), scale3(dp2, du1[1])), r);
        let bitangent = scale3(sub3(scale3(dp2, du1[0]), scale3(dp1, du2[0])), r);

        for index in [i0, i1, i2] {
            vertices[index].tangent = tangent;
            vertices[index].bitangent = bitangent;
        }
    }
}

fn sub3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale3(v: [f32; 3], s: f32) -> [f32; 3] {
    [v[0] * s, v[1] * s, v[2] * s]
}
