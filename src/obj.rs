use anyhow::{anyhow, Context, Result};
use glam::Vec3;

/// Triangle soup used for hit testing against imported geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl TriMesh {
    /// Iterates over the mesh triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds of all referenced vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.positions.iter().copied();
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

/// Parses Wavefront OBJ text into a [`TriMesh`].
///
/// Only `v` and `f` records matter for picking; texture coordinates and
/// normals are skipped. Polygons are fan-triangulated and negative (relative)
/// indices are supported.
pub fn load_obj_from_str(data: &str) -> Result<TriMesh> {
    let mut positions = Vec::new();
    let mut indices = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        match parts.next() {
            Some("v") => positions.push(
                parse_position(parts)
                    .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
            ),
            Some("f") => {
                let polygon = parse_face(parts, positions.len())
                    .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                for i in 1..polygon.len() - 1 {
                    indices.extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(anyhow!("OBJ file does not define any vertices"));
    }
    Ok(TriMesh { positions, indices })
}

fn parse_position<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3> {
    let mut next = || -> Result<f32> {
        Ok(parts
            .next()
            .ok_or_else(|| anyhow!("missing vector component"))?
            .parse::<f32>()?)
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>, vertex_count: usize) -> Result<Vec<u32>> {
    let mut polygon = Vec::new();
    for part in parts {
        let raw = part
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i64>()?;
        let index = resolve_index(raw, vertex_count)
            .ok_or_else(|| anyhow!("vertex index {raw} is out of range"))?;
        polygon.push(index);
    }
    if polygon.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(polygon)
}

fn resolve_index(index: i64, len: usize) -> Option<u32> {
    let len = len as i64;
    let zero_based = match index {
        i if i > 0 => i - 1,
        i if i < 0 => len + i,
        _ => return None,
    };
    (0..len)
        .contains(&zero_based)
        .then(|| u32::try_from(zero_based).ok())
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quad_into_two_triangles() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1/1/1 2/2/1 3/3/1 4/4/1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn relative_indices_resolve_from_the_end() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = load_obj_from_str(obj).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 7\n";
        assert!(load_obj_from_str(obj).is_err());
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let obj = "v -1 0 2\nv 1 3 0\nv 0 1 -2\nf 1 2 3\n";
        let (min, max) = load_obj_from_str(obj).unwrap().bounds().unwrap();
        assert_eq!(min, Vec3::new(-1.0, 0.0, -2.0));
        assert_eq!(max, Vec3::new(1.0, 3.0, 2.0));
    }
}
