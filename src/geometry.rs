//! Sphere mesh shared by every instance.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::pbr::Vertex;

const ICOSAHEDRON_INDICES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn icosahedron_vertices() -> [Vec3; 12] {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
}

/// A subdivided icosahedron projected onto a sphere.
///
/// Each of the 20 faces is split into a `(detail + 1)²` triangle grid, so
/// the mesh has `20 * (detail + 1)²` triangles. Vertices are not shared
/// between triangles, which keeps uv seams clean; draw it as a plain
/// triangle list.
#[derive(Debug, Clone)]
pub struct Icosphere {
    /// Three vertices per triangle.
    pub vertices: Vec<Vertex>,
}

impl Icosphere {
    pub fn new(radius: f32, detail: u32) -> Self {
        let corners = icosahedron_vertices();
        let cols = detail as usize + 1;

        let mut positions = Vec::with_capacity(20 * cols * cols * 3);
        for [a, b, c] in ICOSAHEDRON_INDICES {
            subdivide_face(corners[a], corners[b], corners[c], cols, &mut positions);
        }

        let mut vertices = Vec::with_capacity(positions.len());
        for tri in positions.chunks_exact(3) {
            let dirs = [tri[0].normalize(), tri[1].normalize(), tri[2].normalize()];
            let mut uvs = dirs.map(sphere_uv);
            fix_seam(&mut uvs);
            for (dir, uv) in dirs.into_iter().zip(uvs) {
                vertices.push(Vertex {
                    position: (dir * radius).to_array(),
                    normal: dir.to_array(),
                    uv: uv.to_array(),
                });
            }
        }

        Self { vertices }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

fn subdivide_face(a: Vec3, b: Vec3, c: Vec3, cols: usize, out: &mut Vec<Vec3>) {
    // rows[i][j]: point j on the i-th line from edge ab toward c
    let mut rows: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);
    for i in 0..=cols {
        let aj = a.lerp(c, i as f32 / cols as f32);
        let bj = b.lerp(c, i as f32 / cols as f32);
        let count = cols - i;
        let row = if count == 0 {
            vec![aj]
        } else {
            (0..=count).map(|j| aj.lerp(bj, j as f32 / count as f32)).collect()
        };
        rows.push(row);
    }

    for i in 0..cols {
        for j in 0..2 * (cols - i) - 1 {
            let k = j / 2;
            if j % 2 == 0 {
                out.extend([rows[i][k + 1], rows[i + 1][k], rows[i][k]]);
            } else {
                out.extend([rows[i][k + 1], rows[i + 1][k + 1], rows[i + 1][k]]);
            }
        }
    }
}

fn sphere_uv(dir: Vec3) -> Vec2 {
    let azimuth = dir.z.atan2(-dir.x);
    let inclination = (-dir.y).atan2(Vec2::new(dir.x, dir.z).length());
    Vec2::new(azimuth / (2.0 * PI) + 0.5, 1.0 - (inclination / PI + 0.5))
}

/// Triangles straddling the wrap line get their low u values moved past 1.
fn fix_seam(uvs: &mut [Vec2; 3]) {
    let max = uvs.iter().map(|uv| uv.x).fold(f32::MIN, f32::max);
    let min = uvs.iter().map(|uv| uv.x).fold(f32::MAX, f32::min);
    if max > 0.9 && min < 0.1 {
        for uv in uvs.iter_mut() {
            if uv.x < 0.2 {
                uv.x += 1.0;
            }
        }
    }
}
