// Procedural mesh types, primitive builders, and triangulation.
//
// Pipeline: primitive builder → PolyMesh → triangulate_smooth() → RenderMesh → GPU.
// The loaded player model takes the same road (OBJ parse → PolyMesh → ...).

use glam::Vec3;
use std::f32::consts::TAU;

// ============================================================================
// GPU VERTEX
// ============================================================================

/// GPU-ready vertex with position and normal.
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl GpuVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// POLY MESH
// ============================================================================

/// Intermediate polygon mesh. Supports n-gon faces (arbitrary vertex
/// count per face) with CCW winding viewed from outside, consistent
/// with back-face culling. Only used at startup/load time, so per-face
/// heap allocation is acceptable. NOT GPU-ready; see `RenderMesh`.
#[derive(Debug)]
pub struct PolyMesh {
    pub positions: Vec<Vec3>,
    pub faces: Vec<Vec<usize>>,
}

impl PolyMesh {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Add a vertex and return its index.
    pub fn add_vertex(&mut self, pos: Vec3) -> usize {
        let idx = self.positions.len();
        self.positions.push(pos);
        idx
    }

    /// Add a face by vertex indices (CCW order).
    pub fn add_face(&mut self, indices: Vec<usize>) {
        debug_assert!(indices.len() >= 3, "Face must have at least 3 vertices");
        self.faces.push(indices);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

// ============================================================================
// RENDER MESH
// ============================================================================

/// GPU-ready triangulated mesh with per-vertex smooth normals.
/// Upload vertex_bytes() to a VERTEX buffer, index_bytes() to an INDEX buffer.
pub struct RenderMesh {
    pub vertices: Vec<GpuVertex>,
    pub indices: Vec<u32>,
}

impl RenderMesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

// ============================================================================
// TRIANGULATION + SMOOTH NORMALS
// ============================================================================

/// Convert a PolyMesh to a GPU-ready RenderMesh using smooth
/// (area-weighted) normals. Vertices are shared across triangles via
/// the index buffer.
///
/// 1. Fan-triangulate each face and accumulate the unnormalized cross
///    product into each corner's normal (magnitude = 2x area, giving
///    automatic area-weighting).
/// 2. Normalize the accumulated normals.
/// 3. Build the index buffer over the shared vertices.
pub fn triangulate_smooth(poly: &PolyMesh) -> RenderMesh {
    let n_verts = poly.vertex_count();

    let mut normal_accum: Vec<Vec3> = vec![Vec3::ZERO; n_verts];

    for face in &poly.faces {
        let n = face.len();
        for i in 1..(n - 1) {
            let a = poly.positions[face[0]];
            let b = poly.positions[face[i]];
            let c = poly.positions[face[i + 1]];
            let weighted_normal = (b - a).cross(c - a);
            normal_accum[face[0]] += weighted_normal;
            normal_accum[face[i]] += weighted_normal;
            normal_accum[face[i + 1]] += weighted_normal;
        }
    }

    let vertices: Vec<GpuVertex> = poly
        .positions
        .iter()
        .zip(normal_accum.iter())
        .map(|(pos, n)| GpuVertex {
            position: pos.to_array(),
            normal: n.normalize_or_zero().to_array(),
        })
        .collect();

    let mut indices: Vec<u32> = Vec::new();
    for face in &poly.faces {
        let n = face.len();
        for i in 1..(n - 1) {
            indices.push(face[0] as u32);
            indices.push(face[i] as u32);
            indices.push(face[i + 1] as u32);
        }
    }

    RenderMesh { vertices, indices }
}

// ============================================================================
// PRIMITIVES
// ============================================================================
// All builders produce unit-sized meshes centered on the origin; the
// per-instance scale stretches them at draw time.

/// Unit cube, half-extent 0.5 on each axis, 6 CCW quad faces.
///
/// Vertex layout (half-extent r):
///   0: (-r, -r, +r)  front-bottom-left
///   1: (+r, -r, +r)  front-bottom-right
///   2: (+r, +r, +r)  front-top-right
///   3: (-r, +r, +r)  front-top-left
///   4: (+r, -r, -r)  back-bottom-right
///   5: (-r, -r, -r)  back-bottom-left
///   6: (-r, +r, -r)  back-top-left
///   7: (+r, +r, -r)  back-top-right
pub fn cube() -> PolyMesh {
    let r = 0.5;
    let mut mesh = PolyMesh::new();

    mesh.add_vertex(Vec3::new(-r, -r, r));
    mesh.add_vertex(Vec3::new(r, -r, r));
    mesh.add_vertex(Vec3::new(r, r, r));
    mesh.add_vertex(Vec3::new(-r, r, r));
    mesh.add_vertex(Vec3::new(r, -r, -r));
    mesh.add_vertex(Vec3::new(-r, -r, -r));
    mesh.add_vertex(Vec3::new(-r, r, -r));
    mesh.add_vertex(Vec3::new(r, r, -r));

    mesh.add_face(vec![0, 1, 2, 3]); // front  (+Z)
    mesh.add_face(vec![4, 5, 6, 7]); // back   (-Z)
    mesh.add_face(vec![5, 0, 3, 6]); // left   (-X)
    mesh.add_face(vec![1, 4, 7, 2]); // right  (+X)
    mesh.add_face(vec![3, 2, 7, 6]); // top    (+Y)
    mesh.add_face(vec![5, 4, 1, 0]); // bottom (-Y)

    mesh
}

/// Unit quad on the XZ plane facing +Y.
pub fn quad() -> PolyMesh {
    let r = 0.5;
    let mut mesh = PolyMesh::new();
    mesh.add_vertex(Vec3::new(-r, 0.0, -r));
    mesh.add_vertex(Vec3::new(-r, 0.0, r));
    mesh.add_vertex(Vec3::new(r, 0.0, r));
    mesh.add_vertex(Vec3::new(r, 0.0, -r));
    mesh.add_face(vec![0, 1, 2, 3]);
    mesh
}

/// Cone with `segments` sides: radius 0.5, height 1, origin at
/// mid-height (base at y = -0.5, apex at +0.5). Side triangles plus a
/// base n-gon, all CCW from outside.
pub fn cone(segments: usize) -> PolyMesh {
    debug_assert!(segments >= 3);
    let r = 0.5;
    let mut mesh = PolyMesh::new();

    let apex = mesh.add_vertex(Vec3::new(0.0, 0.5, 0.0));
    let ring: Vec<usize> = (0..segments)
        .map(|i| {
            let theta = i as f32 / segments as f32 * TAU;
            mesh.add_vertex(Vec3::new(r * theta.cos(), -0.5, r * theta.sin()))
        })
        .collect();

    for i in 0..segments {
        let next = (i + 1) % segments;
        mesh.add_face(vec![apex, ring[next], ring[i]]);
    }
    // Base, outward = -Y: increasing theta already winds CCW seen from below.
    mesh.add_face(ring);

    mesh
}

/// Tapered cylinder with `segments` sides: height 1 centered on the
/// origin, `top_radius` at y = +0.5 and `bottom_radius` at -0.5.
/// Equal radii give a straight tube; the tree trunk uses 0.5 / 0.8.
pub fn cylinder(top_radius: f32, bottom_radius: f32, segments: usize) -> PolyMesh {
    debug_assert!(segments >= 3);
    let mut mesh = PolyMesh::new();

    let mut top = Vec::with_capacity(segments);
    let mut bottom = Vec::with_capacity(segments);
    for i in 0..segments {
        let theta = i as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        top.push(mesh.add_vertex(Vec3::new(top_radius * cos, 0.5, top_radius * sin)));
        bottom.push(mesh.add_vertex(Vec3::new(
            bottom_radius * cos,
            -0.5,
            bottom_radius * sin,
        )));
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        mesh.add_face(vec![bottom[i], top[i], top[next], bottom[next]]);
    }
    // Top cap faces +Y, so wind against theta; bottom cap faces -Y, with it.
    let mut top_cap = top.clone();
    top_cap.reverse();
    mesh.add_face(top_cap);
    mesh.add_face(bottom);

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_counts() {
        let m = cube();
        assert_eq!(m.vertex_count(), 8);
        assert_eq!(m.faces.len(), 6);
    }

    #[test]
    fn cube_triangulates_to_shared_vertices() {
        let rm = triangulate_smooth(&cube());
        // 8 shared vertices, 6 quads * 2 triangles * 3 indices
        assert_eq!(rm.vertices.len(), 8);
        assert_eq!(rm.index_count(), 36);
        // Smooth corner normals point away from the center.
        for v in &rm.vertices {
            let p = Vec3::from_array(v.position);
            let n = Vec3::from_array(v.normal);
            assert!(n.dot(p) > 0.0, "normal {n:?} points inward at {p:?}");
            assert!((n.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn quad_faces_up() {
        let rm = triangulate_smooth(&quad());
        assert_eq!(rm.vertices.len(), 4);
        for v in &rm.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn cone_counts() {
        let m = cone(16);
        assert_eq!(m.vertex_count(), 17); // apex + ring
        assert_eq!(m.faces.len(), 17); // 16 sides + base
    }

    #[test]
    fn cone_base_faces_down() {
        let rm = triangulate_smooth(&cone(8));
        // The apex normal is the average of all side-face normals: straight up.
        let apex = &rm.vertices[0];
        let n = Vec3::from_array(apex.normal);
        assert!(n.y > 0.99, "apex normal {n:?}");
    }

    #[test]
    fn cylinder_counts() {
        let m = cylinder(0.5, 0.8, 8);
        assert_eq!(m.vertex_count(), 16);
        assert_eq!(m.faces.len(), 10); // 8 side quads + 2 caps
    }

    #[test]
    fn cylinder_side_normals_point_outward() {
        let rm = triangulate_smooth(&cylinder(0.5, 0.5, 12));
        for v in &rm.vertices {
            let p = Vec3::from_array(v.position);
            let n = Vec3::from_array(v.normal);
            // Radially outward on XZ (caps tilt the normal up/down but
            // never inward).
            assert!(n.x * p.x + n.z * p.z >= 0.0);
        }
    }
}
