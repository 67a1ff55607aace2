//! Unit meshes scaled per instance

use super::vertex::Vertex;

/// Unit cube centred on the origin (edge 1), 36 vertices, outward normals
pub fn unit_cube() -> Vec<Vertex> {
    // (normal, tangent u, tangent v) for each face; u × v = normal keeps CCW winding
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (n, u, v) in FACES {
        let corner = |su: f32, sv: f32| {
            [
                0.5 * n[0] + 0.5 * (su * u[0] + sv * v[0]),
                0.5 * n[1] + 0.5 * (su * u[1] + sv * v[1]),
                0.5 * n[2] + 0.5 * (su * u[2] + sv * v[2]),
            ]
        };
        let (a, b, c, d) = (corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0));
        for p in [a, b, c, a, c, d] {
            vertices.push(Vertex::new(p, n));
        }
    }
    vertices
}

/// Unit square in the XZ plane facing +Y (drawn double-sided)
pub fn unit_plane() -> Vec<Vertex> {
    let n = [0.0, 1.0, 0.0];
    let a = [-0.5, 0.0, 0.5];
    let b = [0.5, 0.0, 0.5];
    let c = [0.5, 0.0, -0.5];
    let d = [-0.5, 0.0, -0.5];
    [a, b, c, a, c, d]
        .into_iter()
        .map(|p| Vertex::new(p, n))
        .collect()
}
