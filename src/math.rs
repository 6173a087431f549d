use crate::{
    element::{FH, HH, Handle, VH},
    iterator,
    topol::HeStructure,
};
use glam::DVec3;
use std::f64::consts::PI;

fn point(points: &[DVec3], v: Option<VH>) -> DVec3 {
    match v {
        Some(v) => points[v.index() as usize],
        None => DVec3::ZERO,
    }
}

/// Cotangent of the angle between two vectors.
fn cotangent(a: DVec3, b: DVec3) -> f64 {
    let sin = a.cross(b).length();
    if sin > 0.0 { a.dot(b) / sin } else { 0.0 }
}

/// Geometry of individual elements. The positions of the vertices are read
/// from `points`, indexed by vertex index.
impl HeStructure {
    /// Vector from the start to the end of the halfedge.
    pub fn halfedge_vector(&self, h: HH, points: &[DVec3]) -> DVec3 {
        point(points, self.end_vertex(h)) - point(points, self.start_vertex(h))
    }

    pub fn halfedge_length(&self, h: HH, points: &[DVec3]) -> f64 {
        self.halfedge_vector(h, points).length()
    }

    /// Angle at the start of `h`, between `h` and the twin of the previous
    /// halfedge. Inside a face this is the corner angle of the face.
    pub fn halfedge_angle(&self, h: HH, points: &[DVec3]) -> f64 {
        let a = self.halfedge_vector(h, points);
        let b = self.halfedge_vector(self.prev_halfedge(h).twin(), points);
        a.angle_between(b)
    }

    /// Cotangent of the angle opposite to `h` in its face. The face is
    /// assumed to be a triangle. Zero when `h` has no face.
    pub fn halfedge_cotangent(&self, h: HH, points: &[DVec3]) -> f64 {
        if self.is_hole_halfedge(h) {
            return 0.0;
        }
        let opp = point(points, self.end_vertex(self.next_halfedge(h)));
        cotangent(
            point(points, self.start_vertex(h)) - opp,
            point(points, self.end_vertex(h)) - opp,
        )
    }

    /// Symmetric cotangent weight of the edge of `h`, i.e. half the sum of
    /// the cotangents of the angles opposite to the edge.
    pub fn edge_cotangent_weight(&self, h: HH, points: &[DVec3]) -> f64 {
        0.5 * (self.halfedge_cotangent(h, points) + self.halfedge_cotangent(h.twin(), points))
    }

    /// Normal of the sector at the start of `h`, not normalized. Its length
    /// is twice the area of the triangle spanned by the sector.
    pub fn halfedge_normal(&self, h: HH, points: &[DVec3]) -> DVec3 {
        self.halfedge_vector(self.prev_halfedge(h), points)
            .cross(self.halfedge_vector(h, points))
    }

    pub fn halfedge_area(&self, h: HH, points: &[DVec3]) -> f64 {
        0.5 * self.halfedge_normal(h, points).length()
    }

    /// Angle between the faces on either side of the edge of `h`. This is
    /// `PI` for flat edges, less than `PI` for convex edges and more than
    /// `PI` for concave edges. Returns `None` for boundary edges.
    pub fn dihedral_angle(&self, h: HH, points: &[DVec3], fnormals: &[DVec3]) -> Option<f64> {
        let f0 = self.halfedge_face(h)?;
        let f1 = self.halfedge_face(h.twin())?;
        let n0 = fnormals[f0.index() as usize];
        let n1 = fnormals[f1.index() as usize];
        let e = self.halfedge_vector(h, points).normalize_or_zero();
        Some(PI - f64::atan2(e.dot(n0.cross(n1)), n0.dot(n1)))
    }

    /// Area weighted vertex normal, computed from the sector normals of the
    /// faces around the vertex.
    pub fn vertex_normal(&self, v: VH, points: &[DVec3]) -> DVec3 {
        iterator::outgoing_halfedges(self, v)
            .filter(|h| !self.is_hole_halfedge(*h))
            .fold(DVec3::ZERO, |total, h| {
                // Intentionally not normalizing to account for sector area.
                total + self.halfedge_normal(h, points)
            })
            .normalize_or_zero()
    }

    /// Area of the faces around the vertex, each face shared equally among
    /// its vertices.
    pub fn vertex_barycentric_area(&self, v: VH, points: &[DVec3]) -> f64 {
        iterator::vertex_faces(self, v)
            .map(|f| self.face_area(f, points) / iterator::face_degree(self, f) as f64)
            .sum()
    }

    /// Area of the Voronoi region of the vertex, restricted to the triangles
    /// around it.
    pub fn vertex_circumcentric_area(&self, v: VH, points: &[DVec3]) -> f64 {
        iterator::outgoing_halfedges(self, v)
            .filter(|h| !self.is_hole_halfedge(*h))
            .map(|h| {
                let hp = self.prev_halfedge(h);
                self.halfedge_vector(h, points).length_squared() * self.halfedge_cotangent(h, points)
                    + self.halfedge_vector(hp, points).length_squared()
                        * self.halfedge_cotangent(hp, points)
            })
            .sum::<f64>()
            * 0.125
    }

    /// Sum of the face corner angles at the vertex.
    pub fn vertex_angle_sum(&self, v: VH, points: &[DVec3]) -> f64 {
        iterator::outgoing_halfedges(self, v)
            .filter(|h| !self.is_hole_halfedge(*h))
            .map(|h| self.halfedge_angle(h, points))
            .sum()
    }

    /// Angle defect at the vertex. Boundary vertices are measured against
    /// `PI` instead of `2 * PI`.
    pub fn vertex_gaussian_curvature(&self, v: VH, points: &[DVec3]) -> f64 {
        let full = if self.is_boundary_vertex(v) { PI } else { 2.0 * PI };
        full - self.vertex_angle_sum(v, points)
    }

    /// Vector from the vertex to the average of its neighbours.
    pub fn vertex_umbrella_laplacian(&self, v: VH, points: &[DVec3]) -> DVec3 {
        let (count, total) = iterator::connected_vertices(self, v)
            .fold((0usize, DVec3::ZERO), |(count, total), n| {
                (count + 1, total + points[n.index() as usize])
            });
        if count == 0 {
            return DVec3::ZERO;
        }
        total / count as f64 - points[v.index() as usize]
    }

    /// Compute the face normal using Newell's method.
    pub fn face_normal(&self, f: FH, points: &[DVec3]) -> DVec3 {
        let (nverts, normal) =
            iterator::face_halfedges(self, f).fold((0usize, DVec3::ZERO), |(nverts, total), h| {
                let pc = point(points, self.start_vertex(h));
                let pn = point(points, self.end_vertex(h));
                let (a, b) = (pc - pn, pc + pn);
                (
                    nverts + 1,
                    total + DVec3::new(a.y * b.z, a.z * b.x, a.x * b.y),
                )
            });
        if nverts < 3 {
            // Guard against degenerate cases.
            return DVec3::ZERO;
        }
        normal.normalize_or_zero()
    }

    /// Average position of the vertices of the face.
    pub fn face_center(&self, f: FH, points: &[DVec3]) -> DVec3 {
        let (count, total) = iterator::face_vertices(self, f)
            .fold((0usize, DVec3::ZERO), |(count, total), v| {
                (count + 1, total + points[v.index() as usize])
            });
        if count == 0 {
            return DVec3::ZERO;
        }
        total / count as f64
    }

    /// Area of the face, summed over a fan of triangles from the first
    /// vertex.
    pub fn face_area(&self, f: FH, points: &[DVec3]) -> f64 {
        let mut verts = iterator::face_vertices(self, f).map(|v| points[v.index() as usize]);
        let first = match verts.next() {
            Some(p) => p,
            None => return 0.0,
        };
        let mut prev = match verts.next() {
            Some(p) => p,
            None => return 0.0,
        };
        let mut area = 0.0;
        for p in verts {
            area += (prev - first).cross(p - first).length();
            prev = p;
        }
        area * 0.5
    }

    /// Circumcenter of the first three vertices of the face. Falls back to
    /// the face center for degenerate triangles.
    pub fn face_circumcenter(&self, f: FH, points: &[DVec3]) -> DVec3 {
        let mut verts = iterator::face_vertices(self, f).map(|v| points[v.index() as usize]);
        let (a, b, c) = match (verts.next(), verts.next(), verts.next()) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => return self.face_center(f, points),
        };
        let (u, w) = (b - a, c - a);
        let n = u.cross(w);
        let denom = 2.0 * n.length_squared();
        if denom == 0.0 {
            return self.face_center(f, points);
        }
        a + (w.length_squared() * n.cross(u) + u.length_squared() * w.cross(n)) / denom
    }

    /// Measure of how far the face is from being planar. For quads this is
    /// the distance between the two diagonals. For other polygons this is
    /// the largest distance of a vertex from the plane through the center
    /// of the face. Triangles are always planar.
    pub fn face_planarity(&self, f: FH, points: &[DVec3]) -> f64 {
        let ps: Vec<DVec3> = iterator::face_vertices(self, f)
            .map(|v| points[v.index() as usize])
            .collect();
        match ps.len() {
            0..=3 => 0.0,
            4 => {
                let d0 = ps[2] - ps[0];
                let d1 = ps[3] - ps[1];
                let n = d0.cross(d1);
                let len = n.length();
                if len > 0.0 {
                    (ps[1] - ps[0]).dot(n).abs() / len
                } else {
                    0.0
                }
            }
            _ => {
                let normal = self.face_normal(f, points);
                let center = self.face_center(f, points);
                ps.iter()
                    .map(|p| (*p - center).dot(normal).abs())
                    .fold(0.0, f64::max)
            }
        }
    }
}
