use crate::{
    element::{Handle, VH},
    error::Error,
    iterator,
    topol::HeStructure,
};
use glam::DVec3;

/// Conversion to and from face-vertex buffers.
impl HeStructure {
    /// Build a structure with `num_vertices` vertices and one face per entry
    /// of `faces`, given as lists of vertex indices.
    ///
    /// Vertices that are not referenced by any face stay unused.
    pub fn from_face_vertex<I, F>(num_vertices: usize, faces: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u32]>,
    {
        let faces = faces.into_iter();
        let mut topol = HeStructure::with_capacity(
            num_vertices,
            num_vertices * 3,
            faces.size_hint().0,
        );
        topol.add_vertices(num_vertices);
        let mut fverts = Vec::new();
        for face in faces {
            fverts.clear();
            fverts.extend(face.as_ref().iter().map(|i| -> VH { (*i).into() }));
            topol.add_face(&fverts)?;
        }
        tracing::debug!(
            vertices = topol.num_vertices(),
            faces = topol.num_faces(),
            "built structure from face-vertex buffers"
        );
        Ok(topol)
    }

    /// Vertex indices of every used face, in loop order.
    pub fn to_face_vertex(&self) -> Vec<Vec<u32>> {
        self.used_faces()
            .map(|f| {
                iterator::face_vertices(self, f)
                    .map(|v| v.index())
                    .collect()
            })
            .collect()
    }
}

/// Create a strip of quads between two open polylines with the same number
/// of points. The vertices of `a` come first, followed by those of `b`.
pub fn loft_open(a: &[DVec3], b: &[DVec3]) -> Result<(HeStructure, Vec<DVec3>), Error> {
    let n = a.len();
    if b.len() != n {
        return Err(Error::MismatchedArrayLengths(n, b.len()));
    }
    if n < 2 {
        return Err(Error::DegenerateFace(n * 2));
    }
    let nu = n as u32;
    let topol = HeStructure::from_face_vertex(
        2 * n,
        (0..(nu - 1)).map(|i| [i, i + 1, i + nu + 1, i + nu]),
    )?;
    Ok((topol, a.iter().chain(b.iter()).copied().collect()))
}

/// Same as [`loft_open`], but the polylines are treated as closed loops so
/// the strip wraps around.
pub fn loft_closed(a: &[DVec3], b: &[DVec3]) -> Result<(HeStructure, Vec<DVec3>), Error> {
    let n = a.len();
    if b.len() != n {
        return Err(Error::MismatchedArrayLengths(n, b.len()));
    }
    if n < 3 {
        return Err(Error::DegenerateFace(n * 2));
    }
    let nu = n as u32;
    let topol = HeStructure::from_face_vertex(
        2 * n,
        (0..nu).map(|i| {
            let j = (i + 1) % nu;
            [i, j, j + nu, i + nu]
        }),
    )?;
    Ok((topol, a.iter().chain(b.iter()).copied().collect()))
}

/// Create a box with quadrilateral faces, spanning from `min` to `max`.
///
/// Vertices `0..4` go counter clockwise around the bottom, seen from above,
/// starting at `min`, and vertex `i + 4` sits right above vertex `i`. Face 0
/// is the bottom, faces `1..5` are the sides and face 5 is the top.
pub fn quad_box(min: DVec3, max: DVec3) -> Result<(HeStructure, Vec<DVec3>), Error> {
    let ring = [(min.x, min.y), (max.x, min.y), (max.x, max.y), (min.x, max.y)];
    let points = [min.z, max.z]
        .into_iter()
        .flat_map(|z| ring.map(|(x, y)| DVec3::new(x, y, z)))
        .collect();
    let sides = (0..4u32).map(|i| {
        let j = (i + 1) % 4;
        [i, j, j + 4, i + 4]
    });
    let faces = std::iter::once([0, 3, 2, 1])
        .chain(sides)
        .chain(std::iter::once([4, 5, 6, 7]));
    Ok((HeStructure::from_face_vertex(8, faces)?, points))
}

/// Create a tetrahedron centered at the origin. The vertices lie on the
/// sphere with the given radius.
pub fn tetrahedron(radius: f64) -> Result<(HeStructure, Vec<DVec3>), Error> {
    let a = radius * (1.0f64 / 3.0);
    let b = radius * (8.0 / 9.0f64).sqrt();
    let c = radius * (2.0 / 9.0f64).sqrt();
    let d = radius * (2.0 / 3.0f64).sqrt();
    let points = vec![
        DVec3::new(0.0, 0.0, radius),
        DVec3::new(-c, d, -a),
        DVec3::new(-c, -d, -a),
        DVec3::new(b, 0.0, -a),
    ];
    let topol =
        HeStructure::from_face_vertex(4, [[0u32, 1, 2], [0, 2, 3], [0, 3, 1], [3, 2, 1]])?;
    Ok((topol, points))
}

/// Create an octahedron centered at the origin. The vertices lie on the
/// sphere with the given radius.
pub fn octahedron(radius: f64) -> Result<(HeStructure, Vec<DVec3>), Error> {
    let points = vec![
        DVec3::new(radius, 0.0, 0.0),
        DVec3::new(0.0, radius, 0.0),
        DVec3::new(-radius, 0.0, 0.0),
        DVec3::new(0.0, -radius, 0.0),
        DVec3::new(0.0, 0.0, radius),
        DVec3::new(0.0, 0.0, -radius),
    ];
    let topol = HeStructure::from_face_vertex(
        6,
        [
            [0u32, 4, 3],
            [1, 4, 0],
            [2, 4, 1],
            [3, 4, 2],
            [3, 5, 0],
            [0, 5, 1],
            [1, 5, 2],
            [2, 5, 3],
        ],
    )?;
    Ok((topol, points))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::macros::{assert_float_eq, assert_vec_eq};

    #[test]
    fn t_loft_open() {
        let a = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
        ];
        let b = a.map(|p| p + DVec3::Y);
        let (topol, points) = loft_open(&a, &b).unwrap();
        assert_eq!(topol.num_vertices(), 6);
        assert_eq!(points.len(), 6);
        assert_eq!(topol.num_faces(), 2);
        assert_eq!(
            topol.to_face_vertex(),
            vec![vec![0u32, 1, 4, 3], vec![1, 2, 5, 4]]
        );
        assert_eq!(topol.num_edges(), 7);
        for f in topol.faces() {
            assert_vec_eq!(topol.face_normal(f, &points), DVec3::Z);
            assert_float_eq!(topol.face_area(f, &points), 1.0);
        }
        topol.check_topology().unwrap();
    }

    #[test]
    fn t_loft_closed() {
        let a: Vec<DVec3> = (0..4)
            .map(|i| {
                let t = std::f64::consts::FRAC_PI_2 * i as f64;
                DVec3::new(t.cos(), t.sin(), 0.0)
            })
            .collect();
        let b: Vec<DVec3> = a.iter().map(|p| *p + DVec3::Z).collect();
        let (topol, points) = loft_closed(&a, &b).unwrap();
        assert_eq!(points.len(), 8);
        assert_eq!(topol.num_faces(), 4);
        assert_eq!(topol.num_edges(), 12);
        // Two boundary loops of four edges each.
        assert_eq!(topol.edges().filter(|e| e.is_boundary(&topol)).count(), 8);
        topol.check_topology().unwrap();
    }

    #[test]
    fn t_loft_errors() {
        let a = [DVec3::ZERO, DVec3::X];
        assert!(matches!(
            loft_open(&a, &a[..1]),
            Err(Error::MismatchedArrayLengths(2, 1))
        ));
        assert!(loft_open(&a[..1], &a[..1]).is_err());
        assert!(loft_closed(&a, &a).is_err());
    }

    #[test]
    fn t_face_vertex_round_trip() {
        let faces = vec![vec![0u32, 1, 2], vec![0, 2, 3, 4]];
        let topol = HeStructure::from_face_vertex(5, &faces).unwrap();
        assert_eq!(topol.to_face_vertex(), faces);
        assert!(HeStructure::from_face_vertex(3, [[0u32, 1, 5]]).is_err());
    }

    #[test]
    fn t_platonic_solids() {
        let (tet, points) = tetrahedron(2.0).unwrap();
        assert_eq!(
            (tet.num_vertices(), tet.num_edges(), tet.num_faces()),
            (4, 6, 4)
        );
        for p in &points {
            assert_float_eq!(p.length(), 2.0, 1e-12);
        }
        // Outward facing normals.
        for f in tet.faces() {
            let n = tet.face_normal(f, &points);
            assert!(n.dot(tet.face_center(f, &points)) > 0.0);
        }
        let (oct, points) = octahedron(1.0).unwrap();
        assert_eq!(
            (oct.num_vertices(), oct.num_edges(), oct.num_faces()),
            (6, 12, 8)
        );
        for f in oct.faces() {
            let n = oct.face_normal(f, &points);
            assert!(n.dot(oct.face_center(f, &points)) > 0.0);
        }
        oct.check_topology().unwrap();
        tet.check_topology().unwrap();
    }
}
