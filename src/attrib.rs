/*!
Bulk attribute computations.

Every function in this module writes one value per element into a caller
supplied slice, which must be exactly as long as the corresponding element
list. Slots of unused elements are left untouched. Functions that take a
`parallel` flag distribute the elements over the rayon thread pool when the
`parallel` feature is enabled, and run sequentially otherwise.
*/

use crate::{
    element::{EH, FH, HH, Handle, VH},
    error::Error,
    iterator,
    topol::HeStructure,
};
use glam::DVec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

fn check_len(expected: usize, found: usize) -> Result<(), Error> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::MismatchedArrayLengths(expected, found))
    }
}

/// Write `f(i)` into `out[i]` for every `i` for which `used(i)` is true.
fn fill_used<T, U, F>(out: &mut [T], parallel: bool, used: U, f: F)
where
    T: Send,
    U: Fn(usize) -> bool + Sync,
    F: Fn(usize) -> T + Sync,
{
    #[cfg(feature = "parallel")]
    {
        if parallel {
            out.par_iter_mut().enumerate().for_each(|(i, dst)| {
                if used(i) {
                    *dst = f(i);
                }
            });
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;
    for (i, dst) in out.iter_mut().enumerate() {
        if used(i) {
            *dst = f(i);
        }
    }
}

impl HeStructure {
    fn fill_vertices<T, F>(&self, out: &mut [T], parallel: bool, f: F) -> Result<(), Error>
    where
        T: Send,
        F: Fn(VH) -> T + Sync,
    {
        check_len(self.num_vertices(), out.len())?;
        fill_used(
            out,
            parallel,
            |i| !self.is_unused_vertex((i as u32).into()),
            |i| f((i as u32).into()),
        );
        Ok(())
    }

    fn fill_halfedges<T, F>(&self, out: &mut [T], parallel: bool, f: F) -> Result<(), Error>
    where
        T: Send,
        F: Fn(HH) -> T + Sync,
    {
        check_len(self.num_halfedges(), out.len())?;
        fill_used(
            out,
            parallel,
            |i| !self.is_unused_halfedge((i as u32).into()),
            |i| f((i as u32).into()),
        );
        Ok(())
    }

    fn fill_edges<T, F>(&self, out: &mut [T], parallel: bool, f: F) -> Result<(), Error>
    where
        T: Send,
        F: Fn(EH) -> T + Sync,
    {
        check_len(self.num_edges(), out.len())?;
        fill_used(
            out,
            parallel,
            |i| !self.is_unused_halfedge(((i as u32) << 1).into()),
            |i| f((i as u32).into()),
        );
        Ok(())
    }

    fn fill_faces<T, F>(&self, out: &mut [T], parallel: bool, f: F) -> Result<(), Error>
    where
        T: Send,
        F: Fn(FH) -> T + Sync,
    {
        check_len(self.num_faces(), out.len())?;
        fill_used(
            out,
            parallel,
            |i| !self.is_unused_face((i as u32).into()),
            |i| f((i as u32).into()),
        );
        Ok(())
    }

    // Edges and halfedges.

    pub fn edge_lengths(&self, points: &[DVec3], out: &mut [f64], parallel: bool) -> Result<(), Error> {
        self.fill_edges(out, parallel, |e| {
            self.halfedge_length(e.halfedge(false), points)
        })
    }

    pub fn halfedge_angles(
        &self,
        points: &[DVec3],
        out: &mut [f64],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_halfedges(out, parallel, |h| self.halfedge_angle(h, points))
    }

    pub fn halfedge_normals(
        &self,
        points: &[DVec3],
        out: &mut [DVec3],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_halfedges(out, parallel, |h| self.halfedge_normal(h, points))
    }

    /// Dihedral angle of every edge. Boundary edges get `NaN`.
    pub fn dihedral_angles(
        &self,
        points: &[DVec3],
        fnormals: &[DVec3],
        out: &mut [f64],
        parallel: bool,
    ) -> Result<(), Error> {
        check_len(self.num_faces(), fnormals.len())?;
        self.fill_edges(out, parallel, |e| {
            self.dihedral_angle(e.halfedge(false), points, fnormals)
                .unwrap_or(f64::NAN)
        })
    }

    /// Symmetric cotangent weights. Both halfedges of an edge get half the
    /// sum of the cotangents of the angles opposite to the edge. Faces are
    /// assumed to be triangles.
    pub fn cotangent_weights(&self, points: &[DVec3], out: &mut [f64]) -> Result<(), Error> {
        check_len(self.num_halfedges(), out.len())?;
        for h in self.used_halfedges().filter(|h| h.index() & 1 == 0) {
            let w = self.edge_cotangent_weight(h, points);
            out[h.index() as usize] = w;
            out[h.twin().index() as usize] = w;
        }
        Ok(())
    }

    /// Cotangent weights divided by the area of the start vertex of each
    /// halfedge. The result is not symmetric.
    pub fn cotangent_weights_normalized(
        &self,
        points: &[DVec3],
        vareas: &[f64],
        out: &mut [f64],
    ) -> Result<(), Error> {
        check_len(self.num_vertices(), vareas.len())?;
        self.cotangent_weights(points, out)?;
        let mut degenerate = 0usize;
        for h in self.used_halfedges() {
            let area = self.start_vertex(h).map_or(0.0, |v| vareas[v.index() as usize]);
            let w = &mut out[h.index() as usize];
            if area > 0.0 {
                *w /= area;
            } else {
                *w = 0.0;
                degenerate += 1;
            }
        }
        if degenerate > 0 {
            tracing::warn!(halfedges = degenerate, "zero vertex area while normalizing cotangent weights");
        }
        Ok(())
    }

    /// Cotangent weights divided by the geometric mean of the areas of the
    /// two vertices of each edge. The result is symmetric.
    pub fn cotangent_weights_symmetric(
        &self,
        points: &[DVec3],
        vareas: &[f64],
        out: &mut [f64],
    ) -> Result<(), Error> {
        check_len(self.num_vertices(), vareas.len())?;
        self.cotangent_weights(points, out)?;
        let mut degenerate = 0usize;
        for h in self.used_halfedges().filter(|h| h.index() & 1 == 0) {
            let area = match (self.start_vertex(h), self.end_vertex(h)) {
                (Some(a), Some(b)) => (vareas[a.index() as usize] * vareas[b.index() as usize]).sqrt(),
                _ => 0.0,
            };
            let w = if area > 0.0 {
                out[h.index() as usize] / area
            } else {
                degenerate += 1;
                0.0
            };
            out[h.index() as usize] = w;
            out[h.twin().index() as usize] = w;
        }
        if degenerate > 0 {
            tracing::warn!(edges = degenerate, "zero vertex area while normalizing cotangent weights");
        }
        Ok(())
    }

    // Vertices.

    pub fn vertex_degrees(&self, out: &mut [usize]) -> Result<(), Error> {
        self.fill_vertices(out, false, |v| iterator::vertex_degree(self, v))
    }

    pub fn vertex_normals(
        &self,
        points: &[DVec3],
        out: &mut [DVec3],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_vertices(out, parallel, |v| self.vertex_normal(v, points))
    }

    pub fn vertex_barycentric_areas(
        &self,
        points: &[DVec3],
        out: &mut [f64],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_vertices(out, parallel, |v| self.vertex_barycentric_area(v, points))
    }

    pub fn vertex_circumcentric_areas(
        &self,
        points: &[DVec3],
        out: &mut [f64],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_vertices(out, parallel, |v| self.vertex_circumcentric_area(v, points))
    }

    pub fn vertex_angle_sums(
        &self,
        points: &[DVec3],
        out: &mut [f64],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_vertices(out, parallel, |v| self.vertex_angle_sum(v, points))
    }

    pub fn gaussian_curvatures(
        &self,
        points: &[DVec3],
        out: &mut [f64],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_vertices(out, parallel, |v| self.vertex_gaussian_curvature(v, points))
    }

    pub fn umbrella_laplacians(
        &self,
        points: &[DVec3],
        out: &mut [DVec3],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_vertices(out, parallel, |v| self.vertex_umbrella_laplacian(v, points))
    }

    /// Weighted Laplacian of the positions, `sum(w[h] * (p[end] - p[start]))`
    /// over the outgoing halfedges `h` of each vertex.
    pub fn cotangent_laplacians(
        &self,
        points: &[DVec3],
        hweights: &[f64],
        out: &mut [DVec3],
        parallel: bool,
    ) -> Result<(), Error> {
        check_len(self.num_halfedges(), hweights.len())?;
        self.fill_vertices(out, parallel, |v| {
            iterator::outgoing_halfedges(self, v).fold(DVec3::ZERO, |total, h| {
                total + hweights[h.index() as usize] * self.halfedge_vector(h, points)
            })
        })
    }

    /// Mean curvature as half the length of the Laplacian. With cotangent
    /// weights normalized by the circumcentric vertex areas, this is the
    /// discrete mean curvature of the surface.
    pub fn mean_curvatures(
        &self,
        points: &[DVec3],
        hweights: &[f64],
        out: &mut [f64],
        parallel: bool,
    ) -> Result<(), Error> {
        let mut laplacians = vec![DVec3::ZERO; self.num_vertices()];
        self.cotangent_laplacians(points, hweights, &mut laplacians, parallel)?;
        self.fill_vertices(out, parallel, |v| 0.5 * laplacians[v.index() as usize].length())
    }

    // Faces.

    pub fn face_degrees(&self, out: &mut [usize]) -> Result<(), Error> {
        self.fill_faces(out, false, |f| iterator::face_degree(self, f))
    }

    pub fn face_normals(
        &self,
        points: &[DVec3],
        out: &mut [DVec3],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_faces(out, parallel, |f| self.face_normal(f, points))
    }

    pub fn face_centers(
        &self,
        points: &[DVec3],
        out: &mut [DVec3],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_faces(out, parallel, |f| self.face_center(f, points))
    }

    pub fn face_areas(&self, points: &[DVec3], out: &mut [f64], parallel: bool) -> Result<(), Error> {
        self.fill_faces(out, parallel, |f| self.face_area(f, points))
    }

    pub fn face_circumcenters(
        &self,
        points: &[DVec3],
        out: &mut [DVec3],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_faces(out, parallel, |f| self.face_circumcenter(f, points))
    }

    pub fn face_planarities(
        &self,
        points: &[DVec3],
        out: &mut [f64],
        parallel: bool,
    ) -> Result<(), Error> {
        self.fill_faces(out, parallel, |f| self.face_planarity(f, points))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::Error,
        macros::{assert_float_eq, assert_vec_eq},
        primitive,
    };
    use glam::DVec3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn t_box_attributes() {
        let (qbox, points) = primitive::quad_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let mut lengths = vec![0.0; qbox.num_edges()];
        qbox.edge_lengths(&points, &mut lengths, true).unwrap();
        assert!(lengths.iter().all(|l| *l == 1.0));
        let mut degrees = vec![0; qbox.num_vertices()];
        qbox.vertex_degrees(&mut degrees).unwrap();
        assert_eq!(degrees, vec![3; 8]);
        let mut fdegrees = vec![0; qbox.num_faces()];
        qbox.face_degrees(&mut fdegrees).unwrap();
        assert_eq!(fdegrees, vec![4; 6]);
        let mut angles = vec![0.0; qbox.num_halfedges()];
        qbox.halfedge_angles(&points, &mut angles, false).unwrap();
        for a in angles {
            assert_float_eq!(a, FRAC_PI_2);
        }
        let mut centers = vec![DVec3::ZERO; qbox.num_faces()];
        qbox.face_centers(&points, &mut centers, true).unwrap();
        assert_vec_eq!(centers[5], DVec3::new(0.5, 0.5, 1.0));
        let mut normals = vec![DVec3::ZERO; qbox.num_vertices()];
        qbox.vertex_normals(&points, &mut normals, true).unwrap();
        for (p, n) in points.iter().zip(normals.iter()) {
            assert_vec_eq!(*n, (*p - DVec3::splat(0.5)).normalize(), 1e-12);
        }
    }

    #[test]
    fn t_mismatched_lengths() {
        let (qbox, points) = primitive::quad_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let mut lengths = vec![0.0; 3];
        assert!(matches!(
            qbox.edge_lengths(&points, &mut lengths, false),
            Err(Error::MismatchedArrayLengths(12, 3))
        ));
        let fnormals = vec![DVec3::Z; 2];
        let mut out = vec![0.0; qbox.num_edges()];
        assert!(qbox.dihedral_angles(&points, &fnormals, &mut out, false).is_err());
    }

    #[test]
    fn t_parallel_matches_sequential() {
        let (mesh, points) = primitive::octahedron(1.5).unwrap();
        let mut seq = vec![0.0; mesh.num_vertices()];
        let mut par = vec![0.0; mesh.num_vertices()];
        mesh.vertex_circumcentric_areas(&points, &mut seq, false).unwrap();
        mesh.vertex_circumcentric_areas(&points, &mut par, true).unwrap();
        assert_eq!(seq, par);
        let mut seq = vec![DVec3::ZERO; mesh.num_faces()];
        let mut par = vec![DVec3::ZERO; mesh.num_faces()];
        mesh.face_circumcenters(&points, &mut seq, false).unwrap();
        mesh.face_circumcenters(&points, &mut par, true).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn t_octahedron_mean_curvature() {
        let (mesh, points) = primitive::octahedron(1.0).unwrap();
        let mut areas = vec![0.0; mesh.num_vertices()];
        mesh.vertex_circumcentric_areas(&points, &mut areas, false).unwrap();
        for a in &areas {
            assert_float_eq!(*a, 2.0 * 3f64.sqrt() / 3.0, 1e-12);
        }
        let mut weights = vec![0.0; mesh.num_halfedges()];
        mesh.cotangent_weights(&points, &mut weights).unwrap();
        for w in &weights {
            assert_float_eq!(*w, 1.0 / 3f64.sqrt(), 1e-12);
        }
        mesh.cotangent_weights_normalized(&points, &areas, &mut weights)
            .unwrap();
        let mut curvature = vec![0.0; mesh.num_vertices()];
        mesh.mean_curvatures(&points, &weights, &mut curvature, true)
            .unwrap();
        for h in curvature {
            assert_float_eq!(h, 1.0, 1e-12);
        }
        let mut symmetric = vec![0.0; mesh.num_halfedges()];
        mesh.cotangent_weights_symmetric(&points, &areas, &mut symmetric)
            .unwrap();
        // All vertex areas are equal, so both normalizations agree.
        for (a, b) in weights.iter().zip(symmetric.iter()) {
            assert_float_eq!(*a, *b, 1e-12);
        }
    }

    #[test]
    fn t_dihedral_boundary_nan() {
        let a = [DVec3::ZERO, DVec3::X, 2.0 * DVec3::X];
        let b = a.map(|p| p + DVec3::Y);
        let (strip, points) = primitive::loft_open(&a, &b).unwrap();
        let mut fnormals = vec![DVec3::ZERO; strip.num_faces()];
        strip.face_normals(&points, &mut fnormals, false).unwrap();
        let mut angles = vec![0.0; strip.num_edges()];
        strip
            .dihedral_angles(&points, &fnormals, &mut angles, false)
            .unwrap();
        assert_eq!(angles.iter().filter(|a| a.is_nan()).count(), 6);
        assert_float_eq!(
            angles.iter().copied().find(|a| !a.is_nan()).unwrap(),
            std::f64::consts::PI
        );
    }
}
