use crate::{
    element::Handle,
    error::Error,
    topol::HeStructure,
};
use nalgebra::DMatrix;

impl HeStructure {
    /// Symmetric vertex adjacency matrix. Entry `(i, j)` is 1 if an edge
    /// connects vertex `i` to vertex `j`.
    pub fn adjacency_matrix(&self) -> DMatrix<f64> {
        let n = self.num_vertices();
        let mut mat = DMatrix::zeros(n, n);
        for h in self.used_halfedges() {
            if let (Some(a), Some(b)) = (self.start_vertex(h), self.end_vertex(h)) {
                mat[(a.index() as usize, b.index() as usize)] = 1.0;
            }
        }
        mat
    }

    /// Umbrella Laplacian. Off diagonal entries are 1 for every neighbour,
    /// and the diagonal holds the negated degree, so every row sums to zero.
    pub fn laplacian_matrix(&self) -> DMatrix<f64> {
        let n = self.num_vertices();
        let mut mat = DMatrix::zeros(n, n);
        for h in self.used_halfedges() {
            if let (Some(a), Some(b)) = (self.start_vertex(h), self.end_vertex(h)) {
                let (a, b) = (a.index() as usize, b.index() as usize);
                mat[(a, b)] += 1.0;
                mat[(a, a)] -= 1.0;
            }
        }
        mat
    }

    /// Laplacian with a weight per halfedge. The weight of a halfedge from
    /// `i` to `j` goes into entry `(i, j)` and is subtracted from `(i, i)`.
    pub fn laplacian_matrix_weighted(&self, halfedge_weights: &[f64]) -> Result<DMatrix<f64>, Error> {
        if halfedge_weights.len() != self.num_halfedges() {
            return Err(Error::MismatchedArrayLengths(
                self.num_halfedges(),
                halfedge_weights.len(),
            ));
        }
        let n = self.num_vertices();
        let mut mat = DMatrix::zeros(n, n);
        for h in self.used_halfedges() {
            if let (Some(a), Some(b)) = (self.start_vertex(h), self.end_vertex(h)) {
                let (a, b) = (a.index() as usize, b.index() as usize);
                let w = halfedge_weights[h.index() as usize];
                mat[(a, b)] += w;
                mat[(a, a)] -= w;
            }
        }
        Ok(mat)
    }

    /// Vertex-edge incidence matrix with one row per vertex and one column
    /// per edge. The column of an edge is -1 at the start of its first
    /// halfedge and +1 at the end.
    pub fn incidence_matrix(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.num_vertices(), self.num_edges());
        for e in self.used_edges() {
            let h = e.halfedge(false);
            if let (Some(a), Some(b)) = (self.start_vertex(h), self.end_vertex(h)) {
                let col = e.index() as usize;
                mat[(a.index() as usize, col)] = -1.0;
                mat[(b.index() as usize, col)] = 1.0;
            }
        }
        mat
    }
}

#[cfg(test)]
mod test {
    use crate::{element::Handle, macros::assert_float_eq, primitive, topol::test::quad_box};
    use glam::DVec3;

    #[test]
    fn t_adjacency_matrix() {
        let topol = quad_box();
        let adj = topol.adjacency_matrix();
        assert_eq!(adj.shape(), (8, 8));
        assert_eq!(adj, adj.transpose());
        for row in adj.row_iter() {
            assert_float_eq!(row.sum(), 3.0);
        }
        assert_float_eq!(adj[(0, 1)], 1.0);
        assert_float_eq!(adj[(0, 6)], 0.0);
    }

    #[test]
    fn t_laplacian_matrix() {
        let topol = quad_box();
        let lap = topol.laplacian_matrix();
        for i in 0..8 {
            assert_float_eq!(lap[(i, i)], -3.0);
            assert_float_eq!(lap.row(i).sum(), 0.0);
        }
        assert_eq!(lap, lap.transpose());
    }

    #[test]
    fn t_cotangent_laplacian_rows() {
        let (topol, points) = primitive::octahedron(1.0).unwrap();
        let mut weights = vec![0.0; topol.num_halfedges()];
        topol.cotangent_weights(&points, &mut weights).unwrap();
        let lap = topol.laplacian_matrix_weighted(&weights).unwrap();
        for row in lap.row_iter() {
            assert_float_eq!(row.sum(), 0.0);
        }
        // All angles are 60 degrees.
        assert_float_eq!(lap[(0, 4)], 1.0 / 3.0f64.sqrt());
        // Area normalized weights still give zero row sums.
        let mut areas = vec![0.0; topol.num_vertices()];
        topol
            .vertex_barycentric_areas(&points, &mut areas, false)
            .unwrap();
        topol
            .cotangent_weights_normalized(&points, &areas, &mut weights)
            .unwrap();
        let lap = topol.laplacian_matrix_weighted(&weights).unwrap();
        for row in lap.row_iter() {
            assert_float_eq!(row.sum(), 0.0);
        }
        assert!(topol.laplacian_matrix_weighted(&weights[1..]).is_err());
    }

    #[test]
    fn t_symmetric_laplacian() {
        let (topol, mut points) = primitive::octahedron(1.0).unwrap();
        // Uneven vertex areas.
        points[0].x = 1.5;
        points[4].z = 2.0;
        points[3] += DVec3::new(0.2, -0.3, 0.1);
        let mut areas = vec![0.0; topol.num_vertices()];
        topol
            .vertex_barycentric_areas(&points, &mut areas, false)
            .unwrap();
        assert!((areas[4] - areas[5]).abs() > 1e-3);
        let mut cot = vec![0.0; topol.num_halfedges()];
        topol.cotangent_weights(&points, &mut cot).unwrap();
        let mut weights = vec![0.0; topol.num_halfedges()];
        topol
            .cotangent_weights_symmetric(&points, &areas, &mut weights)
            .unwrap();
        for h in topol.halfedges() {
            let (a, b) = (
                topol.start_vertex(h).unwrap().index() as usize,
                topol.end_vertex(h).unwrap().index() as usize,
            );
            assert_float_eq!(weights[h.index() as usize], weights[h.twin().index() as usize]);
            assert_float_eq!(
                weights[h.index() as usize],
                cot[h.index() as usize] / (areas[a] * areas[b]).sqrt()
            );
        }
        let lap = topol.laplacian_matrix_weighted(&weights).unwrap();
        for row in lap.row_iter() {
            assert_float_eq!(row.sum(), 0.0);
        }
        assert!((&lap - lap.transpose()).abs().max() < 1e-12);
        // The start-area variant is not symmetric on this mesh.
        topol
            .cotangent_weights_normalized(&points, &areas, &mut weights)
            .unwrap();
        let lap = topol.laplacian_matrix_weighted(&weights).unwrap();
        for row in lap.row_iter() {
            assert_float_eq!(row.sum(), 0.0);
        }
        assert!((&lap - lap.transpose()).abs().max() > 1e-6);
    }

    #[test]
    fn t_incidence_matrix() {
        let (topol, points) =
            primitive::loft_open(&[DVec3::ZERO, DVec3::X], &[DVec3::Y, DVec3::ONE]).unwrap();
        assert_eq!(points.len(), 4);
        let inc = topol.incidence_matrix();
        assert_eq!(inc.shape(), (4, 4));
        for col in inc.column_iter() {
            assert_float_eq!(col.sum(), 0.0);
            assert_float_eq!(col.abs().sum(), 2.0);
        }
        // The umbrella Laplacian factors through the incidence matrix.
        let lap = topol.laplacian_matrix();
        let product = &inc * inc.transpose();
        assert!((lap + product).abs().max() < 1e-12);
    }
}
