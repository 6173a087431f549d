use crate::{
    element::{FH, HH, Handle},
    error::Error,
    topol::HeStructure,
};

fn check_halfedges(topol: &HeStructure, hcount: &mut [u32]) -> Result<(), Error> {
    hcount.fill(0);
    for h in topol.halfedges() {
        // Twins are used or unused together.
        if topol.is_unused_halfedge(h) != topol.is_unused_halfedge(h.twin()) {
            return Err(Error::InvalidTwin(h));
        }
        if topol.is_unused_halfedge(h) {
            continue;
        }
        let (prev, next) = (topol.prev_halfedge(h), topol.next_halfedge(h));
        if !topol.owns_halfedge(prev) || !topol.owns_halfedge(next) {
            return Err(Error::InvalidHalfedgeLink(h));
        }
        if topol.is_unused_halfedge(prev)
            || topol.is_unused_halfedge(next)
            || topol.next_halfedge(prev) != h
            || topol.prev_halfedge(next) != h
        {
            return Err(Error::InvalidHalfedgeLink(h));
        }
        // Consecutive halfedges share a vertex.
        if topol.start_vertex(next) != topol.end_vertex(h) {
            return Err(Error::InvalidHalfedgeLink(h));
        }
        if topol.halfedge_face(next) != topol.halfedge_face(h) {
            return Err(Error::InconsistentFaceInLoop(next));
        }
        if let Some(v) = topol.start_vertex(h) {
            topol.vertex_check(v)?;
            if topol.is_unused_vertex(v) {
                return Err(Error::InvalidOutgoingHalfedge(v));
            }
            hcount[v.index() as usize] += 1;
        }
        if let Some(f) = topol.halfedge_face(h) {
            topol.face_check(f)?;
            if topol.is_unused_face(f) {
                return Err(Error::InvalidFaceHalfedgeLink(f, h));
            }
        }
    }
    Ok(())
}

fn check_vertices(topol: &HeStructure, hcount: &[u32], hvisited: &mut [bool]) -> Result<(), Error> {
    hvisited.fill(false);
    let limit = topol.num_halfedges();
    for v in topol.used_vertices() {
        let hstart = match topol.vertex_halfedge(v) {
            Some(h) => h,
            None => continue,
        };
        if !topol.owns_halfedge(hstart)
            || topol.is_unused_halfedge(hstart)
            || topol.start_vertex(hstart) != Some(v)
        {
            return Err(Error::InvalidOutgoingHalfedge(v));
        }
        // Walk the star without trusting it to close.
        let mut h = hstart;
        let mut count = 0u32;
        let mut has_hole = false;
        loop {
            if topol.start_vertex(h) != Some(v)
                || std::mem::replace(&mut hvisited[h.index() as usize], true)
            {
                return Err(Error::InvalidOutgoingHalfedge(v));
            }
            has_hole |= topol.is_hole_halfedge(h);
            count += 1;
            h = topol.rotated_halfedge(h);
            if h == hstart {
                break;
            }
            if count as usize > limit {
                return Err(Error::InvalidOutgoingHalfedge(v));
            }
        }
        // Every halfedge starting at the vertex is reachable from the first
        // one, and the first one is a hole if there are any.
        if count != hcount[v.index() as usize]
            || (has_hole && !topol.is_hole_halfedge(hstart))
        {
            return Err(Error::InvalidOutgoingHalfedge(v));
        }
    }
    Ok(())
}

fn check_face_loop(topol: &HeStructure, f: FH, hstart: HH) -> Result<(), Error> {
    let limit = topol.num_halfedges();
    let mut h = hstart;
    for _ in 0..=limit {
        if topol.halfedge_face(h) != Some(f) {
            return Err(Error::InconsistentFaceInLoop(h));
        }
        h = topol.next_halfedge(h);
        if h == hstart {
            return Ok(());
        }
    }
    Err(Error::InvalidLoop(hstart))
}

fn check_faces(topol: &HeStructure) -> Result<(), Error> {
    for f in topol.used_faces() {
        let h = match topol.face_halfedge(f) {
            Some(h) => h,
            None => continue,
        };
        if !topol.owns_halfedge(h) || topol.is_unused_halfedge(h) {
            return Err(Error::InvalidFaceHalfedgeLink(f, h));
        }
        if topol.halfedge_face(h) != Some(f) {
            return Err(Error::InvalidFaceHalfedgeLink(f, h));
        }
        check_face_loop(topol, f, h)?;
    }
    Ok(())
}

impl HeStructure {
    /// Verify the connectivity of the structure.
    ///
    /// This checks that twins agree on being used, that `next` and `prev`
    /// links mirror each other, that every loop closes with a single face,
    /// and that the halfedges of vertices and faces point back at them.
    pub fn check_topology(&self) -> Result<(), Error> {
        let mut hcount = vec![0u32; self.num_vertices()];
        let mut hvisited = vec![false; self.num_halfedges()];
        check_halfedges(self, &mut hcount)?;
        check_vertices(self, &hcount, &mut hvisited)?;
        check_faces(self)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::Error,
        topol::{HeStructure, test::holed_grid},
    };

    #[test]
    fn t_valid_meshes() {
        holed_grid().check_topology().expect("Topology is broken");
        HeStructure::default()
            .check_topology()
            .expect("Empty structure must be valid");
    }

    #[test]
    fn t_broken_link() {
        let mut mesh = holed_grid();
        let h = mesh.find_halfedge(5.into(), 6.into()).unwrap();
        let n = mesh.next_halfedge(h);
        // Skip a halfedge in the loop.
        mesh.link_halfedges(h, mesh.next_halfedge(n));
        assert!(matches!(
            mesh.check_topology(),
            Err(Error::InvalidHalfedgeLink(_))
        ));
    }

    #[test]
    fn t_half_removed_edge() {
        let mut mesh = holed_grid();
        let h = mesh.find_halfedge(0.into(), 1.into()).unwrap();
        mesh.make_edge_unused(h);
        mesh.set_start(h.twin(), 1.into());
        assert!(mesh.check_topology().is_err());
    }

    #[test]
    fn t_wrong_face() {
        let mut mesh = holed_grid();
        let h = mesh.find_halfedge(0.into(), 1.into()).unwrap();
        mesh.set_halfedge_face(h, Some(3.into()));
        assert!(mesh.check_topology().is_err());
    }
}
