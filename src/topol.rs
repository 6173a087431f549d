use crate::{
    element::{EH, FH, Face, HH, Halfedge, Handle, VH, Vertex},
    error::Error,
    iterator,
    list::ElementList,
};
use std::ops::Range;

/// Scratch buffers reused across calls to [`HeStructure::add_face`].
#[derive(Default)]
pub(crate) struct FaceScratch {
    /// Existing halfedge for each side of the face, if any.
    existing: Vec<Option<HH>>,
    /// Gap that receives the fans displaced at each corner.
    gaps: Vec<Option<HH>>,
    /// Halfedges of the new face, in loop order.
    halfedges: Vec<HH>,
}

impl FaceScratch {
    fn clear(&mut self) {
        self.existing.clear();
        self.gaps.clear();
        self.halfedges.clear();
    }
}

/// Halfedge structure representing either a graph or a polygon mesh.
///
/// The structure only stores connectivity. Positions and every other
/// attribute live in arrays owned by the caller, indexed by the
/// [`Handle::index`] of the elements. A graph is a structure that has no
/// faces, in which case every halfedge is a boundary halfedge.
///
/// Halfedges are always stored in twin pairs: the twin of halfedge `i` is
/// halfedge `i ^ 1`, and both belong to edge `i >> 1`.
pub struct HeStructure {
    pub(crate) verts: ElementList<Vertex>,
    pub(crate) hedges: ElementList<Halfedge>,
    pub(crate) faces: ElementList<Face>,
    scratch: FaceScratch,
}

impl Clone for HeStructure {
    fn clone(&self) -> Self {
        HeStructure {
            verts: self.verts.clone(),
            hedges: self.hedges.clone(),
            faces: self.faces.clone(),
            scratch: FaceScratch::default(),
        }
    }
}

impl Default for HeStructure {
    fn default() -> Self {
        Self::new()
    }
}

impl HeStructure {
    pub fn new() -> Self {
        HeStructure {
            verts: ElementList::new(),
            hedges: ElementList::new(),
            faces: ElementList::new(),
            scratch: FaceScratch::default(),
        }
    }

    pub fn with_capacity(nverts: usize, nedges: usize, nfaces: usize) -> Self {
        HeStructure {
            verts: ElementList::with_capacity(nverts),
            hedges: ElementList::with_capacity(nedges * 2),
            faces: ElementList::with_capacity(nfaces),
            scratch: FaceScratch::default(),
        }
    }

    pub fn vertex_list(&self) -> &ElementList<Vertex> {
        &self.verts
    }

    pub fn halfedge_list(&self) -> &ElementList<Halfedge> {
        &self.hedges
    }

    pub fn face_list(&self) -> &ElementList<Face> {
        &self.faces
    }

    pub(crate) fn halfedge(&self, h: HH) -> &Halfedge {
        self.hedges.get(h)
    }

    fn halfedge_mut(&mut self, h: HH) -> &mut Halfedge {
        self.hedges.get_mut(h)
    }

    pub fn num_vertices(&self) -> usize {
        self.verts.len()
    }

    pub fn num_halfedges(&self) -> usize {
        self.hedges.len()
    }

    pub fn num_edges(&self) -> usize {
        self.hedges.len() >> 1
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VH> + use<> {
        (0..(self.num_vertices() as u32)).map(|i| i.into())
    }

    pub fn halfedges(&self) -> impl Iterator<Item = HH> + use<> {
        (0..(self.num_halfedges() as u32)).map(|i| i.into())
    }

    pub fn edges(&self) -> impl Iterator<Item = EH> + use<> {
        (0..(self.num_edges() as u32)).map(|i| i.into())
    }

    pub fn faces(&self) -> impl Iterator<Item = FH> + use<> {
        (0..(self.num_faces() as u32)).map(|i| i.into())
    }

    pub fn used_vertices(&self) -> impl Iterator<Item = VH> + use<'_> {
        self.verts.used_handles()
    }

    pub fn used_halfedges(&self) -> impl Iterator<Item = HH> + use<'_> {
        self.hedges.used_handles()
    }

    /// Edges whose halfedges are in use.
    pub fn used_edges(&self) -> impl Iterator<Item = EH> + use<'_> {
        self.edges()
            .filter(|e| !self.is_unused_halfedge(e.halfedge(false)))
    }

    pub fn used_faces(&self) -> impl Iterator<Item = FH> + use<'_> {
        self.faces.used_handles()
    }

    // Connectivity queries.

    pub fn vertex_halfedge(&self, v: VH) -> Option<HH> {
        self.verts.get(v).halfedge
    }

    pub fn start_vertex(&self, h: HH) -> Option<VH> {
        self.halfedge(h).start
    }

    pub fn end_vertex(&self, h: HH) -> Option<VH> {
        self.halfedge(h.twin()).start
    }

    pub fn twin_halfedge(&self, h: HH) -> HH {
        h.twin()
    }

    pub fn prev_halfedge(&self, h: HH) -> HH {
        self.halfedge(h).prev
    }

    pub fn next_halfedge(&self, h: HH) -> HH {
        self.halfedge(h).next
    }

    pub fn halfedge_face(&self, h: HH) -> Option<FH> {
        self.halfedge(h).face
    }

    pub fn halfedge_edge(&self, h: HH) -> EH {
        h.edge()
    }

    pub fn edge_halfedge(&self, e: EH, flag: bool) -> HH {
        e.halfedge(flag)
    }

    pub fn face_halfedge(&self, f: FH) -> Option<HH> {
        self.faces.get(f).halfedge
    }

    /// The next outgoing halfedge around the start vertex of `h`.
    pub fn rotated_halfedge(&self, h: HH) -> HH {
        self.next_halfedge(h.twin())
    }

    pub fn is_unused_vertex(&self, v: VH) -> bool {
        self.verts.is_unused(v)
    }

    pub fn is_unused_halfedge(&self, h: HH) -> bool {
        self.hedges.is_unused(h)
    }

    pub fn is_unused_face(&self, f: FH) -> bool {
        self.faces.is_unused(f)
    }

    /// Check if the halfedge borders a hole, i.e. has no face of its own.
    pub fn is_hole_halfedge(&self, h: HH) -> bool {
        self.halfedge(h).face.is_none()
    }

    /// Check if either the halfedge or its twin has no face.
    pub fn is_boundary_halfedge(&self, h: HH) -> bool {
        self.is_hole_halfedge(h) || self.is_hole_halfedge(h.twin())
    }

    /// Check if the vertex is on a boundary. Vertices without any edges are
    /// considered to be on the boundary.
    ///
    /// This relies on the outgoing halfedge of a boundary vertex being a
    /// hole halfedge, which all editing operations maintain.
    pub fn is_boundary_vertex(&self, v: VH) -> bool {
        match self.vertex_halfedge(v) {
            Some(h) => self.is_hole_halfedge(h),
            None => true,
        }
    }

    /// Check if any edge of the face lies on a boundary.
    pub fn is_boundary_face(&self, f: FH) -> bool {
        iterator::face_halfedges(self, f).any(|h| self.is_hole_halfedge(h.twin()))
    }

    pub fn is_manifold_vertex(&self, v: VH) -> bool {
        /* If just the first outgoing halfedge is on the boundary, it just means
         * the vertex is on the boundary. If the first outgoing halfedge is not
         * on the boundary, it implies the vertex is in the interior. In both
         * cases the vertex is manifold. If any outgoing halfedge apart from the
         * first is on the boundary, it implies there are more than one gaps
         * when circulating around the vertex, making it non-manifold. For this
         * reason, we skip the first halfedge and check the rest.
         */
        iterator::outgoing_halfedges(self, v)
            .skip(1)
            .all(|h| !self.is_hole_halfedge(h))
    }

    pub fn find_halfedge(&self, from: VH, to: VH) -> Option<HH> {
        iterator::outgoing_halfedges(self, from).find(|h| self.end_vertex(*h) == Some(to))
    }

    // Ownership.

    pub fn owns_vertex(&self, v: VH) -> bool {
        self.verts.owns(v)
    }

    pub fn owns_halfedge(&self, h: HH) -> bool {
        self.hedges.owns(h)
    }

    pub fn owns_face(&self, f: FH) -> bool {
        self.faces.owns(f)
    }

    pub fn vertex_check(&self, v: VH) -> Result<(), Error> {
        self.verts.owns_check(v)
    }

    pub fn halfedge_check(&self, h: HH) -> Result<(), Error> {
        self.hedges.owns_check(h)
    }

    pub fn face_check(&self, f: FH) -> Result<(), Error> {
        self.faces.owns_check(f)
    }

    pub fn used_vertex_check(&self, v: VH) -> Result<(), Error> {
        self.verts.used_check(v)
    }

    pub fn used_halfedge_check(&self, h: HH) -> Result<(), Error> {
        self.hedges.used_check(h)
    }

    pub fn used_face_check(&self, f: FH) -> Result<(), Error> {
        self.faces.used_check(f)
    }

    // Tags.

    pub fn next_vertex_tag(&mut self) -> i32 {
        self.verts.next_tag()
    }

    pub fn next_halfedge_tag(&mut self) -> i32 {
        self.hedges.next_tag()
    }

    pub fn next_face_tag(&mut self) -> i32 {
        self.faces.next_tag()
    }

    // Low level construction. None of these validate the topology.

    pub fn add_vertex(&mut self) -> VH {
        self.verts.add(Vertex { halfedge: None })
    }

    /// Add `n` vertices and return the range of their indices.
    pub fn add_vertices(&mut self, n: usize) -> Range<u32> {
        let first = self.verts.len() as u32;
        self.verts.reserve(n);
        for _ in 0..n {
            self.add_vertex();
        }
        first..(first + n as u32)
    }

    /// Add a pair of twin halfedges and return the first one.
    ///
    /// Both halfedges are unused until their start vertices are set. Their
    /// `next` and `prev` links point at each other.
    pub fn add_pair(&mut self) -> HH {
        let h0: HH = (self.hedges.len() as u32).into();
        self.hedges.add(Halfedge::unlinked(h0.twin()));
        self.hedges.add(Halfedge::unlinked(h0));
        h0
    }

    /// Register a face for the closed loop of halfedges through `h`. Every
    /// halfedge in the loop is assigned to the new face.
    pub fn add_face_record(&mut self, h: HH) -> FH {
        let f = self.faces.add(Face { halfedge: Some(h) });
        let mut current = h;
        loop {
            self.halfedge_mut(current).face = Some(f);
            current = self.next_halfedge(current);
            if current == h {
                break;
            }
        }
        f
    }

    pub fn set_start(&mut self, h: HH, v: VH) {
        self.halfedge_mut(h).start = Some(v);
    }

    pub fn set_vertex_halfedge(&mut self, v: VH, h: HH) {
        self.verts.get_mut(v).halfedge = Some(h);
    }

    pub fn set_face_halfedge(&mut self, f: FH, h: HH) {
        self.faces.get_mut(f).halfedge = Some(h);
    }

    pub fn set_halfedge_face(&mut self, h: HH, f: Option<FH>) {
        self.halfedge_mut(h).face = f;
    }

    /// Make `next` follow `prev`.
    pub fn link_halfedges(&mut self, prev: HH, next: HH) {
        self.halfedge_mut(prev).next = next;
        self.halfedge_mut(next).prev = prev;
    }

    // Marking elements unused. The elements keep their slots until the
    // structure is compacted.

    pub fn make_vertex_unused(&mut self, v: VH) {
        self.verts.get_mut(v).halfedge = None;
    }

    /// Mark both halfedges of the edge containing `h` as unused.
    pub fn make_edge_unused(&mut self, h: HH) {
        self.halfedge_mut(h).start = None;
        self.halfedge_mut(h.twin()).start = None;
    }

    pub fn make_face_unused(&mut self, f: FH) {
        self.faces.get_mut(f).halfedge = None;
    }

    /// Make the first outgoing halfedge of `v` a hole halfedge, if there is
    /// one.
    pub(crate) fn adjust_outgoing_halfedge(&mut self, v: VH) {
        let h = iterator::outgoing_halfedges(self, v).find(|h| self.is_hole_halfedge(*h));
        if let Some(h) = h {
            self.set_vertex_halfedge(v, h)
        }
    }

    /// Exchange the successors of two halfedges that end at the same
    /// vertex. Splicing two halfedges of one loop splits it in two, and
    /// splicing halfedges of different loops joins them.
    pub(crate) fn splice(&mut self, a: HH, b: HH) {
        let (an, bn) = (self.next_halfedge(a), self.next_halfedge(b));
        self.link_halfedges(a, bn);
        self.link_halfedges(b, an);
    }

    /// The next incoming halfedge after `h` around the vertex `h` points to,
    /// that borders a hole. Returns `h` if there is no other.
    fn next_incoming_hole(&self, h: HH) -> HH {
        let mut g = h;
        loop {
            g = self.next_halfedge(g).twin();
            if g == h || self.is_hole_halfedge(g) {
                return g;
            }
        }
    }

    /// Insert a freshly allocated `h` into the star of its start vertex `v`,
    /// in front of the first outgoing halfedge.
    fn insert_outgoing(&mut self, v: VH, h: HH) {
        match self.vertex_halfedge(v) {
            Some(first) => self.splice(self.prev_halfedge(first), h.twin()),
            None => {
                self.link_halfedges(h.twin(), h);
                self.set_vertex_halfedge(v, h);
            }
        }
    }

    /// Add an edge between two vertices, without any faces.
    ///
    /// The new edge is inserted into the stars of both vertices. The
    /// vertices must be on the boundary, otherwise the edge would cut through
    /// an existing face.
    pub fn add_edge(&mut self, v0: VH, v1: VH) -> Result<HH, Error> {
        self.vertex_check(v0)?;
        self.vertex_check(v1)?;
        if v0 == v1 {
            return Err(Error::DegenerateEdge(v0));
        }
        for v in [v0, v1] {
            if !self.is_boundary_vertex(v) {
                return Err(Error::ComplexVertex(v));
            }
        }
        let h = self.add_pair();
        self.set_start(h, v0);
        self.set_start(h.twin(), v1);
        self.insert_outgoing(v0, h);
        self.insert_outgoing(v1, h.twin());
        Ok(h)
    }

    /// Add a face with the given vertices in order.
    ///
    /// Missing edges are created, and the hole loops around the new face
    /// are spliced so the face gets a loop of its own. Fails without
    /// changing anything if the face would make a vertex or an edge
    /// non-manifold, or if it would reuse an edge in the orientation an
    /// existing face already uses.
    pub fn add_face(&mut self, verts: &[VH]) -> Result<FH, Error> {
        let mut scratch = std::mem::take(&mut self.scratch);
        let result = self
            .plan_face(verts, &mut scratch)
            .map(|_| self.build_face(verts, &mut scratch));
        self.scratch = scratch;
        result
    }

    pub fn add_tri_face(&mut self, v0: VH, v1: VH, v2: VH) -> Result<FH, Error> {
        self.add_face(&[v0, v1, v2])
    }

    pub fn add_quad_face(&mut self, v0: VH, v1: VH, v2: VH, v3: VH) -> Result<FH, Error> {
        self.add_face(&[v0, v1, v2, v3])
    }

    /// Validate a new face and record the existing halfedges along it, and
    /// where fans that sit between two of them have to move. Nothing is
    /// modified.
    fn plan_face(&self, verts: &[VH], scratch: &mut FaceScratch) -> Result<(), Error> {
        let n = verts.len();
        if n < 3 {
            return Err(Error::DegenerateFace(n));
        }
        for (i, v) in verts.iter().enumerate() {
            self.vertex_check(*v)?;
            if verts[(i + 1)..].contains(v) {
                return Err(Error::DegenerateFace(n));
            }
        }
        scratch.clear();
        for (i, v) in verts.iter().enumerate() {
            if !self.is_boundary_vertex(*v) {
                return Err(Error::ComplexVertex(*v));
            }
            let h = self.find_halfedge(*v, verts[(i + 1) % n]);
            if let Some(h) = h.filter(|h| !self.is_hole_halfedge(*h)) {
                return Err(Error::ComplexHalfedge(h));
            }
            scratch.existing.push(h);
        }
        for j in 0..n {
            let i = (j + n - 1) % n;
            let gap = match (scratch.existing[i], scratch.existing[j]) {
                (Some(hin), Some(hout)) if self.next_halfedge(hin) != hout => {
                    // The fans between `hin` and `hout` go to another gap
                    // around the corner.
                    let g = self.next_incoming_hole(hout.twin());
                    if g == hin || g == hout.twin() {
                        return Err(Error::PatchRelinkingFailed);
                    }
                    Some(g)
                }
                _ => None,
            };
            scratch.gaps.push(gap);
        }
        Ok(())
    }

    /// Create the face planned by [`Self::plan_face`].
    fn build_face(&mut self, verts: &[VH], scratch: &mut FaceScratch) -> FH {
        let n = verts.len();
        for (i, h) in scratch.existing.iter().enumerate() {
            let h = match h {
                Some(h) => *h,
                None => {
                    let h = self.add_pair();
                    self.set_start(h, verts[i]);
                    self.set_start(h.twin(), verts[(i + 1) % n]);
                    h
                }
            };
            scratch.halfedges.push(h);
        }
        for j in 0..n {
            let i = (j + n - 1) % n;
            let (hin, hout, v) = (scratch.halfedges[i], scratch.halfedges[j], verts[j]);
            let gap = if scratch.existing[i].is_none() && scratch.existing[j].is_none() {
                // Both sides are new: they enter the star of `v` in front of
                // its first outgoing halfedge.
                match self.vertex_halfedge(v) {
                    Some(first) => Some(self.prev_halfedge(first)),
                    None => {
                        self.set_vertex_halfedge(v, hin.twin());
                        None
                    }
                }
            } else {
                scratch.gaps[j]
            };
            if self.next_halfedge(hin) != hout {
                let rest = self.prev_halfedge(hout);
                self.splice(hin, rest);
                if let Some(g) = gap {
                    self.splice(g, rest);
                }
            }
        }
        let f = self.add_face_record(scratch.halfedges[0]);
        for v in verts {
            self.adjust_outgoing_halfedge(*v);
        }
        f
    }

    // Consistent removal.

    /// Detach the face from its loop and mark it unused. The halfedges of
    /// the loop become hole halfedges.
    fn detach_face(&mut self, f: FH) {
        if let Some(hstart) = self.face_halfedge(f) {
            let mut h = hstart;
            loop {
                self.halfedge_mut(h).face = None;
                h = self.next_halfedge(h);
                if h == hstart {
                    break;
                }
            }
        }
        self.make_face_unused(f);
    }

    /// Remove the edge containing `h`, along with the faces on either side
    /// of it. Vertices left without any edges become unused.
    pub fn remove_edge(&mut self, h: HH) -> Result<(), Error> {
        self.used_halfedge_check(h)?;
        let t = h.twin();
        for f in [self.halfedge_face(h), self.halfedge_face(t)]
            .into_iter()
            .flatten()
        {
            self.detach_face(f);
        }
        let (v0, v1) = match (self.start_vertex(h), self.start_vertex(t)) {
            (Some(v0), Some(v1)) => (v0, v1),
            _ => return Err(Error::InvalidTwin(h)),
        };
        let (hp, hn, tp, tn) = (
            self.prev_halfedge(h),
            self.next_halfedge(h),
            self.prev_halfedge(t),
            self.next_halfedge(t),
        );
        if hp == t {
            self.make_vertex_unused(v0);
        } else {
            self.link_halfedges(hp, tn);
            if self.vertex_halfedge(v0) == Some(h) {
                self.set_vertex_halfedge(v0, tn);
            }
            self.adjust_outgoing_halfedge(v0);
        }
        if tp == h {
            self.make_vertex_unused(v1);
        } else {
            self.link_halfedges(tp, hn);
            if self.vertex_halfedge(v1) == Some(t) {
                self.set_vertex_halfedge(v1, hn);
            }
            self.adjust_outgoing_halfedge(v1);
        }
        self.make_edge_unused(h);
        self.link_halfedges(h, t);
        self.link_halfedges(t, h);
        Ok(())
    }

    /// Remove a face. Edges of the face that are left without a face on
    /// either side are removed as well.
    pub fn remove_face(&mut self, f: FH) -> Result<(), Error> {
        self.used_face_check(f)?;
        let hs: Vec<HH> = iterator::face_halfedges(self, f).collect();
        self.detach_face(f);
        for h in hs.iter() {
            if !self.is_unused_halfedge(*h) && self.is_hole_halfedge(h.twin()) {
                self.remove_edge(*h)?;
            }
        }
        for h in hs {
            if let Some(v) = self.start_vertex(h) {
                if !self.is_unused_vertex(v) {
                    self.adjust_outgoing_halfedge(v);
                }
            }
        }
        Ok(())
    }

    /// Remove a vertex together with its incident faces and edges.
    pub fn remove_vertex(&mut self, v: VH) -> Result<(), Error> {
        self.used_vertex_check(v)?;
        let faces: Vec<FH> = iterator::vertex_faces(self, v).collect();
        for f in faces {
            if !self.is_unused_face(f) {
                self.remove_face(f)?;
            }
        }
        while let Some(h) = self.vertex_halfedge(v) {
            self.remove_edge(h)?;
        }
        Ok(())
    }

    // Editing.

    /// Split a face into triangles, fanning out from the start of its first
    /// halfedge. Triangles are left untouched.
    pub fn triangulate_face(&mut self, f: FH) -> Result<(), Error> {
        self.used_face_check(f)?;
        let mut base = self.face_halfedge(f).ok_or(Error::UnusedFace(f))?;
        let vstart = self.start_vertex(base).ok_or(Error::UnusedHalfedge(base))?;
        let prev = self.prev_halfedge(base);
        loop {
            let next = self.next_halfedge(base);
            if self.end_vertex(self.next_halfedge(next)) == Some(vstart) {
                break;
            }
            let to = self.end_vertex(next).ok_or(Error::UnusedHalfedge(next))?;
            // Cut off the triangle on `base` and `next` with a diagonal back
            // to the start. What is left keeps the original face.
            let diag = self.add_pair();
            self.set_start(diag, vstart);
            self.set_start(diag.twin(), to);
            self.splice(next, diag);
            self.splice(prev, diag.twin());
            self.add_face_record(base);
            self.set_halfedge_face(diag, Some(f));
            self.set_face_halfedge(f, diag);
            base = diag;
        }
        Ok(())
    }

    /// Triangulate every used face.
    pub fn triangulate(&mut self) -> Result<(), Error> {
        for f in self.faces() {
            if !self.is_unused_face(f) {
                self.triangulate_face(f)?;
            }
        }
        Ok(())
    }
}
