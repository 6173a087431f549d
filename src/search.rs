/*!
Traversals and graph algorithms over the connectivity of a structure.

Breadth and depth first traversals use the element tags to mark visited
elements. They borrow the structure mutably for as long as they are alive,
so two traversals can never share a tag counter.
*/

use crate::{
    element::{EH, FH, HH, Handle, VH},
    error::Error,
    iterator,
    topol::HeStructure,
};
use std::collections::VecDeque;

/// Elements that can be traversed by following their neighbours.
pub trait Traversable: Handle + Copy {
    fn check_start(topol: &HeStructure, start: Self) -> Result<(), Error>;

    fn next_tag(topol: &mut HeStructure) -> i32;

    /// Stamp the element with `tag`. Returns `true` if it was not visited.
    fn visit(topol: &mut HeStructure, h: Self, tag: i32) -> bool;

    fn neighbors(topol: &HeStructure, h: Self, out: &mut Vec<Self>);
}

impl Traversable for VH {
    fn check_start(topol: &HeStructure, start: VH) -> Result<(), Error> {
        topol.used_vertex_check(start)
    }

    fn next_tag(topol: &mut HeStructure) -> i32 {
        topol.next_vertex_tag()
    }

    fn visit(topol: &mut HeStructure, h: VH, tag: i32) -> bool {
        topol.verts.visit(h, tag)
    }

    fn neighbors(topol: &HeStructure, h: VH, out: &mut Vec<VH>) {
        out.extend(iterator::connected_vertices(topol, h));
    }
}

impl Traversable for FH {
    fn check_start(topol: &HeStructure, start: FH) -> Result<(), Error> {
        topol.used_face_check(start)
    }

    fn next_tag(topol: &mut HeStructure) -> i32 {
        topol.next_face_tag()
    }

    fn visit(topol: &mut HeStructure, h: FH, tag: i32) -> bool {
        topol.faces.visit(h, tag)
    }

    fn neighbors(topol: &HeStructure, h: FH, out: &mut Vec<FH>) {
        out.extend(iterator::adjacent_faces(topol, h));
    }
}

/// Lazy traversal of the elements reachable from a set of starting
/// elements. Breadth first when `DEPTH` is false, depth first otherwise.
pub struct Traversal<'a, H, const DEPTH: bool>
where
    H: Traversable,
{
    topol: &'a mut HeStructure,
    pending: VecDeque<H>,
    tag: i32,
    buf: Vec<H>,
}

impl<'a, H, const DEPTH: bool> Traversal<'a, H, DEPTH>
where
    H: Traversable,
{
    fn new(topol: &'a mut HeStructure, starts: &[H]) -> Result<Self, Error> {
        for h in starts {
            H::check_start(topol, *h)?;
        }
        let tag = H::next_tag(topol);
        let mut pending = VecDeque::with_capacity(starts.len());
        for h in starts {
            if H::visit(topol, *h, tag) {
                pending.push_back(*h);
            }
        }
        Ok(Traversal {
            topol,
            pending,
            tag,
            buf: Vec::new(),
        })
    }

    fn expand(&mut self, h: H) {
        self.buf.clear();
        H::neighbors(self.topol, h, &mut self.buf);
        for n in self.buf.drain(..) {
            if H::visit(self.topol, n, self.tag) {
                self.pending.push_back(n);
            }
        }
    }
}

impl<H> Iterator for Traversal<'_, H, false>
where
    H: Traversable,
{
    type Item = H;

    fn next(&mut self) -> Option<H> {
        let h = self.pending.pop_front()?;
        self.expand(h);
        Some(h)
    }
}

impl<H> Iterator for Traversal<'_, H, true>
where
    H: Traversable,
{
    type Item = H;

    fn next(&mut self) -> Option<H> {
        let h = self.pending.pop_back()?;
        self.expand(h);
        Some(h)
    }
}

pub type BreadthFirst<'a, H> = Traversal<'a, H, false>;
pub type DepthFirst<'a, H> = Traversal<'a, H, true>;

/// Relax distances from the sources with a FIFO queue.
fn shortest_paths<H, N>(sources: &[H], out: &mut [f64], mut neighbors: N)
where
    H: Handle + From<u32> + Copy,
    N: FnMut(H, &mut Vec<(H, f64)>),
{
    out.fill(f64::INFINITY);
    let mut queued = vec![false; out.len()];
    let mut queue = VecDeque::with_capacity(sources.len());
    for s in sources {
        out[s.index() as usize] = 0.0;
        if !std::mem::replace(&mut queued[s.index() as usize], true) {
            queue.push_back(*s);
        }
    }
    let mut buf = Vec::new();
    while let Some(h) = queue.pop_front() {
        queued[h.index() as usize] = false;
        let d0 = out[h.index() as usize];
        buf.clear();
        neighbors(h, &mut buf);
        for (n, cost) in buf.drain(..) {
            let d = d0 + cost;
            let ni = n.index() as usize;
            if d < out[ni] {
                out[ni] = d;
                if !std::mem::replace(&mut queued[ni], true) {
                    queue.push_back(n);
                }
            }
        }
    }
}

fn check_len(expected: usize, found: usize) -> Result<(), Error> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::MismatchedArrayLengths(expected, found))
    }
}

impl HeStructure {
    pub fn breadth_first_vertices(&mut self, start: VH) -> Result<BreadthFirst<'_, VH>, Error> {
        Traversal::new(self, &[start])
    }

    pub fn breadth_first_vertices_from(
        &mut self,
        starts: &[VH],
    ) -> Result<BreadthFirst<'_, VH>, Error> {
        Traversal::new(self, starts)
    }

    pub fn depth_first_vertices(&mut self, start: VH) -> Result<DepthFirst<'_, VH>, Error> {
        Traversal::new(self, &[start])
    }

    pub fn depth_first_vertices_from(
        &mut self,
        starts: &[VH],
    ) -> Result<DepthFirst<'_, VH>, Error> {
        Traversal::new(self, starts)
    }

    pub fn breadth_first_faces(&mut self, start: FH) -> Result<BreadthFirst<'_, FH>, Error> {
        Traversal::new(self, &[start])
    }

    pub fn breadth_first_faces_from(&mut self, starts: &[FH]) -> Result<BreadthFirst<'_, FH>, Error> {
        Traversal::new(self, starts)
    }

    pub fn depth_first_faces(&mut self, start: FH) -> Result<DepthFirst<'_, FH>, Error> {
        Traversal::new(self, &[start])
    }

    pub fn depth_first_faces_from(&mut self, starts: &[FH]) -> Result<DepthFirst<'_, FH>, Error> {
        Traversal::new(self, starts)
    }

    /// Number of edges on the shortest path from any of the sources to each
    /// vertex. Unreachable vertices get `None`.
    pub fn vertex_depths(&self, sources: &[VH], out: &mut [Option<u32>]) -> Result<(), Error> {
        check_len(self.num_vertices(), out.len())?;
        for s in sources {
            self.used_vertex_check(*s)?;
        }
        out.fill(None);
        let mut queue = VecDeque::with_capacity(sources.len());
        for s in sources {
            out[s.index() as usize] = Some(0);
            queue.push_back(*s);
        }
        while let Some(v) = queue.pop_front() {
            let depth = out[v.index() as usize].map_or(0, |d| d + 1);
            for n in iterator::connected_vertices(self, v) {
                let dst = &mut out[n.index() as usize];
                if dst.is_none() {
                    *dst = Some(depth);
                    queue.push_back(n);
                }
            }
        }
        Ok(())
    }

    /// Same as [`Self::vertex_depths`], for faces connected across edges.
    pub fn face_depths(&self, sources: &[FH], out: &mut [Option<u32>]) -> Result<(), Error> {
        check_len(self.num_faces(), out.len())?;
        for s in sources {
            self.used_face_check(*s)?;
        }
        out.fill(None);
        let mut queue = VecDeque::with_capacity(sources.len());
        for s in sources {
            out[s.index() as usize] = Some(0);
            queue.push_back(*s);
        }
        while let Some(f) = queue.pop_front() {
            let depth = out[f.index() as usize].map_or(0, |d| d + 1);
            for n in iterator::adjacent_faces(self, f) {
                let dst = &mut out[n.index() as usize];
                if dst.is_none() {
                    *dst = Some(depth);
                    queue.push_back(n);
                }
            }
        }
        Ok(())
    }

    /// Shortest distances from the sources to every vertex, with the cost of
    /// crossing an edge read from `edge_lengths`. Costs must not be negative.
    /// Unreachable vertices get `f64::INFINITY`.
    pub fn vertex_distances(
        &self,
        sources: &[VH],
        edge_lengths: &[f64],
        out: &mut [f64],
    ) -> Result<(), Error> {
        check_len(self.num_edges(), edge_lengths.len())?;
        check_len(self.num_vertices(), out.len())?;
        for s in sources {
            self.used_vertex_check(*s)?;
        }
        shortest_paths(sources, out, |v, buf| {
            buf.extend(iterator::outgoing_halfedges(self, v).filter_map(|h| {
                self.end_vertex(h)
                    .map(|n| (n, edge_lengths[h.edge().index() as usize]))
            }))
        });
        Ok(())
    }

    /// Same as [`Self::vertex_distances`], except that the cost of moving
    /// along a halfedge is read from `halfedge_lengths`, so the two
    /// directions of an edge can differ.
    pub fn vertex_distances_directed(
        &self,
        sources: &[VH],
        halfedge_lengths: &[f64],
        out: &mut [f64],
    ) -> Result<(), Error> {
        check_len(self.num_halfedges(), halfedge_lengths.len())?;
        check_len(self.num_vertices(), out.len())?;
        for s in sources {
            self.used_vertex_check(*s)?;
        }
        shortest_paths(sources, out, |v, buf| {
            buf.extend(iterator::outgoing_halfedges(self, v).filter_map(|h| {
                self.end_vertex(h)
                    .map(|n| (n, halfedge_lengths[h.index() as usize]))
            }))
        });
        Ok(())
    }

    /// Shortest distances between faces, crossing edges at the cost read
    /// from `edge_lengths`.
    pub fn face_distances(
        &self,
        sources: &[FH],
        edge_lengths: &[f64],
        out: &mut [f64],
    ) -> Result<(), Error> {
        check_len(self.num_edges(), edge_lengths.len())?;
        check_len(self.num_faces(), out.len())?;
        for s in sources {
            self.used_face_check(*s)?;
        }
        shortest_paths(sources, out, |f, buf| {
            buf.extend(iterator::face_halfedges(self, f).filter_map(|h| {
                self.halfedge_face(h.twin())
                    .map(|n| (n, edge_lengths[h.edge().index() as usize]))
            }))
        });
        Ok(())
    }

    /// Label every used edge with the index of its connected component.
    /// Unused edges get `None`. Returns the number of components.
    ///
    /// Components are numbered in the order of their lowest edge index.
    pub fn edge_component_map(&mut self, out: &mut [Option<u32>]) -> Result<usize, Error> {
        check_len(self.num_edges(), out.len())?;
        out.fill(None);
        let tag = self.next_halfedge_tag();
        let mut stack: Vec<HH> = Vec::new();
        let mut ncomps = 0u32;
        for e in self.edges() {
            let h = e.halfedge(false);
            if self.is_unused_halfedge(h) || !self.hedges.visit(h, tag) {
                continue;
            }
            out[e.index() as usize] = Some(ncomps);
            stack.push(h);
            while let Some(h) = stack.pop() {
                for n in iterator::connected_pairs(self, h) {
                    // Both halfedges of an edge share the tag of the first.
                    let n0: HH = (n.index() & !1).into();
                    if self.hedges.visit(n0, tag) {
                        out[n.edge().index() as usize] = Some(ncomps);
                        stack.push(n0);
                    }
                }
            }
            ncomps += 1;
        }
        tracing::debug!(components = ncomps, "labeled edge components");
        Ok(ncomps as usize)
    }

    /// Label every used vertex with the component of its edges. Vertices
    /// without edges get `None`.
    pub fn vertex_component_map(&mut self, out: &mut [Option<u32>]) -> Result<usize, Error> {
        check_len(self.num_vertices(), out.len())?;
        let mut emap = vec![None; self.num_edges()];
        let ncomps = self.edge_component_map(&mut emap)?;
        for v in self.vertices() {
            out[v.index() as usize] = self
                .vertex_halfedge(v)
                .and_then(|h| emap[h.edge().index() as usize]);
        }
        Ok(ncomps)
    }

    /// Label every used face with the index of the group of faces reachable
    /// from it across edges. Returns the number of groups.
    pub fn face_component_map(&mut self, out: &mut [Option<u32>]) -> Result<usize, Error> {
        check_len(self.num_faces(), out.len())?;
        out.fill(None);
        let mut ncomps = 0u32;
        for f in self.faces() {
            if self.is_unused_face(f) || out[f.index() as usize].is_some() {
                continue;
            }
            for g in self.breadth_first_faces(f)? {
                out[g.index() as usize] = Some(ncomps);
            }
            ncomps += 1;
        }
        Ok(ncomps as usize)
    }

    /// The used edges of each connected component.
    pub fn edge_components(&mut self) -> Result<Vec<Vec<EH>>, Error> {
        let mut emap = vec![None; self.num_edges()];
        let ncomps = self.edge_component_map(&mut emap)?;
        let mut comps = vec![Vec::new(); ncomps];
        for (i, c) in emap.iter().enumerate() {
            if let Some(c) = c {
                comps[*c as usize].push((i as u32).into());
            }
        }
        Ok(comps)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        element::{FH, Handle, VH},
        error::Error,
        macros::assert_float_eq,
        primitive,
        topol::{HeStructure, test::holed_grid},
    };
    use glam::DVec3;

    /// Path graph 0 - 1 - 2 - 3 and a separate edge 4 - 5.
    fn path_graph() -> HeStructure {
        let mut graph = HeStructure::default();
        graph.add_vertices(6);
        for (a, b) in [(0u32, 1u32), (1, 2), (2, 3), (4, 5)] {
            graph.add_edge(a.into(), b.into()).unwrap();
        }
        graph
    }

    #[test]
    fn t_breadth_first_vertices() {
        let mut graph = path_graph();
        let order: Vec<u32> = graph
            .breadth_first_vertices(1.into())
            .unwrap()
            .map(|v| v.index())
            .collect();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], 1);
        let mut rest = order[1..3].to_vec();
        rest.sort();
        assert_eq!(rest, vec![0, 2]);
        assert_eq!(order[3], 3);
        // A second traversal does not see stale visited flags.
        assert_eq!(graph.breadth_first_vertices(1.into()).unwrap().count(), 4);
    }

    #[test]
    fn t_depth_first_vertices() {
        let mut graph = path_graph();
        let order: Vec<u32> = graph
            .depth_first_vertices(0.into())
            .unwrap()
            .map(|v| v.index())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        let mut all: Vec<u32> = graph
            .depth_first_vertices_from(&[0.into(), 4.into(), 0.into()])
            .unwrap()
            .map(|v| v.index())
            .collect();
        all.sort();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn t_traversal_fails_fast() {
        let mut graph = path_graph();
        let isolated = graph.add_vertex();
        assert!(matches!(
            graph.breadth_first_vertices(isolated),
            Err(Error::UnusedVertex(_))
        ));
        assert!(matches!(
            graph.depth_first_vertices(42.into()),
            Err(Error::InvalidVertex(_))
        ));
        assert!(graph.breadth_first_faces(0.into()).is_err());
    }

    #[test]
    fn t_face_traversal() {
        let mut mesh = holed_grid();
        let faces: Vec<FH> = mesh.breadth_first_faces(0.into()).unwrap().collect();
        assert_eq!(faces.len(), 8);
        let faces: Vec<FH> = mesh.depth_first_faces(7.into()).unwrap().collect();
        assert_eq!(faces.len(), 8);
        assert_eq!(faces[0].index(), 7);
    }

    #[test]
    fn t_vertex_depths() {
        let graph = path_graph();
        let mut depths = vec![None; graph.num_vertices()];
        graph.vertex_depths(&[0.into()], &mut depths).unwrap();
        assert_eq!(depths, vec![Some(0), Some(1), Some(2), Some(3), None, None]);
        graph
            .vertex_depths(&[0.into(), 3.into()], &mut depths)
            .unwrap();
        assert_eq!(depths[1..3], [Some(1), Some(1)]);
    }

    #[test]
    fn t_face_depths() {
        let mesh = holed_grid();
        let mut depths = vec![None; mesh.num_faces()];
        mesh.face_depths(&[0.into()], &mut depths).unwrap();
        // Faces around the hole, going both ways from f0.
        assert_eq!(
            depths,
            vec![Some(0), Some(1), Some(2), Some(1), Some(3), Some(2), Some(3), Some(4)]
        );
    }

    #[test]
    fn t_vertex_distances() {
        let graph = path_graph();
        let lengths = [1.0, 2.0, 0.5, 1.0];
        let mut dist = vec![0.0; graph.num_vertices()];
        graph
            .vertex_distances(&[0.into()], &lengths, &mut dist)
            .unwrap();
        assert_eq!(dist[..4], [0.0, 1.0, 3.0, 3.5]);
        assert!(dist[4].is_infinite() && dist[5].is_infinite());
        // Going against the direction of the first halfedges is expensive.
        let mut hlengths = vec![0.0; graph.num_halfedges()];
        for h in graph.halfedges() {
            hlengths[h.index() as usize] = if h.index() & 1 == 0 { 1.0 } else { 10.0 };
        }
        graph
            .vertex_distances_directed(&[3.into()], &hlengths, &mut dist)
            .unwrap();
        assert_eq!(dist[..4], [30.0, 20.0, 10.0, 0.0]);
        graph
            .vertex_distances_directed(&[0.into()], &hlengths, &mut dist)
            .unwrap();
        assert_eq!(dist[..4], [0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn t_face_distances() {
        let (mesh, points) = primitive::quad_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let mut lengths = vec![0.0; mesh.num_edges()];
        mesh.edge_lengths(&points, &mut lengths, false).unwrap();
        let mut dist = vec![0.0; mesh.num_faces()];
        mesh.face_distances(&[0.into()], &lengths, &mut dist).unwrap();
        assert_eq!(dist, vec![0.0, 1.0, 1.0, 1.0, 1.0, 2.0]);
        assert_float_eq!(dist[5], 2.0);
    }

    #[test]
    fn t_edge_components() {
        let mut graph = path_graph();
        let mut emap = vec![None; graph.num_edges()];
        let n = graph.edge_component_map(&mut emap).unwrap();
        assert_eq!(n, 2);
        assert_eq!(emap, vec![Some(0), Some(0), Some(0), Some(1)]);
        let mut vmap = vec![None; graph.num_vertices()];
        graph.vertex_component_map(&mut vmap).unwrap();
        assert_eq!(
            vmap,
            vec![Some(0), Some(0), Some(0), Some(0), Some(1), Some(1)]
        );
        // Removing the middle edge splits the path.
        let h = graph.find_halfedge(1.into(), 2.into()).unwrap();
        graph.remove_edge(h).unwrap();
        assert_eq!(graph.edge_component_map(&mut emap).unwrap(), 3);
        assert_eq!(emap, vec![Some(0), None, Some(1), Some(2)]);
        let comps = graph.edge_components().unwrap();
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[1][0].index(), 2);
    }

    #[test]
    fn t_face_components() {
        let mut mesh = holed_grid();
        let mut fmap = vec![None; mesh.num_faces()];
        assert_eq!(mesh.face_component_map(&mut fmap).unwrap(), 1);
        // Two triangles touching at a single vertex.
        let mut topol = HeStructure::default();
        topol.add_vertices(5);
        topol.add_tri_face(0.into(), 1.into(), 2.into()).unwrap();
        topol.add_tri_face(0.into(), 3.into(), 4.into()).unwrap();
        let mut fmap = vec![None; 2];
        assert_eq!(topol.face_component_map(&mut fmap).unwrap(), 2);
        let mut emap = vec![None; topol.num_edges()];
        assert_eq!(topol.edge_component_map(&mut emap).unwrap(), 1);
        let v: VH = 0.into();
        assert_eq!(v.degree(&topol), 4);
    }
}
