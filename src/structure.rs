/*!
Operations that renumber or restructure the element lists as a whole.

All of these rewrite every reference between elements so the structure stays
consistent. Attribute arrays owned by the caller are not touched; use the
returned maps to bring them in line.
*/

use crate::{
    element::{FH, Face, HH, Halfedge, Handle, VH, Vertex},
    error::Error,
    list::Remap,
    topol::HeStructure,
};
use std::cmp::Ordering;

/// Old to new maps produced by [`HeStructure::compact`].
#[derive(Clone, Debug)]
pub struct CompactMaps {
    pub vertices: Remap<VH>,
    pub halfedges: Remap<HH>,
    pub faces: Remap<FH>,
}

/// Index offsets of the elements copied in by [`HeStructure::append`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Offsets {
    pub vertices: u32,
    pub halfedges: u32,
    pub faces: u32,
}

/// One connected piece of a structure, together with the handles its
/// elements had in the structure it was split from.
#[derive(Clone, Default)]
pub struct Component {
    pub structure: HeStructure,
    /// `vertices[new]` is the original vertex.
    pub vertices: Vec<VH>,
    /// `halfedges[new]` is the original halfedge.
    pub halfedges: Vec<HH>,
    /// `faces[new]` is the original face.
    pub faces: Vec<FH>,
}

fn shift<H: Handle + From<u32>>(h: H, offset: u32) -> H {
    (h.index() + offset).into()
}

impl HeStructure {
    /// Remove all unused elements and renumber the rest, keeping their
    /// relative order.
    ///
    /// Twin halfedges become unused together, so the surviving halfedges
    /// keep their pairing.
    pub fn compact(&mut self) -> CompactMaps {
        let vmap = self.verts.compact();
        let hmap = self.hedges.compact();
        let fmap = self.faces.compact();
        for v in self.verts.handles() {
            let rec = self.verts.get_mut(v);
            rec.halfedge = rec.halfedge.and_then(|h| hmap.get(h));
        }
        for h in self.hedges.handles() {
            let rec = self.hedges.get_mut(h);
            rec.start = rec.start.and_then(|v| vmap.get(v));
            rec.next = hmap.get(rec.next).unwrap_or(h.twin());
            rec.prev = hmap.get(rec.prev).unwrap_or(h.twin());
            rec.face = rec.face.and_then(|f| fmap.get(f));
        }
        for f in self.faces.handles() {
            let rec = self.faces.get_mut(f);
            rec.halfedge = rec.halfedge.and_then(|h| hmap.get(h));
        }
        tracing::debug!(
            vertices = vmap.num_removed(),
            halfedges = hmap.num_removed(),
            faces = fmap.num_removed(),
            "compacted structure"
        );
        CompactMaps {
            vertices: vmap,
            halfedges: hmap,
            faces: fmap,
        }
    }

    /// Reorder the vertices with a comparator on their handles. The sort is
    /// stable.
    pub fn sort_vertices_by<F>(&mut self, compare: F) -> Remap<VH>
    where
        F: FnMut(VH, VH) -> Ordering,
    {
        let map = self.verts.sort_by(compare);
        for h in self.hedges.handles() {
            let rec = self.hedges.get_mut(h);
            rec.start = rec.start.and_then(|v| map.get(v));
        }
        map
    }

    /// Reorder the faces with a comparator on their handles. The sort is
    /// stable.
    pub fn sort_faces_by<F>(&mut self, compare: F) -> Remap<FH>
    where
        F: FnMut(FH, FH) -> Ordering,
    {
        let map = self.faces.sort_by(compare);
        for h in self.hedges.handles() {
            let rec = self.hedges.get_mut(h);
            rec.face = rec.face.and_then(|f| map.get(f));
        }
        map
    }

    /// Copy all elements of `other` to the end of this structure, unused
    /// ones included. The copied elements keep their connectivity, shifted
    /// by the returned offsets.
    pub fn append(&mut self, other: &HeStructure) -> Offsets {
        let offsets = Offsets {
            vertices: self.num_vertices() as u32,
            halfedges: self.num_halfedges() as u32,
            faces: self.num_faces() as u32,
        };
        self.verts.reserve(other.num_vertices());
        self.hedges.reserve(other.num_halfedges());
        self.faces.reserve(other.num_faces());
        for rec in other.verts.items() {
            self.verts.add(Vertex {
                halfedge: rec.halfedge.map(|h| shift(h, offsets.halfedges)),
            });
        }
        for rec in other.hedges.items() {
            self.hedges.add(Halfedge {
                start: rec.start.map(|v| shift(v, offsets.vertices)),
                next: shift(rec.next, offsets.halfedges),
                prev: shift(rec.prev, offsets.halfedges),
                face: rec.face.map(|f| shift(f, offsets.faces)),
            });
        }
        for rec in other.faces.items() {
            self.faces.add(Face {
                halfedge: rec.halfedge.map(|h| shift(h, offsets.halfedges)),
            });
        }
        tracing::debug!(
            vertices = other.num_vertices(),
            halfedges = other.num_halfedges(),
            faces = other.num_faces(),
            "appended structure"
        );
        offsets
    }

    /// Split into one structure per edge connected component. Unused
    /// elements and vertices without edges are dropped.
    ///
    /// Components are ordered by their lowest edge index, and the elements
    /// within each component keep their relative order.
    pub fn split_disjoint(&mut self) -> Result<Vec<Component>, Error> {
        let mut emap = vec![None; self.num_edges()];
        let ncomps = self.edge_component_map(&mut emap)?;
        let mut comps: Vec<Component> = (0..ncomps).map(|_| Component::default()).collect();
        let mut vnew = vec![0u32; self.num_vertices()];
        let mut hnew = vec![0u32; self.num_halfedges()];
        let mut fnew = vec![0u32; self.num_faces()];
        for e in self.edges() {
            if let Some(c) = emap[e.index() as usize] {
                let comp = &mut comps[c as usize];
                let (h0, h1) = e.halfedges();
                let k = comp.halfedges.len() as u32;
                hnew[h0.index() as usize] = k;
                hnew[h1.index() as usize] = k + 1;
                comp.halfedges.push(h0);
                comp.halfedges.push(h1);
            }
        }
        for v in self.used_vertices() {
            let comp = self
                .vertex_halfedge(v)
                .and_then(|h| emap[h.edge().index() as usize]);
            if let Some(c) = comp {
                let comp = &mut comps[c as usize];
                vnew[v.index() as usize] = comp.vertices.len() as u32;
                comp.vertices.push(v);
            }
        }
        for f in self.used_faces() {
            let comp = self
                .face_halfedge(f)
                .and_then(|h| emap[h.edge().index() as usize]);
            if let Some(c) = comp {
                let comp = &mut comps[c as usize];
                fnew[f.index() as usize] = comp.faces.len() as u32;
                comp.faces.push(f);
            }
        }
        let hmap = |h: HH| -> HH { hnew[h.index() as usize].into() };
        for comp in comps.iter_mut() {
            let topol = &mut comp.structure;
            for v in &comp.vertices {
                topol.verts.add(Vertex {
                    halfedge: self.vertex_halfedge(*v).map(hmap),
                });
            }
            for h in &comp.halfedges {
                let rec = self.halfedge(*h);
                topol.hedges.add(Halfedge {
                    start: rec.start.map(|v| vnew[v.index() as usize].into()),
                    next: hmap(rec.next),
                    prev: hmap(rec.prev),
                    face: rec.face.map(|f| fnew[f.index() as usize].into()),
                });
            }
            for f in &comp.faces {
                topol.faces.add(Face {
                    halfedge: self.face_halfedge(*f).map(hmap),
                });
            }
        }
        tracing::debug!(components = ncomps, "split structure into components");
        Ok(comps)
    }
}
