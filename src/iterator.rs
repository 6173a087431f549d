use crate::{
    element::{FH, HH, VH},
    topol::HeStructure,
};

/// Walks the star of the start vertex of the anchor halfedge. Going forward
/// follows `twin.next`, going in reverse follows `prev.twin`.
struct StartHalfedgeIter<'a, const REV: bool> {
    topol: &'a HeStructure,
    hstart: Option<HH>,
    hcurrent: Option<HH>,
}

impl Iterator for StartHalfedgeIter<'_, false> {
    type Item = HH;

    fn next(&mut self) -> Option<Self::Item> {
        match self.hcurrent {
            Some(current) => {
                let next = self.topol.next_halfedge(current.twin());
                self.hcurrent = match self.hstart {
                    Some(start) if start != next => Some(next),
                    _ => None,
                };
                Some(current)
            }
            None => None,
        }
    }
}

impl Iterator for StartHalfedgeIter<'_, true> {
    type Item = HH;

    fn next(&mut self) -> Option<Self::Item> {
        match self.hcurrent {
            Some(current) => {
                let next = self.topol.prev_halfedge(current).twin();
                self.hcurrent = match self.hstart {
                    Some(start) if start != next => Some(next),
                    _ => None,
                };
                Some(current)
            }
            None => None,
        }
    }
}

/// Walks the loop containing the anchor halfedge, which is either a face
/// loop or a hole loop.
struct LoopHalfedgeIter<'a, const REV: bool> {
    topol: &'a HeStructure,
    hstart: Option<HH>,
    hcurrent: Option<HH>,
}

impl Iterator for LoopHalfedgeIter<'_, false> {
    type Item = HH;

    fn next(&mut self) -> Option<Self::Item> {
        match self.hcurrent {
            Some(current) => {
                let next = self.topol.next_halfedge(current);
                self.hcurrent = match self.hstart {
                    Some(start) if start != next => Some(next),
                    _ => None,
                };
                Some(current)
            }
            None => None,
        }
    }
}

impl Iterator for LoopHalfedgeIter<'_, true> {
    type Item = HH;

    fn next(&mut self) -> Option<Self::Item> {
        match self.hcurrent {
            Some(current) => {
                let next = self.topol.prev_halfedge(current);
                self.hcurrent = match self.hstart {
                    Some(start) if start != next => Some(next),
                    _ => None,
                };
                Some(current)
            }
            None => None,
        }
    }
}

/// Halfedges that share the start vertex of `h`, beginning with `h`.
pub fn circulate_start(topol: &HeStructure, h: HH) -> impl Iterator<Item = HH> + use<'_> {
    StartHalfedgeIter::<false> {
        topol,
        hstart: Some(h),
        hcurrent: Some(h),
    }
}

/// Same as [`circulate_start`] in the opposite rotational direction.
pub fn circulate_start_rev(topol: &HeStructure, h: HH) -> impl Iterator<Item = HH> + use<'_> {
    StartHalfedgeIter::<true> {
        topol,
        hstart: Some(h),
        hcurrent: Some(h),
    }
}

/// Halfedges of the loop containing `h`, beginning with `h`.
pub fn circulate_face(topol: &HeStructure, h: HH) -> impl Iterator<Item = HH> + use<'_> {
    LoopHalfedgeIter::<false> {
        topol,
        hstart: Some(h),
        hcurrent: Some(h),
    }
}

pub fn circulate_face_rev(topol: &HeStructure, h: HH) -> impl Iterator<Item = HH> + use<'_> {
    LoopHalfedgeIter::<true> {
        topol,
        hstart: Some(h),
        hcurrent: Some(h),
    }
}

/// Outgoing halfedges of a vertex. Yields nothing for unused vertices.
pub fn outgoing_halfedges(topol: &HeStructure, v: VH) -> impl Iterator<Item = HH> + use<'_> {
    let h = topol.vertex_halfedge(v);
    StartHalfedgeIter::<false> {
        topol,
        hstart: h,
        hcurrent: h,
    }
}

pub fn incoming_halfedges(topol: &HeStructure, v: VH) -> impl Iterator<Item = HH> + use<'_> {
    outgoing_halfedges(topol, v).map(|h| h.twin())
}

pub fn connected_vertices(topol: &HeStructure, v: VH) -> impl Iterator<Item = VH> + use<'_> {
    outgoing_halfedges(topol, v).filter_map(|h| topol.end_vertex(h))
}

/// Faces around a vertex. Holes are skipped.
pub fn vertex_faces(topol: &HeStructure, v: VH) -> impl Iterator<Item = FH> + use<'_> {
    outgoing_halfedges(topol, v).filter_map(|h| topol.halfedge_face(h))
}

pub fn face_halfedges(topol: &HeStructure, f: FH) -> impl Iterator<Item = HH> + use<'_> {
    let h = topol.face_halfedge(f);
    LoopHalfedgeIter::<false> {
        topol,
        hstart: h,
        hcurrent: h,
    }
}

pub fn face_vertices(topol: &HeStructure, f: FH) -> impl Iterator<Item = VH> + use<'_> {
    face_halfedges(topol, f).filter_map(|h| topol.start_vertex(h))
}

/// Faces across the edges of `f`. Holes are skipped.
pub fn adjacent_faces(topol: &HeStructure, f: FH) -> impl Iterator<Item = FH> + use<'_> {
    face_halfedges(topol, f).filter_map(|h| topol.halfedge_face(h.twin()))
}

/// The four halfedges whose edges touch the edge of `h` at either end:
/// previous, next, twin's previous and twin's next.
pub fn connected_pairs(topol: &HeStructure, h: HH) -> [HH; 4] {
    let t = h.twin();
    [
        topol.prev_halfedge(h),
        topol.next_halfedge(h),
        topol.prev_halfedge(t),
        topol.next_halfedge(t),
    ]
}

/// The first halfedge around the start of `h`, beginning with `h`, that
/// has no face.
pub fn next_boundary_at_start(topol: &HeStructure, h: HH) -> Option<HH> {
    circulate_start(topol, h).find(|h| topol.is_hole_halfedge(*h))
}

/// The first halfedge in the loop of `h`, beginning with `h`, whose twin has
/// no face.
pub fn next_boundary_in_face(topol: &HeStructure, h: HH) -> Option<HH> {
    circulate_face(topol, h).find(|h| topol.is_hole_halfedge(h.twin()))
}

pub fn count_edges_at_start(topol: &HeStructure, h: HH) -> usize {
    circulate_start(topol, h).count()
}

pub fn count_edges_in_face(topol: &HeStructure, h: HH) -> usize {
    circulate_face(topol, h).count()
}

pub fn vertex_degree(topol: &HeStructure, v: VH) -> usize {
    outgoing_halfedges(topol, v).count()
}

pub fn face_degree(topol: &HeStructure, f: FH) -> usize {
    face_halfedges(topol, f).count()
}
