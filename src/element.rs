use crate::{error::Error, iterator, topol::HeStructure};
use std::fmt::{Debug, Display};

/**
 * All elements of a structure implement this trait. They are identified by
 * their index in the owning list.
 */
pub trait Handle {
    /**
     * The index of the element.
     */
    fn index(&self) -> u32;
}

/// Records stored in an [`ElementList`](crate::ElementList).
///
/// An element is unused when its defining reference is missing. Unused
/// elements keep their slot until the list is compacted.
pub trait Element {
    type Handle: Handle + From<u32> + Copy;

    fn is_unused(&self) -> bool;

    /// Error reported when `h` is not an index into the owning list.
    fn not_owned(h: Self::Handle) -> Error;

    /// Error reported when `h` refers to an unused element.
    fn unused(h: Self::Handle) -> Error;
}

/**
 * Vertex handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VH {
    idx: u32,
}

/**
 * Halfedge handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HH {
    idx: u32,
}

/**
 * Edge handle. Edge `k` owns the halfedges `2k` and `2k + 1`.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EH {
    idx: u32,
}

/**
 * Face handle.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FH {
    idx: u32,
}

macro_rules! impl_handle {
    ($handle:ident, $label:literal) => {
        impl Handle for $handle {
            fn index(&self) -> u32 {
                self.idx
            }
        }

        impl From<u32> for $handle {
            fn from(idx: u32) -> Self {
                $handle { idx }
            }
        }

        impl From<&u32> for $handle {
            fn from(idx: &u32) -> Self {
                $handle { idx: *idx }
            }
        }

        impl From<&mut u32> for $handle {
            fn from(idx: &mut u32) -> Self {
                $handle { idx: *idx }
            }
        }

        impl Display for $handle {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", $label, self.index())
            }
        }

        impl Debug for $handle {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", $label, self.index())
            }
        }
    };
}

impl_handle!(VH, "VH");
impl_handle!(HH, "HH");
impl_handle!(EH, "EH");
impl_handle!(FH, "FH");

impl VH {
    /// The first outgoing halfedge, used as the anchor for circulation.
    pub fn halfedge(self, mesh: &HeStructure) -> Option<HH> {
        mesh.vertex_halfedge(self)
    }

    /// Check if this vertex is valid for the `mesh`.
    ///
    /// The index has to be less than the number of vertices in the mesh.
    pub fn is_valid(self, mesh: &HeStructure) -> bool {
        mesh.owns_vertex(self)
    }

    pub fn is_unused(self, mesh: &HeStructure) -> bool {
        mesh.is_unused_vertex(self)
    }

    /// Check if this vertex is on the boundary of the `mesh`.
    pub fn is_boundary(self, mesh: &HeStructure) -> bool {
        mesh.is_boundary_vertex(self)
    }

    /// Check if this vertex is manifold.
    ///
    /// A vertex is manifold if at most one of its outgoing halfedges is on
    /// the boundary.
    /// ```text
    ///    .......|     .......|.......     ....\     /...
    ///    .......|     .......|.......     .....\   /....
    ///    .......|     .......|.......     ......\ /.....
    ///    -------v     -------v-------     -------v------
    ///    .......|     .......|.......     ....../ \.....
    ///    .......|     .......|.......     ...../   \....
    ///    .......|     .......|.......     ..../     \...
    ///    Manifold     Manifold            Not manifold
    /// ```
    pub fn is_manifold(self, mesh: &HeStructure) -> bool {
        mesh.is_manifold_vertex(self)
    }

    /// The number of edges incident on this vertex.
    pub fn degree(self, mesh: &HeStructure) -> usize {
        iterator::outgoing_halfedges(mesh, self).count()
    }
}

impl HH {
    pub fn start(self, mesh: &HeStructure) -> Option<VH> {
        mesh.start_vertex(self)
    }

    pub fn end(self, mesh: &HeStructure) -> Option<VH> {
        mesh.end_vertex(self)
    }

    /// The oppositely directed partner. This does not need the mesh, because
    /// twins are always stored next to each other.
    pub fn twin(self) -> HH {
        (self.idx ^ 1).into()
    }

    pub fn prev(self, mesh: &HeStructure) -> HH {
        mesh.prev_halfedge(self)
    }

    pub fn next(self, mesh: &HeStructure) -> HH {
        mesh.next_halfedge(self)
    }

    pub fn face(self, mesh: &HeStructure) -> Option<FH> {
        mesh.halfedge_face(self)
    }

    pub fn edge(self) -> EH {
        (self.idx >> 1).into()
    }

    /// Check if this halfedge is valid for the `mesh`.
    ///
    /// The index has to be less than the number of halfedges in the mesh.
    pub fn is_valid(self, mesh: &HeStructure) -> bool {
        mesh.owns_halfedge(self)
    }

    pub fn is_unused(self, mesh: &HeStructure) -> bool {
        mesh.is_unused_halfedge(self)
    }

    /// Check if this halfedge lies on a boundary or hole of the `mesh`, i.e.
    /// either this halfedge or its twin has no face.
    pub fn is_boundary(self, mesh: &HeStructure) -> bool {
        mesh.is_boundary_halfedge(self)
    }
}

impl EH {
    pub fn halfedges(self) -> (HH, HH) {
        let hi = self.idx << 1;
        (hi.into(), (hi | 1).into())
    }

    pub fn halfedge(self, flag: bool) -> HH {
        ((self.idx << 1) | if flag { 1 } else { 0 }).into()
    }

    pub fn is_boundary(self, mesh: &HeStructure) -> bool {
        mesh.is_boundary_halfedge(self.halfedge(false))
    }
}

impl FH {
    pub fn halfedge(self, mesh: &HeStructure) -> Option<HH> {
        mesh.face_halfedge(self)
    }

    /// Check if this face is valid for the `mesh`.
    ///
    /// The index has to be less than the number of faces in the mesh.
    pub fn is_valid(self, mesh: &HeStructure) -> bool {
        mesh.owns_face(self)
    }

    pub fn is_unused(self, mesh: &HeStructure) -> bool {
        mesh.is_unused_face(self)
    }

    pub fn is_boundary(self, mesh: &HeStructure) -> bool {
        mesh.is_boundary_face(self)
    }

    /// The number of edges in the loop of this face.
    pub fn degree(self, mesh: &HeStructure) -> usize {
        iterator::face_halfedges(mesh, self).count()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vertex {
    pub(crate) halfedge: Option<HH>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Halfedge {
    pub(crate) start: Option<VH>,
    pub(crate) next: HH,
    pub(crate) prev: HH,
    pub(crate) face: Option<FH>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Face {
    pub(crate) halfedge: Option<HH>,
}

impl Vertex {
    pub fn halfedge(&self) -> Option<HH> {
        self.halfedge
    }
}

impl Halfedge {
    /// A halfedge that is not yet wired to anything. Its `next` and `prev`
    /// point at the twin, which makes a fresh pair a valid dangling edge.
    pub(crate) fn unlinked(twin: HH) -> Self {
        Halfedge {
            start: None,
            next: twin,
            prev: twin,
            face: None,
        }
    }

    pub fn start(&self) -> Option<VH> {
        self.start
    }

    pub fn next(&self) -> HH {
        self.next
    }

    pub fn prev(&self) -> HH {
        self.prev
    }

    pub fn face(&self) -> Option<FH> {
        self.face
    }
}

impl Face {
    pub fn halfedge(&self) -> Option<HH> {
        self.halfedge
    }
}

impl Element for Vertex {
    type Handle = VH;

    fn is_unused(&self) -> bool {
        self.halfedge.is_none()
    }

    fn not_owned(h: VH) -> Error {
        Error::InvalidVertex(h)
    }

    fn unused(h: VH) -> Error {
        Error::UnusedVertex(h)
    }
}

impl Element for Halfedge {
    type Handle = HH;

    fn is_unused(&self) -> bool {
        self.start.is_none()
    }

    fn not_owned(h: HH) -> Error {
        Error::InvalidHalfedge(h)
    }

    fn unused(h: HH) -> Error {
        Error::UnusedHalfedge(h)
    }
}

impl Element for Face {
    type Handle = FH;

    fn is_unused(&self) -> bool {
        self.halfedge.is_none()
    }

    fn not_owned(h: FH) -> Error {
        Error::InvalidFace(h)
    }

    fn unused(h: FH) -> Error {
        Error::UnusedFace(h)
    }
}

#[cfg(test)]
mod test {
    use super::{EH, HH, Handle};

    #[test]
    fn t_twin_parity() {
        for i in 0u32..16 {
            let h: HH = i.into();
            assert_eq!(h.twin().twin(), h);
            assert_ne!(h.twin(), h);
            assert_eq!(h.edge(), h.twin().edge());
            assert_eq!(h.edge().index(), i / 2);
        }
    }

    #[test]
    fn t_edge_halfedges() {
        let e: EH = 3.into();
        let (h0, h1) = e.halfedges();
        assert_eq!((h0.index(), h1.index()), (6, 7));
        assert_eq!(e.halfedge(false), h0);
        assert_eq!(e.halfedge(true), h1);
        assert_eq!(h0.twin(), h1);
    }

    #[test]
    fn t_display() {
        let h: HH = 5.into();
        assert_eq!(format!("{h}"), "HH(5)");
        assert_eq!(format!("{:?}", EH::from(2)), "EH(2)");
    }
}
