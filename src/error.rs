use crate::element::{FH, HH, VH};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Ownership and used state.
    #[error("vertex {0} does not belong to this structure")]
    InvalidVertex(VH),
    #[error("halfedge {0} does not belong to this structure")]
    InvalidHalfedge(HH),
    #[error("face {0} does not belong to this structure")]
    InvalidFace(FH),
    #[error("vertex {0} is unused")]
    UnusedVertex(VH),
    #[error("halfedge {0} is unused")]
    UnusedHalfedge(HH),
    #[error("face {0} is unused")]
    UnusedFace(FH),
    // Face construction.
    #[error("vertex {0} is not on the boundary, adding the face would make it complex")]
    ComplexVertex(VH),
    #[error("halfedge {0} already has a face, adding the face would make it complex")]
    ComplexHalfedge(HH),
    #[error("unable to relink the boundary patch around the new face")]
    PatchRelinkingFailed,
    #[error("face with {0} vertices is degenerate")]
    DegenerateFace(usize),
    #[error("cannot connect vertex {0} to itself")]
    DegenerateEdge(VH),
    // Topology check.
    #[error("halfedge {0} and its twin disagree on being used")]
    InvalidTwin(HH),
    #[error("halfedge {0} is not linked consistently with its neighbours")]
    InvalidHalfedgeLink(HH),
    #[error("outgoing halfedges of vertex {0} are inconsistent")]
    InvalidOutgoingHalfedge(VH),
    #[error("the loop through halfedge {0} does not close")]
    InvalidLoop(HH),
    #[error("halfedge {0} has a different face than the rest of its loop")]
    InconsistentFaceInLoop(HH),
    #[error("face {0} and halfedge {1} do not point at each other")]
    InvalidFaceHalfedgeLink(FH, HH),
    // Arrays.
    #[error("expected an array of length {0}, found {1}")]
    MismatchedArrayLengths(usize, usize),
    // Kd tree.
    #[error("a kd tree cannot have {0} dimensions")]
    InvalidDimension(usize),
    #[error("expected a point with {expected} coordinates, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}
