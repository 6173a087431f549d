/*!
A halfedge kernel for graphs and polygon meshes, with discrete differential
geometry operators and a k-d tree for spatial queries.

# Overview

+ [`HeStructure`] stores only connectivity: vertices, halfedges stored in twin
  pairs, and faces. A graph is a structure without faces. Positions and all
  other attributes live in arrays owned by the caller, indexed by the
  [`Handle::index`] of the elements.

+ Elements are never removed immediately. Removing an element marks it as
  unused, and [`HeStructure::compact`] later drops unused elements and
  renumbers the rest. The returned [`Remap`] values bring caller owned
  attribute arrays in line.

+ Every element carries a scratch tag that searches use to mark visited
  elements, see [`ElementList::next_tag`]. Traversals borrow the structure
  mutably, so only one search can use the tags at a time.

+ Geometry is computed from positions given as [`glam::DVec3`] slices, one
  element at a time or in bulk. Bulk computations write into caller supplied
  slices and can run on the rayon thread pool with the `parallel` feature.

+ [`KdTree`] maps points with any fixed number of coordinates to values, and
  supports nearest neighbour, k nearest, box and range queries.
*/

mod attrib;
mod check;
mod element;
mod error;
pub mod iterator;
mod kdtree;
mod list;
mod macros;
mod math;
mod matrix;
pub mod primitive;
mod search;
mod structure;
mod topol;

pub use element::{EH, Element, FH, Face, HH, Halfedge, Handle, VH, Vertex};
pub use error::Error;
pub use kdtree::KdTree;
pub use list::{ElementList, MIN_TAG, Remap};
pub use search::{BreadthFirst, DepthFirst, Traversable, Traversal};
pub use structure::{CompactMaps, Component, Offsets};
pub use topol::HeStructure;
