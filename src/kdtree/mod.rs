/*!
A k-d tree mapping points with a fixed number of coordinates to values.

At depth `d` a node splits on coordinate `d % k`. Points whose coordinate is
strictly less than the node's go to the left subtree, all others go to the
right. The tree is not rebalanced on insertion or removal; call
[`KdTree::balance`] after many edits.

Sorted insertions can leave the tree as deep as it is long, so every walk
over the nodes uses an explicit stack instead of recursion.
*/

mod heap;

use crate::error::Error;
use heap::BoundedHeap;
use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
};

struct Node<T> {
    point: Box<[f64]>,
    value: T,
    left: Option<Box<Node<T>>>,
    right: Option<Box<Node<T>>>,
}

/// Parent index and whether the node is the left child of its parent.
type Link = Option<(usize, bool)>;

impl<T> Node<T> {
    fn new(point: Box<[f64]>, value: T) -> Box<Self> {
        Box::new(Node {
            point,
            value,
            left: None,
            right: None,
        })
    }

    fn matches(&self, point: &[f64], tolerance: f64) -> bool {
        self.point
            .iter()
            .zip(point.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// Assemble a tree from nodes listed so that every parent comes before its
/// children.
fn link<T>(mut nodes: Vec<(Option<Box<Node<T>>>, Link)>) -> Option<Box<Node<T>>> {
    for i in (1..nodes.len()).rev() {
        let child = nodes[i].0.take();
        if let Some((parent, left)) = nodes[i].1 {
            if let Some(p) = nodes[parent].0.as_mut() {
                if left {
                    p.left = child;
                } else {
                    p.right = child;
                }
            }
        }
    }
    nodes.first_mut().and_then(|(n, _)| n.take())
}

/// Drop a subtree one node at a time.
fn unlink<T>(root: Option<Box<Node<T>>>) {
    let mut stack: Vec<Box<Node<T>>> = root.into_iter().collect();
    while let Some(mut node) = stack.pop() {
        stack.extend(node.left.take());
        stack.extend(node.right.take());
    }
}

fn drain<T>(root: Option<Box<Node<T>>>, out: &mut Vec<(Box<[f64]>, T)>) {
    let mut stack: Vec<Box<Node<T>>> = root.into_iter().collect();
    while let Some(node) = stack.pop() {
        let Node {
            point,
            value,
            left,
            right,
        } = *node;
        out.push((point, value));
        stack.extend(left);
        stack.extend(right);
    }
}

/// Directions from the first entry of `trail` to entry `i`, `true` meaning
/// left.
fn path_to(trail: &[Link], mut i: usize) -> Vec<bool> {
    let mut path = Vec::new();
    while let Some((parent, left)) = trail[i] {
        path.push(left);
        i = parent;
    }
    path.reverse();
    path
}

fn follow<'a, T>(mut slot: &'a mut Option<Box<Node<T>>>, path: &[bool]) -> &'a mut Option<Box<Node<T>>> {
    for &left in path {
        match slot {
            Some(node) => slot = if left { &mut node.left } else { &mut node.right },
            None => break,
        }
    }
    slot
}

#[derive(Copy, Clone)]
enum Metric {
    /// Squared euclidean distance.
    L2,
    /// Manhattan distance.
    L1,
}

impl Metric {
    fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        let diffs = a.iter().zip(b.iter()).map(|(x, y)| x - y);
        match self {
            Metric::L2 => diffs.map(|d| d * d).sum(),
            Metric::L1 => diffs.map(f64::abs).sum(),
        }
    }

    /// Lower bound for the distance to anything across a splitting plane at
    /// signed offset `delta`.
    fn axis(self, delta: f64) -> f64 {
        match self {
            Metric::L2 => delta * delta,
            Metric::L1 => delta.abs(),
        }
    }
}

/// Candidate in a k nearest search, ordered by distance.
struct Candidate<'a, T> {
    dist: f64,
    value: &'a T,
}

impl<T> Clone for Candidate<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Candidate<'_, T> {}

impl<T> PartialEq for Candidate<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}

impl<T> PartialOrd for Candidate<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.dist.partial_cmp(&other.dist)
    }
}

pub struct KdTree<T> {
    root: Option<Box<Node<T>>>,
    dimension: usize,
    tolerance: f64,
    count: usize,
}

fn build<T>(items: Vec<(Box<[f64]>, T)>, k: usize) -> Option<Box<Node<T>>> {
    let mut nodes = Vec::with_capacity(items.len());
    let mut work: Vec<(Vec<(Box<[f64]>, T)>, usize, Link)> = vec![(items, 0, None)];
    while let Some((mut items, depth, parent)) = work.pop() {
        if items.is_empty() {
            continue;
        }
        let d = depth % k;
        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |a, b| a.0[d].total_cmp(&b.0[d]));
        // Move the pivot left of any equal coordinates, so the left subtree
        // is strictly less than it.
        let pivot = items[mid].0[d];
        let mut split = 0;
        for i in 0..mid {
            if items[i].0[d] < pivot {
                items.swap(i, split);
                split += 1;
            }
        }
        items.swap(split, mid);
        let right = items.split_off(split + 1);
        let Some((point, value)) = items.pop() else {
            continue;
        };
        let index = nodes.len();
        nodes.push((Some(Node::new(point, value)), parent));
        work.push((right, depth + 1, Some((index, false))));
        work.push((items, depth + 1, Some((index, true))));
    }
    link(nodes)
}

/// Path from `node` to the node with the smallest coordinate `dim` in its
/// subtree.
fn min_path<T>(node: &Node<T>, dim: usize, depth: usize, k: usize) -> Vec<bool> {
    let mut trail: Vec<Link> = vec![None];
    let mut stack = vec![(node, depth, 0usize)];
    let mut best = (node.point[dim], 0usize);
    while let Some((n, depth, i)) = stack.pop() {
        if n.point[dim] < best.0 {
            best = (n.point[dim], i);
        }
        if let Some(c) = n.left.as_deref() {
            trail.push(Some((i, true)));
            stack.push((c, depth + 1, trail.len() - 1));
        }
        // Nothing on the right can be smaller.
        if depth % k == dim {
            continue;
        }
        if let Some(c) = n.right.as_deref() {
            trail.push(Some((i, false)));
            stack.push((c, depth + 1, trail.len() - 1));
        }
    }
    path_to(&trail, best.1)
}

/// Remove the node in `slot`, which sits at `depth`, and return its value.
/// Each removed inner node takes the point and value of the smallest point
/// along its splitting coordinate from the right subtree, and that node is
/// removed in turn.
fn remove_at<T>(mut slot: &mut Option<Box<Node<T>>>, mut depth: usize, k: usize) -> Option<T> {
    loop {
        let leaf = slot
            .as_ref()
            .is_none_or(|n| n.left.is_none() && n.right.is_none());
        if leaf {
            return slot.take().map(|n| n.value);
        }
        let node: &mut Node<T> = slot.as_deref_mut()?;
        if node.right.is_none() {
            node.right = node.left.take();
        }
        let path = min_path(node.right.as_deref()?, depth % k, depth + 1, k);
        let next = follow(&mut node.right, &path);
        let min = next.as_deref_mut()?;
        std::mem::swap(&mut node.point, &mut min.point);
        std::mem::swap(&mut node.value, &mut min.value);
        depth += 1 + path.len();
        slot = next;
    }
}

impl<T> KdTree<T> {
    /// Create an empty tree for points with `dimension` coordinates. Points
    /// closer than `tolerance` in every coordinate are considered equal by
    /// [`Self::find`] and [`Self::remove`].
    pub fn new(dimension: usize, tolerance: f64) -> Result<Self, Error> {
        if dimension == 0 {
            return Err(Error::InvalidDimension(dimension));
        }
        Ok(KdTree {
            root: None,
            dimension,
            tolerance,
            count: 0,
        })
    }

    /// Create a balanced tree from `points` and their `values`.
    pub fn create_balanced<P>(
        dimension: usize,
        tolerance: f64,
        points: &[P],
        values: Vec<T>,
    ) -> Result<Self, Error>
    where
        P: AsRef<[f64]>,
    {
        let mut tree = Self::new(dimension, tolerance)?;
        if points.len() != values.len() {
            return Err(Error::MismatchedArrayLengths(points.len(), values.len()));
        }
        for p in points {
            tree.check_point(p.as_ref())?;
        }
        let items: Vec<(Box<[f64]>, T)> = points
            .iter()
            .map(|p| Box::<[f64]>::from(p.as_ref()))
            .zip(values)
            .collect();
        tree.count = items.len();
        tree.root = build(items, dimension);
        tracing::debug!(points = tree.count, depth = tree.depth(), "built balanced kd tree");
        Ok(tree)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of levels in the tree. An empty tree has depth zero.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut stack: Vec<(&Node<T>, usize)> = self.root.as_deref().map(|n| (n, 1)).into_iter().collect();
        while let Some((node, level)) = stack.pop() {
            depth = depth.max(level);
            for c in [node.left.as_deref(), node.right.as_deref()].into_iter().flatten() {
                stack.push((c, level + 1));
            }
        }
        depth
    }

    pub fn clear(&mut self) {
        unlink(self.root.take());
        self.count = 0;
    }

    fn check_point(&self, point: &[f64]) -> Result<(), Error> {
        if point.len() == self.dimension {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dimension,
                found: point.len(),
            })
        }
    }

    pub fn insert(&mut self, point: &[f64], value: T) -> Result<(), Error> {
        self.check_point(point)?;
        let k = self.dimension;
        let mut depth = 0;
        let mut slot = &mut self.root;
        while let Some(node) = slot {
            let d = depth % k;
            slot = if point[d] < node.point[d] {
                &mut node.left
            } else {
                &mut node.right
            };
            depth += 1;
        }
        *slot = Some(Node::new(point.into(), value));
        self.count += 1;
        Ok(())
    }

    /// Value of a point that matches `point` within the tolerance.
    pub fn find(&self, point: &[f64]) -> Result<Option<&T>, Error> {
        self.check_point(point)?;
        let mut stack: Vec<(&Node<T>, usize)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 0));
        }
        while let Some((node, depth)) = stack.pop() {
            if node.matches(point, self.tolerance) {
                return Ok(Some(&node.value));
            }
            let d = depth % self.dimension;
            if point[d] + self.tolerance >= node.point[d] {
                if let Some(n) = node.right.as_deref() {
                    stack.push((n, depth + 1));
                }
            }
            // Pushed last, so searched first.
            if point[d] - self.tolerance < node.point[d] {
                if let Some(n) = node.left.as_deref() {
                    stack.push((n, depth + 1));
                }
            }
        }
        Ok(None)
    }

    pub fn contains(&self, point: &[f64]) -> Result<bool, Error> {
        Ok(self.find(point)?.is_some())
    }

    /// Path from the root to a node matching `point` within the tolerance.
    fn locate(&self, point: &[f64]) -> Option<Vec<bool>> {
        let mut trail: Vec<Link> = Vec::new();
        let mut stack: Vec<(&Node<T>, usize, usize)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            trail.push(None);
            stack.push((root, 0, 0));
        }
        while let Some((node, depth, i)) = stack.pop() {
            if node.matches(point, self.tolerance) {
                return Some(path_to(&trail, i));
            }
            let d = depth % self.dimension;
            if point[d] + self.tolerance >= node.point[d] {
                if let Some(n) = node.right.as_deref() {
                    trail.push(Some((i, false)));
                    stack.push((n, depth + 1, trail.len() - 1));
                }
            }
            if point[d] - self.tolerance < node.point[d] {
                if let Some(n) = node.left.as_deref() {
                    trail.push(Some((i, true)));
                    stack.push((n, depth + 1, trail.len() - 1));
                }
            }
        }
        None
    }

    /// Remove a point matching `point` within the tolerance, and return its
    /// value.
    pub fn remove(&mut self, point: &[f64]) -> Result<Option<T>, Error> {
        self.check_point(point)?;
        let Some(path) = self.locate(point) else {
            return Ok(None);
        };
        let slot = follow(&mut self.root, &path);
        let removed = remove_at(slot, path.len(), self.dimension);
        if removed.is_some() {
            self.count -= 1;
        }
        Ok(removed)
    }

    /// Rebuild the tree so it is balanced.
    pub fn balance(&mut self) {
        let mut items = Vec::with_capacity(self.count);
        drain(self.root.take(), &mut items);
        self.count = items.len();
        self.root = build(items, self.dimension);
        tracing::debug!(points = self.count, depth = self.depth(), "rebalanced kd tree");
    }

    /// Visit nodes nearest side first. Each stacked node carries a lower
    /// bound on the distance to its subtree, and `visit` is called with the
    /// node, its distance and that bound. A subtree is skipped unless
    /// `reachable` accepts its bound.
    fn walk_nearest<'a, V, R>(&'a self, point: &[f64], metric: Metric, mut visit: V, reachable: R)
    where
        V: FnMut(&'a Node<T>, f64),
        R: Fn(f64) -> bool,
    {
        let mut stack: Vec<(&'a Node<T>, usize, f64)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 0, 0.0));
        }
        while let Some((node, depth, bound)) = stack.pop() {
            if !reachable(bound) {
                continue;
            }
            visit(node, metric.distance(&node.point, point));
            let d = depth % self.dimension;
            let delta = point[d] - node.point[d];
            let (near, far) = if delta < 0.0 {
                (&node.left, &node.right)
            } else {
                (&node.right, &node.left)
            };
            if let Some(n) = far.as_deref() {
                stack.push((n, depth + 1, metric.axis(delta)));
            }
            if let Some(n) = near.as_deref() {
                stack.push((n, depth + 1, bound));
            }
        }
    }

    fn nearest_impl(&self, point: &[f64], metric: Metric) -> Result<Option<(&T, f64)>, Error> {
        self.check_point(point)?;
        let best: Cell<Option<(&T, f64)>> = Cell::new(None);
        self.walk_nearest(
            point,
            metric,
            |node, dist| {
                if best.get().is_none_or(|(_, b)| dist < b) {
                    best.set(Some((&node.value, dist)));
                }
            },
            |bound| best.get().is_none_or(|(_, b)| bound < b),
        );
        Ok(best.get())
    }

    /// The value nearest to `point` and its squared euclidean distance.
    pub fn nearest_l2(&self, point: &[f64]) -> Result<Option<(&T, f64)>, Error> {
        self.nearest_impl(point, Metric::L2)
    }

    /// The value nearest to `point` and its manhattan distance.
    pub fn nearest_l1(&self, point: &[f64]) -> Result<Option<(&T, f64)>, Error> {
        self.nearest_impl(point, Metric::L1)
    }

    fn k_nearest_impl(&self, point: &[f64], k: usize, metric: Metric) -> Result<Vec<(&T, f64)>, Error> {
        self.check_point(point)?;
        let heap = RefCell::new(BoundedHeap::new(k.min(self.count)));
        self.walk_nearest(
            point,
            metric,
            |node, dist| {
                heap.borrow_mut().offer(Candidate {
                    dist,
                    value: &node.value,
                });
            },
            |bound| {
                let heap = heap.borrow();
                !heap.is_full() || heap.peek().is_some_and(|worst| bound < worst.dist)
            },
        );
        Ok(heap
            .into_inner()
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.value, c.dist))
            .collect())
    }

    /// The `k` values nearest to `point`, nearest first, with their squared
    /// euclidean distances. Fewer are returned if the tree is smaller.
    pub fn k_nearest_l2(&self, point: &[f64], k: usize) -> Result<Vec<(&T, f64)>, Error> {
        self.k_nearest_impl(point, k, Metric::L2)
    }

    /// Same as [`Self::k_nearest_l2`], with manhattan distances.
    pub fn k_nearest_l1(&self, point: &[f64], k: usize) -> Result<Vec<(&T, f64)>, Error> {
        self.k_nearest_impl(point, k, Metric::L1)
    }

    /// Call `callback` with the value of every node accepted by `inside`,
    /// descending left when `go_left` accepts the split coordinate and right
    /// when `go_right` does. Returns `false` as soon as the callback does.
    fn walk_region<I, L, G, F>(&self, inside: I, go_left: L, go_right: G, callback: &mut F) -> bool
    where
        I: Fn(&[f64]) -> bool,
        L: Fn(usize, f64) -> bool,
        G: Fn(usize, f64) -> bool,
        F: FnMut(&T) -> bool,
    {
        let mut stack: Vec<(&Node<T>, usize)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 0));
        }
        while let Some((node, depth)) = stack.pop() {
            if inside(&node.point) && !callback(&node.value) {
                return false;
            }
            let d = depth % self.dimension;
            if go_right(d, node.point[d]) {
                if let Some(n) = node.right.as_deref() {
                    stack.push((n, depth + 1));
                }
            }
            if go_left(d, node.point[d]) {
                if let Some(n) = node.left.as_deref() {
                    stack.push((n, depth + 1));
                }
            }
        }
        true
    }

    /// Call `callback` with every value whose point lies inside the box
    /// spanned by `min` and `max`, bounds included. The search stops as soon
    /// as the callback returns `false`, in which case this returns `false`.
    pub fn box_search<F>(&self, min: &[f64], max: &[f64], mut callback: F) -> Result<bool, Error>
    where
        F: FnMut(&T) -> bool,
    {
        self.check_point(min)?;
        self.check_point(max)?;
        Ok(self.walk_region(
            |p| {
                p.iter()
                    .zip(min.iter().zip(max.iter()))
                    .all(|(p, (lo, hi))| lo <= p && p <= hi)
            },
            |d, split| min[d] < split,
            |d, split| max[d] >= split,
            &mut callback,
        ))
    }

    fn range_impl<F>(&self, center: &[f64], radius: f64, metric: Metric, mut callback: F) -> Result<bool, Error>
    where
        F: FnMut(&T) -> bool,
    {
        self.check_point(center)?;
        let limit = metric.axis(radius);
        Ok(self.walk_region(
            |p| metric.distance(p, center) <= limit,
            |d, split| center[d] - radius < split,
            |d, split| center[d] + radius >= split,
            &mut callback,
        ))
    }

    /// Call `callback` with every value within euclidean distance `radius`
    /// of `center`. Stops and returns `false` when the callback does.
    pub fn range_search_l2<F>(&self, center: &[f64], radius: f64, callback: F) -> Result<bool, Error>
    where
        F: FnMut(&T) -> bool,
    {
        self.range_impl(center, radius, Metric::L2, callback)
    }

    /// Call `callback` with every value within manhattan distance `radius`
    /// of `center`. Stops and returns `false` when the callback does.
    pub fn range_search_l1<F>(&self, center: &[f64], radius: f64, callback: F) -> Result<bool, Error>
    where
        F: FnMut(&T) -> bool,
    {
        self.range_impl(center, radius, Metric::L1, callback)
    }
}

impl<T> Clone for KdTree<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let mut nodes: Vec<(Option<Box<Node<T>>>, Link)> = Vec::with_capacity(self.count);
        let mut stack: Vec<(&Node<T>, Link)> = self.root.as_deref().map(|n| (n, None)).into_iter().collect();
        while let Some((node, parent)) = stack.pop() {
            let index = nodes.len();
            nodes.push((Some(Node::new(node.point.clone(), node.value.clone())), parent));
            if let Some(n) = node.right.as_deref() {
                stack.push((n, Some((index, false))));
            }
            if let Some(n) = node.left.as_deref() {
                stack.push((n, Some((index, true))));
            }
        }
        KdTree {
            root: link(nodes),
            dimension: self.dimension,
            tolerance: self.tolerance,
            count: self.count,
        }
    }
}

impl<T> Drop for KdTree<T> {
    fn drop(&mut self) {
        unlink(self.root.take());
    }
}
