/*!
Growable containers that own the elements of one kind, and the maps produced
when those containers are compacted or reordered.

Every element carries a scratch `tag`. Searches ask the list for a fresh tag
with [`ElementList::next_tag`] and treat an element as visited when its tag
equals the search tag. Since the counter only grows, visited flags never
need to be cleared between searches.
*/

use crate::{
    element::{Element, Handle},
    error::Error,
};
use std::{cmp::Ordering, marker::PhantomData};

/// The smallest tag. Elements are reset to this when the counter overflows.
pub const MIN_TAG: i32 = i32::MIN;

pub struct ElementList<T>
where
    T: Element,
{
    items: Vec<T>,
    tags: Vec<i32>,
    current: i32,
}

impl<T> Clone for ElementList<T>
where
    T: Element + Clone,
{
    fn clone(&self) -> Self {
        ElementList {
            items: self.items.clone(),
            tags: self.tags.clone(),
            current: self.current,
        }
    }
}

impl<T> Default for ElementList<T>
where
    T: Element,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ElementList<T>
where
    T: Element,
{
    pub fn new() -> Self {
        ElementList {
            items: Vec::new(),
            tags: Vec::new(),
            current: MIN_TAG,
        }
    }

    pub fn with_capacity(n: usize) -> Self {
        ElementList {
            items: Vec::with_capacity(n),
            tags: Vec::with_capacity(n),
            current: MIN_TAG,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn reserve(&mut self, n: usize) {
        self.items.reserve(n);
        self.tags.reserve(n);
    }

    /// Handles of all elements, used or not.
    pub fn handles(&self) -> impl Iterator<Item = T::Handle> + use<T> {
        (0..(self.len() as u32)).map(|i| i.into())
    }

    /// Handles of the elements that are in use.
    pub fn used_handles(&self) -> impl Iterator<Item = T::Handle> + use<'_, T> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_unused())
            .map(|(i, _)| (i as u32).into())
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, h: T::Handle) -> &T {
        &self.items[h.index() as usize]
    }

    pub fn get_mut(&mut self, h: T::Handle) -> &mut T {
        &mut self.items[h.index() as usize]
    }

    /// Append an element. Its index is the current length of the list and
    /// its tag is the current tag of the list.
    pub fn add(&mut self, item: T) -> T::Handle {
        let index = self.items.len() as u32;
        self.items.push(item);
        self.tags.push(self.current);
        index.into()
    }

    /// Check if `h` indexes an element of this list.
    pub fn owns(&self, h: T::Handle) -> bool {
        (h.index() as usize) < self.items.len()
    }

    pub fn owns_check(&self, h: T::Handle) -> Result<(), Error> {
        if self.owns(h) {
            Ok(())
        } else {
            Err(T::not_owned(h))
        }
    }

    /// Check that `h` is owned by this list and refers to a used element.
    pub fn used_check(&self, h: T::Handle) -> Result<(), Error> {
        self.owns_check(h)?;
        if self.get(h).is_unused() {
            Err(T::unused(h))
        } else {
            Ok(())
        }
    }

    pub fn is_unused(&self, h: T::Handle) -> bool {
        self.get(h).is_unused()
    }

    pub fn count_unused(&self) -> usize {
        self.items.iter().filter(|item| item.is_unused()).count()
    }

    /// The tag most recently issued by this list.
    pub fn current_tag(&self) -> i32 {
        self.current
    }

    /// Issue a tag that is larger than every tag issued before.
    ///
    /// When the counter runs out, every element is reset to [`MIN_TAG`] and
    /// the counter restarts just above it.
    pub fn next_tag(&mut self) -> i32 {
        if self.current == i32::MAX {
            tracing::debug!(count = self.len(), "tag counter overflow, resetting tags");
            self.tags.fill(MIN_TAG);
            self.current = MIN_TAG;
        }
        self.current += 1;
        self.current
    }

    pub fn tag(&self, h: T::Handle) -> i32 {
        self.tags[h.index() as usize]
    }

    pub fn set_tag(&mut self, h: T::Handle, tag: i32) {
        self.tags[h.index() as usize] = tag;
    }

    /// Stamp `h` with `tag`. Returns `true` if the element was not already
    /// stamped with it.
    pub fn visit(&mut self, h: T::Handle, tag: i32) -> bool {
        std::mem::replace(&mut self.tags[h.index() as usize], tag) != tag
    }

    /// Remove unused elements, keeping the relative order of the rest.
    ///
    /// The returned map must be used to update anything that refers to the
    /// elements by index, including attribute arrays held by the caller.
    pub fn compact(&mut self) -> Remap<T::Handle> {
        let old_len = self.items.len();
        let mut map = vec![None; old_len];
        let mut marker = 0usize;
        for i in 0..old_len {
            if self.items[i].is_unused() {
                continue;
            }
            if i != marker {
                self.items.swap(marker, i);
                self.tags.swap(marker, i);
            }
            map[i] = Some(marker as u32);
            marker += 1;
        }
        self.items.truncate(marker);
        self.tags.truncate(marker);
        if self.items.capacity() > marker << 1 {
            self.items.shrink_to(marker);
            self.tags.shrink_to(marker);
        }
        Remap::new(map, marker)
    }

    /// Reorder the elements by comparing their handles. The sort is stable.
    pub fn sort_by<F>(&mut self, mut compare: F) -> Remap<T::Handle>
    where
        F: FnMut(T::Handle, T::Handle) -> Ordering,
    {
        let len = self.items.len();
        let mut order: Vec<u32> = (0..len as u32).collect();
        order.sort_by(|a, b| compare((*a).into(), (*b).into()));
        let mut map = vec![None; len];
        for (new, old) in order.iter().enumerate() {
            map[*old as usize] = Some(new as u32);
        }
        let remap = Remap::new(map, len);
        remap.permute(&mut self.items);
        remap.permute(&mut self.tags);
        remap
    }
}

/// Map from the indices before a compaction or sort, to the indices after.
///
/// Elements that were removed map to `None`.
#[derive(Clone, Debug)]
pub struct Remap<H>
where
    H: Handle,
{
    map: Vec<Option<u32>>,
    new_len: usize,
    _phantom: PhantomData<H>,
}

impl<H> Remap<H>
where
    H: Handle + From<u32>,
{
    pub(crate) fn new(map: Vec<Option<u32>>, new_len: usize) -> Self {
        Remap {
            map,
            new_len,
            _phantom: PhantomData,
        }
    }

    /// The new handle of the element that was `old`, or `None` if it was
    /// removed.
    pub fn get(&self, old: H) -> Option<H> {
        self.map
            .get(old.index() as usize)
            .copied()
            .flatten()
            .map(|i| i.into())
    }

    pub fn old_len(&self) -> usize {
        self.map.len()
    }

    pub fn new_len(&self) -> usize {
        self.new_len
    }

    pub fn num_removed(&self) -> usize {
        self.old_len() - self.new_len
    }

    /// Check if nothing moved and nothing was removed.
    pub fn is_identity(&self) -> bool {
        self.map
            .iter()
            .enumerate()
            .all(|(i, m)| *m == Some(i as u32))
    }

    /// Apply this map to an attribute array that is indexed by the old
    /// handles. Values of removed elements are dropped.
    pub fn apply<A>(&self, attrs: &mut Vec<A>) -> Result<(), Error> {
        if attrs.len() != self.map.len() {
            return Err(Error::MismatchedArrayLengths(self.map.len(), attrs.len()));
        }
        self.permute(attrs);
        Ok(())
    }

    fn permute<A>(&self, values: &mut Vec<A>) {
        let mut slots: Vec<Option<A>> = (0..self.new_len).map(|_| None).collect();
        for (value, dst) in values.drain(..).zip(self.map.iter()) {
            if let Some(dst) = dst {
                slots[*dst as usize] = Some(value);
            }
        }
        values.extend(slots.into_iter().flatten());
    }
}

#[cfg(test)]
mod test {
    use super::{ElementList, MIN_TAG};
    use crate::element::{Face, HH, Handle, FH};

    fn faces(used: &[bool]) -> ElementList<Face> {
        let mut list = ElementList::new();
        for (i, u) in used.iter().enumerate() {
            list.add(Face {
                halfedge: if *u { Some((i as u32).into()) } else { None },
            });
        }
        list
    }

    #[test]
    fn t_add_assigns_index() {
        let mut list = faces(&[true, true]);
        let f = list.add(Face {
            halfedge: Some(HH::from(7)),
        });
        assert_eq!(f.index(), 2);
        assert_eq!(list.len(), 3);
        assert_eq!(list.tag(f), list.current_tag());
    }

    #[test]
    fn t_compact() {
        let mut list = faces(&[true, false, true, false, false, true]);
        let remap = list.compact();
        assert_eq!(list.len(), 3);
        assert_eq!(remap.old_len(), 6);
        assert_eq!(remap.new_len(), 3);
        assert_eq!(remap.num_removed(), 3);
        // Relative order is preserved.
        assert_eq!(
            list.items()
                .iter()
                .map(|f| f.halfedge.map(|h| h.index()))
                .collect::<Vec<_>>(),
            vec![Some(0), Some(2), Some(5)]
        );
        assert_eq!(remap.get(0.into()), Some(FH::from(0)));
        assert_eq!(remap.get(1.into()), None);
        assert_eq!(remap.get(2.into()), Some(FH::from(1)));
        assert_eq!(remap.get(5.into()), Some(FH::from(2)));
        let mut attrs = vec!['a', 'b', 'c', 'd', 'e', 'f'];
        remap.apply(&mut attrs).expect("Cannot compact attributes");
        assert_eq!(attrs, vec!['a', 'c', 'f']);
    }

    #[test]
    fn t_compact_shrinks() {
        let mut used = vec![false; 64];
        used[3] = true;
        let mut list = faces(&used);
        list.compact();
        assert_eq!(list.len(), 1);
        assert!(list.capacity() <= 2);
    }

    #[test]
    fn t_compact_mismatched_attributes() {
        let mut list = faces(&[true, false]);
        let remap = list.compact();
        let mut attrs = vec![1, 2, 3];
        assert!(remap.apply(&mut attrs).is_err());
        assert_eq!(attrs, vec![1, 2, 3]);
    }

    #[test]
    fn t_sort() {
        let mut list = faces(&[true, true, true, true]);
        let keys = [3, 1, 2, 0];
        let remap = list.sort_by(|a: FH, b: FH| {
            keys[a.index() as usize].cmp(&keys[b.index() as usize])
        });
        assert_eq!(
            list.items()
                .iter()
                .map(|f| f.halfedge.map(|h| h.index()))
                .collect::<Vec<_>>(),
            vec![Some(3), Some(1), Some(2), Some(0)]
        );
        assert_eq!(remap.get(0.into()), Some(FH::from(3)));
        assert!(!remap.is_identity());
        let mut attrs = vec![30, 10, 20, 0];
        remap.apply(&mut attrs).expect("Cannot permute attributes");
        assert_eq!(attrs, vec![0, 10, 20, 30]);
    }

    #[test]
    fn t_next_tag_increases() {
        let mut list = faces(&[true, true]);
        let a = list.next_tag();
        let b = list.next_tag();
        assert!(b > a);
        assert!(list.visit(0.into(), b));
        assert!(!list.visit(0.into(), b));
        assert_eq!(list.tag(0.into()), b);
    }

    #[test]
    fn t_next_tag_overflow() {
        let mut list = faces(&[true, true, true]);
        list.current = i32::MAX - 1;
        let t = list.next_tag();
        assert_eq!(t, i32::MAX);
        list.set_tag(1.into(), t);
        let t = list.next_tag();
        assert_eq!(t, MIN_TAG + 1);
        for f in list.handles() {
            assert_eq!(list.tag(f), MIN_TAG);
        }
    }

    #[test]
    fn t_ownership() {
        let list = faces(&[true, false]);
        assert!(list.owns(1.into()));
        assert!(!list.owns(2.into()));
        assert!(list.used_check(0.into()).is_ok());
        assert!(list.used_check(1.into()).is_err());
        assert!(list.owns_check(5.into()).is_err());
        assert_eq!(list.count_unused(), 1);
        assert_eq!(list.used_handles().count(), 1);
    }
}
