use crate::OilObjectName;
use fnv::FnvBuildHasher;
use std::{
    collections::HashMap,
    ops::{Index, IndexMut},
};

/// An ordered list of named OIL items
///
/// Items keep the order in which they were pushed (i.e. declaration order), and can
/// additionally be looked up by name in constant time. All iteration over an
/// `ItemList` follows the insertion order, never the hash order.
#[derive(Debug, Clone)]
pub struct ItemList<T: OilObjectName> {
    items: Vec<T>,
    // item name -> index in items
    map: HashMap<String, usize, FnvBuildHasher>,
}

impl<T: OilObjectName> ItemList<T> {
    /// create a new, empty `ItemList`
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: vec![],
            map: HashMap::default(),
        }
    }

    /// create a new `ItemList` with room for `capacity` items
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            map: HashMap::with_capacity_and_hasher(capacity, FnvBuildHasher::default()),
        }
    }

    /// append an item
    ///
    /// If an item with the same name is already present, the name lookup keeps
    /// referring to the earlier item. Use `contains_key` first to avoid this.
    pub fn push(&mut self, value: T) {
        let index = self.items.len();
        self.map.entry(value.get_name().to_string()).or_insert(index);
        self.items.push(value);
    }

    /// get an item by name
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&T> {
        let index = self.map.get(key)?;
        Some(&self.items[*index])
    }

    /// get a mutable reference to an item by name
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        let index = self.map.get(key)?;
        Some(&mut self.items[*index])
    }

    /// position of the named item in the list
    #[must_use]
    pub fn index(&self, key: &str) -> Option<usize> {
        self.map.get(key).copied()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// iterate over the items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// iterate mutably over the items in insertion order
    ///
    /// Renaming items through this iterator is not supported, the name index would go stale.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// iterate over the item names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(OilObjectName::get_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        let into_iter = iter.into_iter();
        let (low, _high) = into_iter.size_hint();
        self.items.reserve(low);
        self.map.reserve(low);
        for item in into_iter {
            self.push(item);
        }
    }
}

impl<T: OilObjectName> Default for ItemList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: OilObjectName> Index<usize> for ItemList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<T: OilObjectName> IndexMut<usize> for ItemList<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.items[index]
    }
}

impl<T: OilObjectName> FromIterator<T> for ItemList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let into_iter = iter.into_iter();
        let (low, _high) = into_iter.size_hint();
        let mut item_list = ItemList::with_capacity(low);
        for item in into_iter {
            item_list.push(item);
        }
        item_list
    }
}

impl<T: OilObjectName> IntoIterator for ItemList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T: OilObjectName> IntoIterator for &'a ItemList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T: OilObjectName> IntoIterator for &'a mut ItemList<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

impl<T> PartialEq for ItemList<T>
where
    T: OilObjectName + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        // the map is derived from the items
        self.items == other.items
    }
}
