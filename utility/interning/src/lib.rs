use std::borrow::Borrow;
use std::hash::Hash;
use std::marker::PhantomData;

use rustc_hash::FxHashMap;

/// Deduplicating value table. Ids are dense and assigned in first seen order, so the
/// table can be stored as a plain list and referenced by index.
pub struct ValueInterning<T> {
  inner: FxHashMap<T, usize>,
  values: Vec<T>,
}

impl<T> Default for ValueInterning<T> {
  fn default() -> Self {
    Self {
      inner: Default::default(),
      values: Default::default(),
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ValueInterning<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list().entries(self.values.iter()).finish()
  }
}

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct InternedId<T> {
  value: usize,
  ty: PhantomData<T>,
}

impl<T> Clone for InternedId<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for InternedId<T> {}

impl<T> InternedId<T> {
  /// The id is not checked against any table, lookups with a foreign id return None.
  pub fn from_index(value: usize) -> Self {
    Self {
      value,
      ty: PhantomData,
    }
  }

  pub fn index(&self) -> usize {
    self.value
  }
}

impl<T> ValueInterning<T>
where
  T: Eq + Hash + Clone,
{
  /// Rebuild a table from its stored order. A repeated value keeps every slot
  /// addressable by id, lookups by value resolve to the first one.
  pub fn from_values(values: Vec<T>) -> Self {
    let mut inner = FxHashMap::default();
    for (i, v) in values.iter().enumerate() {
      inner.entry(v.clone()).or_insert(i);
    }
    Self { inner, values }
  }

  pub fn compute_intern_id<Q>(&mut self, v: &Q) -> InternedId<T>
  where
    T: Borrow<Q>,
    Q: Hash + Eq + ToOwned<Owned = T> + ?Sized,
  {
    let value = match self.inner.get(v) {
      Some(&id) => id,
      None => {
        let id = self.values.len();
        self.values.push(v.to_owned());
        self.inner.insert(v.to_owned(), id);
        id
      }
    };
    InternedId::from_index(value)
  }

  pub fn get_intern_id<Q>(&self, v: &Q) -> Option<InternedId<T>>
  where
    T: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.inner.get(v).map(|&id| InternedId::from_index(id))
  }
}

impl<T> ValueInterning<T> {
  pub fn get_value(&self, id: InternedId<T>) -> Option<&T> {
    self.values.get(id.value)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// values in id order
  pub fn values(&self) -> &[T] {
    &self.values
  }
}

#[test]
fn interning_dedup_and_order() {
  let mut table = ValueInterning::<String>::default();
  let a = table.compute_intern_id("stone");
  let b = table.compute_intern_id("");
  let c = table.compute_intern_id("stone");
  assert_eq!(a, c);
  assert_ne!(a, b);
  assert_eq!(a.index(), 0);
  assert_eq!(b.index(), 1);
  assert_eq!(table.len(), 2);
  assert_eq!(table.get_value(b).map(String::as_str), Some(""));
  assert_eq!(table.get_intern_id("stone"), Some(a));
  assert_eq!(table.get_value(InternedId::from_index(5)), None);

  let rebuilt = ValueInterning::from_values(table.values().to_vec());
  assert_eq!(rebuilt.get_intern_id(""), Some(b));
}
