use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashSet, LinkedList, VecDeque};
use std::hash::Hash;

use crate::executor::{BoxedConverter, Converter};

trait Collection<T: 'static>: Any + FromIterator<T> {
    fn elements(&self) -> Box<dyn Iterator<Item = &T> + '_>;
}

macro_rules! collection {
    ($($collection:ident),+) => {$(
        impl<T: Clone + Eq + Hash + Ord + 'static> Collection<T> for $collection<T> {
            fn elements(&self) -> Box<dyn Iterator<Item = &T> + '_> {
                Box::new(self.iter())
            }
        }
    )+};
}

collection!(Vec, VecDeque, LinkedList, HashSet, BTreeSet);

impl<T: Clone + Eq + Hash + Ord + 'static> Collection<T> for Box<[T]> {
    fn elements(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }
}

fn between<T, A, B>() -> BoxedConverter
where
    T: Clone + 'static,
    A: Collection<T>,
    B: Collection<T>,
{
    Converter::new(|source: &A| source.elements().cloned().collect::<B>()).into()
}

fn from<T, A>() -> Vec<BoxedConverter>
where
    T: Clone + Eq + Hash + Ord + 'static,
    A: Collection<T>,
{
    [
        between::<T, A, Vec<T>>(),
        between::<T, A, VecDeque<T>>(),
        between::<T, A, LinkedList<T>>(),
        between::<T, A, HashSet<T>>(),
        between::<T, A, BTreeSet<T>>(),
        between::<T, A, Box<[T]>>(),
    ]
    .into_iter()
    .filter(|converter| converter.destination_type().id() != TypeId::of::<A>())
    .collect()
}

/// Converters between every ordered pair of `Vec<T>`, `VecDeque<T>`,
/// `LinkedList<T>`, `HashSet<T>`, `BTreeSet<T>` and `Box<[T]>`.
///
/// Elements are cloned. Converting into a set drops duplicates; converting
/// out of a `HashSet` yields an unspecified order.
pub fn collection_converters<T>() -> Vec<BoxedConverter>
where
    T: Clone + Eq + Hash + Ord + 'static,
{
    [
        from::<T, Vec<T>>(),
        from::<T, VecDeque<T>>(),
        from::<T, LinkedList<T>>(),
        from::<T, HashSet<T>>(),
        from::<T, BTreeSet<T>>(),
        from::<T, Box<[T]>>(),
    ]
    .into_iter()
    .flatten()
    .collect()
}
