use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Declares `Self` a subtype of `B`.
///
/// Rust has no inheritance, so the relation is expressed through composition:
/// a subtype embeds its base and exposes it. Register the relation with
/// [`crate::MapperBuilder::declare_subtype`] so that maps declared for `B`
/// accept `Self` values.
///
/// ```rust,ignore
/// struct Person { name: String }
/// struct Employee { person: Person, badge: u32 }
///
/// impl Extends<Person> for Employee {
///     fn base(&self) -> &Person { &self.person }
///     fn base_mut(&mut self) -> &mut Person { &mut self.person }
/// }
/// ```
pub trait Extends<B: Any>: Any {
    fn base(&self) -> &B;
    fn base_mut(&mut self) -> &mut B;
}

#[derive(Clone, Copy)]
struct Upcast {
    base: TypeId,
    as_base: fn(&dyn Any) -> Option<&dyn Any>,
    as_base_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
}

fn as_base<S: Extends<B>, B: Any>(value: &dyn Any) -> Option<&dyn Any> {
    value.downcast_ref::<S>().map(|sub| sub.base() as &dyn Any)
}

fn as_base_mut<S: Extends<B>, B: Any>(value: &mut dyn Any) -> Option<&mut dyn Any> {
    value.downcast_mut::<S>().map(|sub| sub.base_mut() as &mut dyn Any)
}

/// Declared subtype relations, searched transitively.
#[derive(Clone, Default)]
pub struct TypeHierarchy {
    parents: HashMap<TypeId, Vec<Upcast>>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `S` as a direct subtype of `B`. Returns `false` if it already was.
    pub fn declare<S: Extends<B>, B: Any>(&mut self) -> bool {
        let parents = self.parents.entry(TypeId::of::<S>()).or_default();
        if parents.iter().any(|upcast| upcast.base == TypeId::of::<B>()) {
            return false;
        }
        parents.push(Upcast {
            base: TypeId::of::<B>(),
            as_base: as_base::<S, B>,
            as_base_mut: as_base_mut::<S, B>,
        });
        true
    }

    /// `true` if `base` is a direct or indirect declared base of `sub`.
    pub fn is_subtype(&self, sub: TypeId, base: TypeId) -> bool {
        sub != base && self.path(sub, base).is_some()
    }

    /// Borrows `value` as its declared base `to`.
    pub fn upcast<'a>(&self, value: &'a dyn Any, to: TypeId) -> Option<&'a dyn Any> {
        let path = self.path(value.type_id(), to)?;
        let mut current = value;
        for step in path {
            current = (step.as_base)(current)?;
        }
        Some(current)
    }

    /// Mutably borrows `value` as its declared base `to`.
    pub fn upcast_mut<'a>(&self, value: &'a mut dyn Any, to: TypeId) -> Option<&'a mut dyn Any> {
        let path = self.path((*value).type_id(), to)?;
        let mut current = value;
        for step in path {
            current = (step.as_base_mut)(current)?;
        }
        Some(current)
    }

    // Breadth first, so the shortest chain of upcasts wins.
    fn path(&self, from: TypeId, to: TypeId) -> Option<Vec<Upcast>> {
        if from == to {
            return Some(Vec::new());
        }
        let mut queue = VecDeque::from([(from, Vec::<Upcast>::new())]);
        let mut seen = HashSet::from([from]);
        while let Some((ty, path)) = queue.pop_front() {
            for parent in self.parents.get(&ty).into_iter().flatten() {
                let mut next = path.clone();
                next.push(*parent);
                if parent.base == to {
                    return Some(next);
                }
                if seen.insert(parent.base) {
                    queue.push_back((parent.base, next));
                }
            }
        }
        None
    }
}
