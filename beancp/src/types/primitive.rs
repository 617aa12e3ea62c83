//! Primitive/wrapper equivalence.
//!
//! `P` and `Option<P>` are interchangeable for resolution purposes, the same
//! way a primitive and its boxed wrapper are. A `None` wrapper read as `P` is
//! a null.

use once_cell::sync::Lazy;
use std::any::{Any, TypeId};

pub(crate) struct PrimitivePair {
    pub(crate) primitive: TypeId,
    pub(crate) wrapper: TypeId,
    pub(crate) name: &'static str,
    convert: fn(&dyn Any, TypeId) -> Option<Box<dyn Any>>,
    assign: fn(&mut dyn Any, &dyn Any) -> bool,
    zero: fn() -> Box<dyn Any>,
}

impl PrimitivePair {
    fn of<P: Any + Copy + Default>() -> Self {
        Self {
            primitive: TypeId::of::<P>(),
            wrapper: TypeId::of::<Option<P>>(),
            name: std::any::type_name::<P>(),
            convert: convert::<P>,
            assign: assign::<P>,
            zero: zero::<P>,
        }
    }

    pub(crate) fn covers(&self, id: TypeId) -> bool {
        self.primitive == id || self.wrapper == id
    }

    /// Reads `value` as `target`. `None` when `value` is an empty wrapper and
    /// `target` is the primitive, or when either side is not part of this pair.
    pub(crate) fn convert(&self, value: &dyn Any, target: TypeId) -> Option<Box<dyn Any>> {
        (self.convert)(value, target)
    }

    /// Writes `value` into `slot`. Returns `false` if nothing was written.
    pub(crate) fn assign(&self, slot: &mut dyn Any, value: &dyn Any) -> bool {
        (self.assign)(slot, value)
    }

    /// Default value of the primitive side.
    pub(crate) fn zero(&self) -> Box<dyn Any> {
        (self.zero)()
    }
}

static PRIMITIVES: Lazy<Vec<PrimitivePair>> = Lazy::new(|| {
    vec![
        PrimitivePair::of::<i8>(),
        PrimitivePair::of::<i16>(),
        PrimitivePair::of::<i32>(),
        PrimitivePair::of::<i64>(),
        PrimitivePair::of::<i128>(),
        PrimitivePair::of::<isize>(),
        PrimitivePair::of::<u8>(),
        PrimitivePair::of::<u16>(),
        PrimitivePair::of::<u32>(),
        PrimitivePair::of::<u64>(),
        PrimitivePair::of::<u128>(),
        PrimitivePair::of::<usize>(),
        PrimitivePair::of::<f32>(),
        PrimitivePair::of::<f64>(),
        PrimitivePair::of::<bool>(),
        PrimitivePair::of::<char>(),
    ]
});

/// Pair containing `id` on either side.
pub(crate) fn lookup(id: TypeId) -> Option<&'static PrimitivePair> {
    PRIMITIVES.iter().find(|pair| pair.covers(id))
}

/// Pair joining two distinct ids, if they are a primitive and its wrapper.
pub(crate) fn pair_between(a: TypeId, b: TypeId) -> Option<&'static PrimitivePair> {
    lookup(a).filter(|pair| a != b && pair.covers(b))
}

pub(crate) fn equals_or_wrapper(a: TypeId, b: TypeId) -> bool {
    a == b || pair_between(a, b).is_some()
}

fn read<P: Any + Copy>(value: &dyn Any) -> Option<Option<P>> {
    if let Some(primitive) = value.downcast_ref::<P>() {
        Some(Some(*primitive))
    } else {
        value.downcast_ref::<Option<P>>().copied()
    }
}

fn convert<P: Any + Copy>(value: &dyn Any, target: TypeId) -> Option<Box<dyn Any>> {
    let inner = read::<P>(value)?;
    if target == TypeId::of::<P>() {
        inner.map(|primitive| Box::new(primitive) as Box<dyn Any>)
    } else if target == TypeId::of::<Option<P>>() {
        Some(Box::new(inner))
    } else {
        None
    }
}

fn assign<P: Any + Copy>(slot: &mut dyn Any, value: &dyn Any) -> bool {
    let Some(inner) = read::<P>(value) else {
        return false;
    };
    if let Some(slot) = slot.downcast_mut::<P>() {
        match inner {
            Some(primitive) => {
                *slot = primitive;
                true
            }
            None => false,
        }
    } else if let Some(slot) = slot.downcast_mut::<Option<P>>() {
        *slot = inner;
        true
    } else {
        false
    }
}

fn zero<P: Any + Default>() -> Box<dyn Any> {
    Box::new(P::default())
}
