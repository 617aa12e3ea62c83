use std::fmt;
use std::sync::Arc;

type Condition<S, D> = Arc<dyn Fn(&S, &D) -> bool + Send + Sync>;
type Substitution<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

enum Kind<S, D, T> {
    MapWhen(Condition<S, D>),
    NullSubstitution(Substitution<T>),
}

/// Modifier of a single binding.
///
/// `S` and `D` are the map's source and destination types, `T` the bound
/// value type.
pub struct BindingOption<S, D, T> {
    kind: Kind<S, D, T>,
}

impl<S, D, T> BindingOption<S, D, T> {
    /// Only performs the binding when `condition` holds for the current source
    /// and destination. Conditions run in order; the first `false` skips the
    /// binding without evaluating anything else.
    pub fn map_when(condition: impl Fn(&S, &D) -> bool + Send + Sync + 'static) -> Self {
        Self {
            kind: Kind::MapWhen(Arc::new(condition)),
        }
    }

    pub fn is_null_substitution(&self) -> bool {
        matches!(self.kind, Kind::NullSubstitution(_))
    }

    pub(crate) fn condition(&self) -> Option<&Condition<S, D>> {
        match &self.kind {
            Kind::MapWhen(condition) => Some(condition),
            Kind::NullSubstitution(_) => None,
        }
    }

    pub(crate) fn substitution(&self) -> Option<&Substitution<T>> {
        match &self.kind {
            Kind::NullSubstitution(substitution) => Some(substitution),
            Kind::MapWhen(_) => None,
        }
    }
}

impl<S, D, U> BindingOption<S, D, Option<U>>
where
    U: Clone + Send + Sync + 'static,
{
    /// Uses `value` when the source yields `None`.
    pub fn with_null_substitution(value: U) -> Self {
        Self {
            kind: Kind::NullSubstitution(Arc::new(move |current: Option<U>| {
                current.or_else(|| Some(value.clone()))
            })),
        }
    }
}

impl<S, D, T> Clone for BindingOption<S, D, T> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Kind::MapWhen(condition) => Kind::MapWhen(condition.clone()),
            Kind::NullSubstitution(substitution) => Kind::NullSubstitution(substitution.clone()),
        };
        Self { kind }
    }
}

impl<S, D, T> fmt::Debug for BindingOption<S, D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::MapWhen(_) => f.write_str("BindingOption::MapWhen"),
            Kind::NullSubstitution(_) => f.write_str("BindingOption::NullSubstitution"),
        }
    }
}

/// `true` unless a map-when condition fails. Stops at the first failure.
pub(crate) fn should_be_mapped<S, D, T>(options: &[BindingOption<S, D, T>], source: &S, destination: &D) -> bool {
    options
        .iter()
        .filter_map(BindingOption::condition)
        .all(|condition| condition(source, destination))
}

/// Applies the first null substitution, if any.
pub(crate) fn substitute<S, D, T>(options: &[BindingOption<S, D, T>], value: T) -> T {
    match options.iter().find_map(BindingOption::substitution) {
        Some(substitution) => substitution(value),
        None => value,
    }
}
