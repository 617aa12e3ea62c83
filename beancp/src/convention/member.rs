//! Member metadata used by conventions.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{MappingError, MappingResult};
use crate::types::TypeDescriptor;

/// A readable and/or writable member of a type.
///
/// Conventions discover bindings by comparing the members of the source and
/// destination types; [`super::Binding`] moves values between them.
pub trait BindingSide: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Type of the value held by the member. For optional members this is the
    /// inner type.
    fn value_type(&self) -> &TypeDescriptor;

    /// Reads the member of `object`. `Ok(None)` means the member is null.
    fn get_value<'a>(&self, object: &'a dyn Any) -> MappingResult<Option<&'a dyn Any>>;

    /// Mutable access to the current value, used to map into it in place.
    fn get_value_mut<'a>(&self, _object: &'a mut dyn Any) -> MappingResult<Option<&'a mut dyn Any>> {
        Ok(None)
    }

    /// Writes the member of `object`. `None` clears it.
    fn set_value(&self, object: &mut dyn Any, value: Option<Box<dyn Any>>) -> MappingResult<()>;

    fn is_getter_available(&self) -> bool;

    fn is_setter_available(&self) -> bool;
}

/// Types whose members can be discovered by conventions.
///
/// ```rust,ignore
/// impl Bean for Customer {
///     fn members() -> Vec<Member> {
///         vec![
///             Member::field::<Customer, String>("name", |c| &c.name, |c| &mut c.name),
///             Member::optional::<Customer, String>("email", |c| &c.email, |c| &mut c.email),
///         ]
///     }
/// }
/// ```
pub trait Bean: Any {
    fn members() -> Vec<Member>;
}

trait Access: Send + Sync {
    fn get<'a>(&self, object: &'a dyn Any) -> Option<Option<&'a dyn Any>>;
    fn get_mut<'a>(&self, object: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>>;
    fn writable(&self) -> bool;
    fn set(&self, member: &str, object: &mut dyn Any, value: Option<Box<dyn Any>>) -> MappingResult<()>;
}

struct Field<T, V> {
    get: fn(&T) -> &V,
    get_mut: Option<fn(&mut T) -> &mut V>,
}

impl<T: Any, V: Any> Access for Field<T, V> {
    fn get<'a>(&self, object: &'a dyn Any) -> Option<Option<&'a dyn Any>> {
        let object = object.downcast_ref::<T>()?;
        Some(Some((self.get)(object) as &dyn Any))
    }

    fn get_mut<'a>(&self, object: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>> {
        let get_mut = self.get_mut?;
        let object = object.downcast_mut::<T>()?;
        Some(Some(get_mut(object) as &mut dyn Any))
    }

    fn writable(&self) -> bool {
        self.get_mut.is_some()
    }

    fn set(&self, member: &str, object: &mut dyn Any, value: Option<Box<dyn Any>>) -> MappingResult<()> {
        let get_mut = self
            .get_mut
            .ok_or_else(|| MappingError::SetterUnavailable(member.to_string()))?;
        let value = value.ok_or_else(|| MappingError::NullAssignment(member.to_string()))?;
        let value = value.downcast::<V>().map_err(|_| mismatch::<V>())?;
        let object = object.downcast_mut::<T>().ok_or_else(mismatch::<T>)?;
        *get_mut(object) = *value;
        Ok(())
    }
}

struct OptionalField<T, V> {
    get: fn(&T) -> &Option<V>,
    get_mut: fn(&mut T) -> &mut Option<V>,
}

impl<T: Any, V: Any> Access for OptionalField<T, V> {
    fn get<'a>(&self, object: &'a dyn Any) -> Option<Option<&'a dyn Any>> {
        let object = object.downcast_ref::<T>()?;
        Some((self.get)(object).as_ref().map(|value| value as &dyn Any))
    }

    fn get_mut<'a>(&self, object: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>> {
        let object = object.downcast_mut::<T>()?;
        Some((self.get_mut)(object).as_mut().map(|value| value as &mut dyn Any))
    }

    fn writable(&self) -> bool {
        true
    }

    fn set(&self, _member: &str, object: &mut dyn Any, value: Option<Box<dyn Any>>) -> MappingResult<()> {
        let value = match value {
            Some(value) => Some(*value.downcast::<V>().map_err(|_| mismatch::<V>())?),
            None => None,
        };
        let object = object.downcast_mut::<T>().ok_or_else(mismatch::<T>)?;
        *(self.get_mut)(object) = value;
        Ok(())
    }
}

// `Box<V>` members expose `V`, so recursive types bind like any other member.
struct BoxedField<T, V> {
    get: fn(&T) -> &Box<V>,
    get_mut: fn(&mut T) -> &mut Box<V>,
}

impl<T: Any, V: Any> Access for BoxedField<T, V> {
    fn get<'a>(&self, object: &'a dyn Any) -> Option<Option<&'a dyn Any>> {
        let object = object.downcast_ref::<T>()?;
        Some(Some(&**(self.get)(object) as &dyn Any))
    }

    fn get_mut<'a>(&self, object: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>> {
        let object = object.downcast_mut::<T>()?;
        Some(Some(&mut **(self.get_mut)(object) as &mut dyn Any))
    }

    fn writable(&self) -> bool {
        true
    }

    fn set(&self, member: &str, object: &mut dyn Any, value: Option<Box<dyn Any>>) -> MappingResult<()> {
        let value = value.ok_or_else(|| MappingError::NullAssignment(member.to_string()))?;
        let value = value.downcast::<V>().map_err(|_| mismatch::<V>())?;
        let object = object.downcast_mut::<T>().ok_or_else(mismatch::<T>)?;
        *(self.get_mut)(object) = value;
        Ok(())
    }
}

struct OptionalBoxedField<T, V> {
    get: fn(&T) -> &Option<Box<V>>,
    get_mut: fn(&mut T) -> &mut Option<Box<V>>,
}

impl<T: Any, V: Any> Access for OptionalBoxedField<T, V> {
    fn get<'a>(&self, object: &'a dyn Any) -> Option<Option<&'a dyn Any>> {
        let object = object.downcast_ref::<T>()?;
        Some((self.get)(object).as_deref().map(|value| value as &dyn Any))
    }

    fn get_mut<'a>(&self, object: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>> {
        let object = object.downcast_mut::<T>()?;
        Some((self.get_mut)(object).as_deref_mut().map(|value| value as &mut dyn Any))
    }

    fn writable(&self) -> bool {
        true
    }

    fn set(&self, _member: &str, object: &mut dyn Any, value: Option<Box<dyn Any>>) -> MappingResult<()> {
        let value = match value {
            Some(value) => Some(value.downcast::<V>().map_err(|_| mismatch::<V>())?),
            None => None,
        };
        let object = object.downcast_mut::<T>().ok_or_else(mismatch::<T>)?;
        *(self.get_mut)(object) = value;
        Ok(())
    }
}

fn mismatch<T: Any>() -> MappingError {
    MappingError::TypeMismatch {
        expected: std::any::type_name::<T>(),
        actual: crate::types::UNREGISTERED,
    }
}

/// A member backed by accessor functions.
#[derive(Clone)]
pub struct Member {
    name: String,
    owner: TypeDescriptor,
    value_type: TypeDescriptor,
    nullable: bool,
    access: Arc<dyn Access>,
}

impl Member {
    /// A plain `V` field, readable and writable.
    pub fn field<T, V>(name: &str, get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self
    where
        T: Any,
        V: Any + Clone + Default,
    {
        Self::new::<T, V>(
            name,
            false,
            Arc::new(Field {
                get,
                get_mut: Some(get_mut),
            }),
        )
    }

    /// An `Option<V>` field. The value type is `V` and null clears the field.
    pub fn optional<T, V>(
        name: &str,
        get: fn(&T) -> &Option<V>,
        get_mut: fn(&mut T) -> &mut Option<V>,
    ) -> Self
    where
        T: Any,
        V: Any + Clone + Default,
    {
        Self::new::<T, V>(name, true, Arc::new(OptionalField { get, get_mut }))
    }

    /// A `Box<V>` field. The value type is `V`.
    pub fn boxed<T, V>(name: &str, get: fn(&T) -> &Box<V>, get_mut: fn(&mut T) -> &mut Box<V>) -> Self
    where
        T: Any,
        V: Any + Clone + Default,
    {
        Self::new::<T, V>(name, false, Arc::new(BoxedField { get, get_mut }))
    }

    /// An `Option<Box<V>>` field, the usual shape of a recursive member.
    pub fn optional_boxed<T, V>(
        name: &str,
        get: fn(&T) -> &Option<Box<V>>,
        get_mut: fn(&mut T) -> &mut Option<Box<V>>,
    ) -> Self
    where
        T: Any,
        V: Any + Clone + Default,
    {
        Self::new::<T, V>(name, true, Arc::new(OptionalBoxedField { get, get_mut }))
    }

    /// A `V` member that can only be read.
    pub fn read_only<T, V>(name: &str, get: fn(&T) -> &V) -> Self
    where
        T: Any,
        V: Any + Clone + Default,
    {
        Self::new::<T, V>(name, false, Arc::new(Field { get, get_mut: None }))
    }

    fn new<T: Any, V: Any + Clone + Default>(name: &str, nullable: bool, access: Arc<dyn Access>) -> Self {
        Self {
            name: name.to_string(),
            owner: TypeDescriptor::of::<T>(),
            value_type: TypeDescriptor::value::<V>(),
            nullable,
            access,
        }
    }

    pub fn owner(&self) -> &TypeDescriptor {
        &self.owner
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn wrong_owner(&self, object: &dyn Any) -> MappingError {
        MappingError::TypeMismatch {
            expected: self.owner.name(),
            actual: if object.type_id() == self.owner.id() {
                self.owner.name()
            } else {
                crate::types::UNREGISTERED
            },
        }
    }
}

impl BindingSide for Member {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> &TypeDescriptor {
        &self.value_type
    }

    fn get_value<'a>(&self, object: &'a dyn Any) -> MappingResult<Option<&'a dyn Any>> {
        self.access
            .get(object)
            .ok_or_else(|| self.wrong_owner(object))
    }

    fn get_value_mut<'a>(&self, object: &'a mut dyn Any) -> MappingResult<Option<&'a mut dyn Any>> {
        if !self.access.writable() {
            return Ok(None);
        }
        if (*object).type_id() != self.owner.id() {
            return Err(self.wrong_owner(object));
        }
        Ok(self.access.get_mut(object).flatten())
    }

    fn set_value(&self, object: &mut dyn Any, value: Option<Box<dyn Any>>) -> MappingResult<()> {
        self.access.set(&self.name, object, value)
    }

    fn is_getter_available(&self) -> bool {
        true
    }

    fn is_setter_available(&self) -> bool {
        self.access.writable()
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("value_type", &self.value_type)
            .field("nullable", &self.nullable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone)]
    struct Contact {
        name: String,
        email: Option<String>,
        id: u64,
    }

    fn name() -> Member {
        Member::field::<Contact, String>("name", |c| &c.name, |c| &mut c.name)
    }

    fn email() -> Member {
        Member::optional::<Contact, String>("email", |c| &c.email, |c| &mut c.email)
    }

    fn id() -> Member {
        Member::read_only::<Contact, u64>("id", |c| &c.id)
    }

    #[test]
    fn test_field_get_set() {
        let mut contact = Contact::default();
        name()
            .set_value(&mut contact, Some(Box::new("Ada".to_string())))
            .unwrap();
        assert_eq!(contact.name, "Ada");

        let value = name().get_value(&contact).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "Ada");
        assert_eq!(name().value_type(), &TypeDescriptor::of::<String>());
    }

    #[test]
    fn test_field_rejects_null_and_wrong_type() {
        let mut contact = Contact::default();
        let err = name().set_value(&mut contact, None).unwrap_err();
        assert!(matches!(err, MappingError::NullAssignment(ref member) if member == "name"));

        let err = name().set_value(&mut contact, Some(Box::new(5_u8))).unwrap_err();
        assert!(matches!(err, MappingError::TypeMismatch { .. }));
    }

    #[test]
    fn test_optional_member() {
        let mut contact = Contact::default();
        assert!(email().is_nullable());
        assert!(email().get_value(&contact).unwrap().is_none());

        email()
            .set_value(&mut contact, Some(Box::new("ada@example.org".to_string())))
            .unwrap();
        assert_eq!(contact.email.as_deref(), Some("ada@example.org"));

        email().set_value(&mut contact, None).unwrap();
        assert!(contact.email.is_none());
    }

    #[test]
    fn test_read_only_member() {
        let mut contact = Contact {
            id: 42,
            ..Default::default()
        };
        assert!(!id().is_setter_available());
        assert!(id().get_value_mut(&mut contact).unwrap().is_none());

        let err = id().set_value(&mut contact, Some(Box::new(1_u64))).unwrap_err();
        assert!(matches!(err, MappingError::SetterUnavailable(_)));
        assert_eq!(contact.id, 42);
    }

    #[derive(Debug, Default, Clone)]
    struct Chain {
        label: String,
        head: Box<Chain2>,
        next: Option<Box<Chain>>,
    }

    #[derive(Debug, Default, Clone)]
    struct Chain2 {
        depth: u8,
    }

    #[test]
    fn test_boxed_members_expose_inner_value() {
        let head = Member::boxed::<Chain, Chain2>("head", |c| &c.head, |c| &mut c.head);
        let next = Member::optional_boxed::<Chain, Chain>("next", |c| &c.next, |c| &mut c.next);
        assert_eq!(head.value_type(), &TypeDescriptor::of::<Chain2>());
        assert_eq!(next.value_type(), &TypeDescriptor::of::<Chain>());
        assert!(next.is_nullable());

        let mut chain = Chain::default();
        assert!(next.get_value(&chain).unwrap().is_none());
        next.set_value(
            &mut chain,
            Some(Box::new(Chain {
                label: "tail".into(),
                ..Default::default()
            })),
        )
        .unwrap();
        let tail = next.get_value(&chain).unwrap().unwrap();
        assert_eq!(tail.downcast_ref::<Chain>().unwrap().label, "tail");

        let inner = next.get_value_mut(&mut chain).unwrap().unwrap();
        inner.downcast_mut::<Chain>().unwrap().label = "changed".into();
        assert_eq!(chain.next.as_ref().unwrap().label, "changed");

        head.set_value(&mut chain, Some(Box::new(Chain2 { depth: 3 }))).unwrap();
        assert_eq!(chain.head.depth, 3);
        assert!(matches!(
            head.set_value(&mut chain, None).unwrap_err(),
            MappingError::NullAssignment(_)
        ));

        next.set_value(&mut chain, None).unwrap();
        assert!(chain.next.is_none());
    }

    #[test]
    fn test_wrong_owner() {
        let err = name().get_value(&7_i32).unwrap_err();
        assert!(matches!(err, MappingError::TypeMismatch { .. }));
    }
}
