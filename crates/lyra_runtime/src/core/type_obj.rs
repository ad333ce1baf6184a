//! Class objects and method resolution order.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::value::{DictKey, DictStorage, Value, dict_new};
use crate::errors::{RunResult, type_error};

/// A first-class class object.
///
/// `mro` and `class` (the metaclass) are assigned right after construction
/// because both need the `Rc` of the object itself.
#[derive(Debug)]
pub struct TypeObject {
    pub name: String,
    pub bases: Vec<Rc<TypeObject>>,
    pub mro: RefCell<Vec<Rc<TypeObject>>>,
    pub namespace: RefCell<DictStorage>,
    pub class: RefCell<Option<Rc<TypeObject>>>,
}

impl TypeObject {
    /// Build a class with a C3-linearized MRO over `bases`.
    pub fn new_rc(
        name: impl Into<String>,
        bases: Vec<Rc<TypeObject>>,
        namespace: DictStorage,
    ) -> RunResult<Rc<TypeObject>> {
        let ty = Rc::new(TypeObject {
            name: name.into(),
            bases,
            mro: RefCell::new(Vec::new()),
            namespace: RefCell::new(namespace),
            class: RefCell::new(None),
        });
        let mro = c3_linearize(&ty)?;
        *ty.mro.borrow_mut() = mro;
        Ok(ty)
    }

    /// Root object type: no bases, MRO of itself only.
    pub fn new_root(name: impl Into<String>) -> Rc<TypeObject> {
        let ty = Rc::new(TypeObject {
            name: name.into(),
            bases: Vec::new(),
            mro: RefCell::new(Vec::new()),
            namespace: RefCell::new(dict_new()),
            class: RefCell::new(None),
        });
        *ty.mro.borrow_mut() = vec![ty.clone()];
        ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// MRO attribute lookup.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let key = DictKey::from_str(name);
        for ty in self.mro.borrow().iter() {
            if let Some(v) = ty.namespace.borrow().get(&key) {
                return Some(v.clone());
            }
        }
        None
    }

    pub fn set_attr(&self, name: &str, value: Value) {
        self.namespace
            .borrow_mut()
            .insert(DictKey::from_str(name), value);
    }

    pub fn metaclass(&self) -> Option<Rc<TypeObject>> {
        self.class.borrow().clone()
    }
}

pub fn same_type(a: &Rc<TypeObject>, b: &Rc<TypeObject>) -> bool {
    Rc::ptr_eq(a, b)
}

/// `a` is `b` or derives from it.
pub fn is_subtype(a: &Rc<TypeObject>, b: &Rc<TypeObject>) -> bool {
    a.mro.borrow().iter().any(|t| Rc::ptr_eq(t, b))
}

/// C3 linearization: `C + merge(mro(B1), ..., mro(Bn), [B1, ..., Bn])`.
fn c3_linearize(ty: &Rc<TypeObject>) -> RunResult<Vec<Rc<TypeObject>>> {
    let mut sequences: Vec<Vec<Rc<TypeObject>>> = ty
        .bases
        .iter()
        .map(|b| b.mro.borrow().clone())
        .collect();
    sequences.push(ty.bases.clone());

    let mut result = vec![ty.clone()];
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Ok(result);
        }
        // A head is good when it appears in no other sequence's tail.
        let mut chosen = None;
        for seq in &sequences {
            let head = &seq[0];
            let in_tail = sequences
                .iter()
                .any(|s| s[1..].iter().any(|t| Rc::ptr_eq(t, head)));
            if !in_tail {
                chosen = Some(head.clone());
                break;
            }
        }
        let head = chosen.ok_or_else(|| {
            type_error(format!(
                "Cannot create a consistent method resolution order (MRO) for bases of {}",
                ty.name
            ))
        })?;
        result.push(head.clone());
        for seq in &mut sequences {
            seq.retain(|t| !Rc::ptr_eq(t, &head));
        }
    }
}

/// A class instance: fixed class plus an attribute dict.
pub struct InstanceObject {
    pub class: Rc<TypeObject>,
    pub dict: RefCell<DictStorage>,
}

impl InstanceObject {
    pub fn new(class: Rc<TypeObject>) -> Rc<InstanceObject> {
        Rc::new(InstanceObject {
            class,
            dict: RefCell::new(dict_new()),
        })
    }

    pub fn get_attr(&self, name: &str) -> Option<Value> {
        let key = DictKey::from_str(name);
        if let Some(v) = self.dict.borrow().get(&key) {
            return Some(v.clone());
        }
        self.class.lookup(name)
    }

    pub fn set_attr(&self, name: &str, value: Value) {
        self.dict
            .borrow_mut()
            .insert(DictKey::from_str(name), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(name: &str, bases: Vec<Rc<TypeObject>>) -> Rc<TypeObject> {
        TypeObject::new_rc(name, bases, dict_new()).unwrap()
    }

    #[test]
    fn diamond_linearizes() {
        let object = TypeObject::new_root("object");
        let a = mk("A", vec![object.clone()]);
        let b = mk("B", vec![a.clone()]);
        let c = mk("C", vec![a.clone()]);
        let d = mk("D", vec![b.clone(), c.clone()]);
        let names: Vec<String> = d.mro.borrow().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, ["D", "B", "C", "A", "object"]);
    }

    #[test]
    fn inconsistent_mro_is_rejected() {
        let object = TypeObject::new_root("object");
        let a = mk("A", vec![object.clone()]);
        let b = mk("B", vec![a.clone()]);
        // bases ordered so A precedes B, but B's MRO needs B before A
        let err = TypeObject::new_rc("X", vec![a, b], dict_new()).unwrap_err();
        assert!(err.message.contains("consistent method resolution order"));
    }

    #[test]
    fn subtype_includes_self_and_ancestors() {
        let object = TypeObject::new_root("object");
        let a = mk("A", vec![object.clone()]);
        let b = mk("B", vec![a.clone()]);
        assert!(is_subtype(&b, &b));
        assert!(is_subtype(&b, &a));
        assert!(is_subtype(&b, &object));
        assert!(!is_subtype(&a, &b));
    }
}
