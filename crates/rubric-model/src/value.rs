use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::types::{RawType, TypeId};

/// A live heap object: its concrete runtime class plus a mutable field map.
///
/// Instances are shared by reference; two `ObjRef`s are the same object iff
/// they point at the same allocation.
pub struct Instance {
    pub class: TypeId,
    fields: RefCell<HashMap<String, Value>>,
}

pub type ObjRef = Rc<Instance>;

impl Instance {
    pub fn new(class: TypeId) -> ObjRef {
        Rc::new(Self {
            class,
            fields: RefCell::new(HashMap::new()),
        })
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.fields.borrow().get(field).cloned()
    }

    pub fn set(&self, field: &str, value: Value) {
        self.fields.borrow_mut().insert(field.to_string(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

/// Backing store of an array value; carries its element type so the runtime
/// class of the array (`String[]`) is recoverable.
#[derive(Debug)]
pub struct ArrayValue {
    pub elem: RawType,
    pub items: RefCell<Vec<Value>>,
}

/// A type-erased runtime value.
///
/// Reference forms (`Object`) compare by identity; everything else compares
/// by content.
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Decimal(f64),
    Text(String),
    List(Rc<RefCell<Vec<Value>>>),
    Array(Rc<ArrayValue>),
    Object(ObjRef),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn empty_list() -> Self {
        Value::List(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn array(elem: RawType, items: Vec<Value>) -> Self {
        Value::Array(Rc::new(ArrayValue {
            elem,
            items: RefCell::new(items),
        }))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Rc<RefCell<Vec<Value>>>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b)
                    || (a.elem == b.elem && *a.items.borrow() == *b.items.borrow())
            }
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// An exception raised by subject-under-test code: the exception's class plus
/// its message. Travels separately from the harness's own failure channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Thrown {
    pub class: TypeId,
    pub message: String,
}

impl Thrown {
    pub fn new(class: TypeId, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }
}
