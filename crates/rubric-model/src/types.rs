use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::universe::TypeUniverse;
use crate::value::{ObjRef, Thrown, Value};

/// Index into a [`TypeUniverse`]'s type table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Primitive,
}

impl TypeKind {
    /// Article + noun form used in diagnostics ("a class", "an interface").
    pub fn describe(self) -> &'static str {
        match self {
            TypeKind::Class => "a class",
            TypeKind::Interface => "an interface",
            TypeKind::Primitive => "a primitive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    PackagePrivate,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::PackagePrivate => "package private",
            Visibility::Private => "private",
        }
    }

    /// Prefix emitted in signature strings; package-private has no keyword.
    pub fn signature_prefix(self) -> &'static str {
        match self {
            Visibility::Public => "public ",
            Visibility::Protected => "protected ",
            Visibility::PackagePrivate => "",
            Visibility::Private => "private ",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type reference as it appears in a declaration: a raw type, optionally
/// parameterized (`List<Item>`), optionally an array (`String[]`).
///
/// Generic arguments are display-level only: assignability and overload
/// scoring operate on the raw `(id, dims)` pair, mirroring erasure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub id: TypeId,
    pub args: Vec<TypeRef>,
    pub dims: u8,
}

impl TypeRef {
    pub fn new(id: TypeId) -> Self {
        Self {
            id,
            args: Vec::new(),
            dims: 0,
        }
    }

    pub fn generic(id: TypeId, args: Vec<TypeRef>) -> Self {
        Self { id, args, dims: 0 }
    }

    pub fn array_of(mut self) -> Self {
        self.dims += 1;
        self
    }

    pub fn raw(&self) -> RawType {
        RawType {
            id: self.id,
            dims: self.dims,
        }
    }
}

/// An erased runtime type: the raw class plus array depth. This is what
/// overload scoring and assignability compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawType {
    pub id: TypeId,
    pub dims: u8,
}

impl RawType {
    pub fn of(id: TypeId) -> Self {
        Self { id, dims: 0 }
    }

    /// The element type of an array reference.
    ///
    /// # Panics
    ///
    /// Panics if `dims == 0`.
    pub fn element(self) -> Self {
        Self {
            id: self.id,
            dims: self
                .dims
                .checked_sub(1)
                .expect("element() on a non-array type"),
        }
    }
}

/// A native method or constructor body. Receives the universe (for re-entrant
/// dispatch), the receiver (`None` for statics and unbound calls) and the
/// argument values; returns a value or a subject-raised exception.
pub type NativeFn = Rc<dyn Fn(&TypeUniverse, Option<&ObjRef>, &[Value]) -> Result<Value, Thrown>>;

#[derive(Clone)]
pub struct MethodDef {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub throws: Vec<TypeId>,
    pub body: Option<NativeFn>,
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("is_abstract", &self.is_abstract)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

impl MethodDef {
    /// A public, non-static method with no declared exceptions and no body.
    pub fn new(name: impl Into<String>, params: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            is_abstract: false,
            params,
            return_type,
            throws: Vec::new(),
            body: None,
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn throws(mut self, exceptions: Vec<TypeId>) -> Self {
        self.throws = exceptions;
        self
    }

    pub fn body(
        mut self,
        f: impl Fn(&TypeUniverse, Option<&ObjRef>, &[Value]) -> Result<Value, Thrown> + 'static,
    ) -> Self {
        self.body = Some(Rc::new(f));
        self
    }
}

#[derive(Clone)]
pub struct ConstructorDef {
    pub visibility: Visibility,
    pub params: Vec<TypeRef>,
    pub throws: Vec<TypeId>,
    pub body: NativeFn,
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("visibility", &self.visibility)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl ConstructorDef {
    pub fn new(
        params: Vec<TypeRef>,
        body: impl Fn(&TypeUniverse, Option<&ObjRef>, &[Value]) -> Result<Value, Thrown> + 'static,
    ) -> Self {
        Self {
            visibility: Visibility::Public,
            params,
            throws: Vec::new(),
            body: Rc::new(body),
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub ty: TypeRef,
}

#[derive(Clone, Debug)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub is_abstract: bool,
    pub superclass: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
    pub constructors: Vec<ConstructorDef>,
}

/// Slot of a declared member inside the universe's tables. Two resolved
/// callables are the same member iff their slots are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberSlot {
    Method { owner: TypeId, index: usize },
    Constructor { owner: TypeId, index: usize },
}

impl MemberSlot {
    pub fn owner(self) -> TypeId {
        match self {
            MemberSlot::Method { owner, .. } | MemberSlot::Constructor { owner, .. } => owner,
        }
    }
}