use rubric_model::{MemberSlot, TypeId, TypeRef, TypeUniverse, Visibility};

/// An invokable handle bound to one concrete method or constructor found on
/// the live type. Immutable once resolved.
#[derive(Debug, Clone)]
pub struct ResolvedCallable {
    pub(crate) slot: MemberSlot,
    pub name: String,
    pub declaring: TypeId,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub is_static: bool,
    pub visibility: Visibility,
    pub throws: Vec<TypeId>,
}

impl ResolvedCallable {
    pub fn is_constructor(&self) -> bool {
        matches!(self.slot, MemberSlot::Constructor { .. })
    }

    /// `name(Type, Type)` form used in diagnostics.
    pub fn describe(&self, universe: &TypeUniverse) -> String {
        let params: Vec<String> = self.params.iter().map(|p| universe.display(p)).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// Equality is identity of the underlying declared member, not structural
/// equality of the signature.
impl PartialEq for ResolvedCallable {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl Eq for ResolvedCallable {}
