use rubric_model::{MemberSlot, TypeId, TypeRef, TypeUniverse, Visibility};

use crate::callable::ResolvedCallable;
use crate::error::{Failure, Verify};

/// Fluent description of the contract a method must satisfy: name,
/// visibility, static-ness, parameter shape, return type, declared
/// exceptions. Created fresh per constraint check, consumed once by
/// [`build`], never reused.
#[derive(Debug, Default, Clone)]
pub struct MethodSpec {
    name: Option<String>,
    visibility: Option<Visibility>,
    require_static: bool,
    params: Option<Vec<TypeRef>>,
    param_count: Option<usize>,
    return_type: Option<TypeRef>,
    throws: Option<Vec<TypeId>>,
    invalid: Option<String>,
}

impl MethodSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain the method name. A blank name leaves it wildcarded.
    pub fn named(mut self, name: &str) -> Self {
        let trimmed = name.trim();
        self.name = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn public(mut self) -> Self {
        self.visibility = Some(Visibility::Public);
        self
    }

    pub fn protected(mut self) -> Self {
        self.visibility = Some(Visibility::Protected);
        self
    }

    pub fn package_private(mut self) -> Self {
        self.visibility = Some(Visibility::PackagePrivate);
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Some(Visibility::Private);
        self
    }

    pub fn static_(mut self) -> Self {
        self.require_static = true;
        self
    }

    pub fn returns(mut self, return_type: TypeRef) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn with_parameters(mut self, params: Vec<TypeRef>) -> Self {
        if let Some(count) = self.param_count {
            if count != params.len() {
                self.invalid = Some(format!(
                    "number of parameters, {}, doesn't match the previously specified parameter count, {count}",
                    params.len(),
                ));
            }
        }
        self.params = Some(params);
        self
    }

    pub fn with_parameter_count(mut self, count: usize) -> Self {
        if let Some(params) = &self.params {
            if params.len() != count {
                self.invalid = Some(format!(
                    "parameter count, {count}, doesn't match the number of previously specified parameters, {}",
                    params.len(),
                ));
            }
        }
        self.param_count = Some(count);
        self
    }

    pub fn throws_exactly(mut self, exceptions: Vec<TypeId>) -> Self {
        self.throws = Some(exceptions);
        self
    }

    /// The signature this spec describes, for not-found diagnostics:
    /// `public static BigDecimal totalPrice(Item)`.
    fn signature(&self, universe: &TypeUniverse) -> String {
        let params = match (&self.params, self.param_count) {
            (Some(params), _) => {
                let rendered: Vec<String> =
                    params.iter().map(|p| universe.display(p)).collect();
                rendered.join(", ")
            }
            (None, Some(count)) if count > 0 => vec!["<?>"; count].join(", "),
            _ => String::new(),
        };
        let throws = match &self.throws {
            Some(exceptions) if !exceptions.is_empty() => {
                let rendered: Vec<String> =
                    exceptions.iter().map(|&e| universe.name_of(e)).collect();
                format!(" throws {}", rendered.join(", "))
            }
            _ => String::new(),
        };
        format!(
            "{}{}{}{}({params}){throws}",
            self.visibility.map(|v| v.signature_prefix()).unwrap_or(""),
            if self.require_static { "static " } else { "" },
            self.return_type
                .as_ref()
                .map(|r| format!("{} ", universe.display(r)))
                .unwrap_or_default(),
            self.name.as_deref().unwrap_or("*any name*"),
        )
    }

    /// Static check that a declared parameter satisfies an expected one:
    /// exact, or the expected type is a raw supertype of the declared type.
    fn param_matches(universe: &TypeUniverse, expected: &TypeRef, actual: &TypeRef) -> bool {
        if expected == actual {
            return true;
        }
        if !universe.is_assignable(actual.raw(), expected.raw()) {
            return false;
        }
        expected.args.is_empty() || expected.args == actual.args
    }
}

/// Resolve the concrete method `spec` describes on `declaring` and verify
/// every constraint, in order: existence, visibility, static-ness, return
/// type, declared exception set.
///
/// The candidate scan walks the declared members in declaration order and
/// takes the first whose name and parameter shape fit; this is a static
/// signature check, independent of any call. Return types compare by their
/// simplified textual form, so `List<Lease>` and `List<Purchase>` are
/// distinguishable.
pub(crate) fn build(
    universe: &TypeUniverse,
    declaring: TypeId,
    owner_kind: &'static str,
    spec: MethodSpec,
) -> Verify<ResolvedCallable> {
    if let Some(reason) = spec.invalid.clone() {
        return Err(Failure::InvalidSpec(reason));
    }

    let owner = universe.name_of(declaring);
    let methods = universe.declared_methods(declaring);
    let found = methods.iter().enumerate().find(|(_, m)| {
        if let Some(name) = &spec.name {
            if &m.name != name {
                return false;
            }
        }
        if let Some(count) = spec.param_count {
            if m.params.len() != count {
                return false;
            }
        }
        if let Some(params) = &spec.params {
            if params.len() != m.params.len() {
                return false;
            }
            if !params
                .iter()
                .zip(&m.params)
                .all(|(expected, actual)| MethodSpec::param_matches(universe, expected, actual))
            {
                return false;
            }
        }
        true
    });

    let Some((index, method)) = found else {
        return Err(Failure::MethodNotFound {
            kind: owner_kind,
            owner,
            signature: spec.signature(universe),
        });
    };

    if let Some(required) = spec.visibility {
        if method.visibility != required {
            return Err(Failure::VisibilityMismatch {
                owner,
                name: method.name.clone(),
                required,
            });
        }
    }

    if spec.require_static && !method.is_static {
        return Err(Failure::StaticityMismatch {
            owner,
            name: method.name.clone(),
        });
    }

    if let Some(expected) = &spec.return_type {
        let expected_display = universe.display(expected);
        let actual_display = universe.display(&method.return_type);
        if expected_display != actual_display {
            return Err(Failure::ReturnTypeMismatch {
                owner,
                name: method.name.clone(),
                expected: expected_display,
                actual: actual_display,
            });
        }
    }

    if let Some(expected) = &spec.throws {
        let mut want = expected.clone();
        let mut have = method.throws.clone();
        want.sort();
        have.sort();
        if want != have {
            let rendered: Vec<String> =
                expected.iter().map(|&e| universe.name_of(e)).collect();
            let actual = if method.throws.is_empty() {
                "doesn't throw anything".to_string()
            } else {
                let declared: Vec<String> =
                    method.throws.iter().map(|&e| universe.name_of(e)).collect();
                format!("throws `{}`", declared.join(", "))
            };
            return Err(Failure::ExceptionSetMismatch {
                owner,
                name: method.name.clone(),
                expected: rendered.join(", "),
                qualifier: if expected.len() > 1 {
                    " (in any order)"
                } else {
                    ""
                },
                actual,
            });
        }
    }

    tracing::debug!(
        target = "rubric.harness",
        owner = %owner,
        method = %method.name,
        "constraint verified"
    );

    Ok(ResolvedCallable {
        slot: MemberSlot::Method {
            owner: declaring,
            index,
        },
        name: method.name.clone(),
        declaring,
        params: method.params.clone(),
        return_type: method.return_type.clone(),
        is_static: method.is_static,
        visibility: method.visibility,
        throws: method.throws.clone(),
    })
}
