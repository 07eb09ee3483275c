//! Scope resolution.
//!
//! Lookups start at a scope and walk parent links to the global scope. The
//! first scope holding the `(name, kind)` key wins, so inner declarations
//! shadow outer ones. Sibling scopes are never searched.
//!
//! # Pipeline Position
//!
//! ```text
//! Builder -> Resolver -> Type inference -> CoCos
//!            ^^^^^^^^
//!          YOU ARE HERE
//! ```

use crate::symbols::{
    MethodSymbol, ParamSpec, ScopeId, SymbolId, SymbolKind, SymbolTable, SymbolType,
};
use crate::types::{assignability, Assignability, ExprType};
use nestml_ast::{TypeExpr, TypeExprKind, UnitExpr};
use nestml_units::{lookup, Unit};

impl SymbolTable {
    /// Resolve `(name, kind)` from `scope` outwards.
    ///
    /// # Returns
    /// The first symbol declared under the key in the nearest scope that has
    /// one, or `None` if no scope up to the root declares it.
    pub fn resolve(&self, scope: ScopeId, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(found) = self.resolve_local(id, name, kind) {
                return Some(found);
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// Resolve `(name, kind)` in `scope` only.
    pub fn resolve_local(&self, scope: ScopeId, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        self.scope(scope).get(name, kind).first().copied()
    }

    /// Overload set for `name`: the methods declared under the name in the
    /// nearest scope that declares any, minus recorded duplicates.
    pub fn method_candidates(&self, scope: ScopeId, name: &str) -> Vec<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let found = self.scope(id).get(name, SymbolKind::Method);
            if !found.is_empty() {
                return found
                    .iter()
                    .copied()
                    .filter(|m| self.is_duplicate(*m).is_none())
                    .collect();
            }
            current = self.scope(id).parent;
        }
        Vec::new()
    }

    /// Overloads of `name` taking `arity` arguments.
    pub fn methods_with_arity(&self, scope: ScopeId, name: &str, arity: usize) -> Vec<SymbolId> {
        self.method_candidates(scope, name)
            .into_iter()
            .filter(|m| self.symbol(*m).as_method().is_some_and(|sig| sig.arity() == arity))
            .collect()
    }

    /// Overloads of `name` whose signature accepts `args`.
    pub fn accepting_overloads(
        &self,
        scope: ScopeId,
        name: &str,
        args: &[ExprType],
    ) -> Vec<SymbolId> {
        self.methods_with_arity(scope, name, args.len())
            .into_iter()
            .filter(|m| {
                self.symbol(*m)
                    .as_method()
                    .is_some_and(|sig| signature_accepts(sig, args))
            })
            .collect()
    }

    /// Resolve a call by arity and argument dimensions.
    ///
    /// # Returns
    /// - `Some(method)` if exactly one overload accepts `args`
    /// - `None` if none does, or if more than one does (ambiguity)
    pub fn resolve_method(
        &self,
        scope: ScopeId,
        name: &str,
        args: &[ExprType],
    ) -> Option<SymbolId> {
        match self.accepting_overloads(scope, name, args).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Resolve a type name: a type symbol in scope, or any unit the unit
    /// table admits (prefixed names included).
    pub fn resolve_type(&self, scope: ScopeId, name: &str) -> Option<ExprType> {
        if let Some(id) = self.resolve(scope, name, SymbolKind::Type) {
            return self.symbol(id).as_type().map(|t| t.ty);
        }
        lookup(name).map(ExprType::quantity)
    }

    /// Resolve a name as a unit; primitive type names are not units.
    pub fn resolve_unit(&self, scope: ScopeId, name: &str) -> Option<Unit> {
        if let Some(id) = self.resolve(scope, name, SymbolKind::Type) {
            return self
                .symbol(id)
                .as_type()
                .filter(|t| t.is_unit)
                .map(|t| t.ty.unit);
        }
        lookup(name)
    }

    /// Evaluate a unit type expression.
    ///
    /// # Returns
    /// - `Ok(unit)` on success
    /// - `Err(name)` with the offending unit name, or the whole expression
    ///   if the algebra fails
    pub fn resolve_unit_expr(&self, scope: ScopeId, expr: &UnitExpr) -> Result<Unit, String> {
        match expr {
            UnitExpr::Name(ident) => self
                .resolve_unit(scope, &ident.name)
                .ok_or_else(|| ident.name.clone()),
            UnitExpr::One => Ok(Unit::DIMENSIONLESS),
            UnitExpr::Mul(a, b) => {
                let a = self.resolve_unit_expr(scope, a)?;
                let b = self.resolve_unit_expr(scope, b)?;
                a.delta()
                    .multiply(&b.delta())
                    .ok_or_else(|| expr.to_string())
            }
            UnitExpr::Div(a, b) => {
                let a = self.resolve_unit_expr(scope, a)?;
                let b = self.resolve_unit_expr(scope, b)?;
                a.delta()
                    .divide(&b.delta())
                    .ok_or_else(|| expr.to_string())
            }
            UnitExpr::Pow(base, exp) => self
                .resolve_unit_expr(scope, base)?
                .delta()
                .pow(*exp)
                .ok_or_else(|| expr.to_string()),
        }
    }

    /// Resolve a declared type.
    pub fn resolve_type_expr(&self, scope: ScopeId, ty: &TypeExpr) -> SymbolType {
        match &ty.kind {
            TypeExprKind::Primitive(p) => SymbolType::Known(ExprType::primitive(*p)),
            TypeExprKind::Unit(unit) => match self.resolve_unit_expr(scope, unit) {
                Ok(unit) => SymbolType::Known(ExprType::quantity(unit)),
                Err(name) => SymbolType::Unknown(name),
            },
        }
    }

    /// Declared type of a variable symbol, if it is known.
    pub fn variable_type(&self, id: SymbolId) -> Option<&ExprType> {
        self.symbol(id).as_variable().and_then(|v| v.ty.known())
    }
}

/// Whether `sig` accepts arguments of the given types (arity and SI
/// dimensions; scale differences are accepted).
pub fn signature_accepts(sig: &MethodSymbol, args: &[ExprType]) -> bool {
    if sig.arity() != args.len() {
        return false;
    }
    let mut generic: Option<&ExprType> = None;
    for (param, arg) in sig.params.iter().zip(args) {
        let ok = match param {
            ParamSpec::Any => true,
            ParamSpec::Typed(SymbolType::Known(t)) => !matches!(
                assignability(t, arg),
                Assignability::IncompatibleDimensions | Assignability::BaseMismatch
            ),
            ParamSpec::Typed(_) => true,
            ParamSpec::Generic => {
                arg.is_numeric()
                    && match generic {
                        None => {
                            generic = Some(arg);
                            true
                        }
                        Some(g) => g.unit.same_dimension(&arg.unit),
                    }
            }
        };
        if !ok {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{ReturnSpec, ScopeKind, SymbolData, VariableBlock, VariableSymbol};
    use nestml_ast::Span;

    fn var(ty: ExprType) -> SymbolData {
        SymbolData::Variable(VariableSymbol {
            ty: SymbolType::Known(ty),
            block: VariableBlock::Local,
            is_alias: false,
            initial_value: None,
            declaring_entity: None,
            predefined: false,
        })
    }

    fn method(params: Vec<ParamSpec>) -> SymbolData {
        SymbolData::Method(MethodSymbol {
            params,
            returns: ReturnSpec::Typed(SymbolType::Known(ExprType::real())),
            declaring_entity: None,
            predefined: false,
        })
    }

    fn builtin(params: Vec<ParamSpec>) -> SymbolData {
        let SymbolData::Method(mut sig) = method(params) else {
            unreachable!()
        };
        sig.predefined = true;
        SymbolData::Method(sig)
    }

    fn q(name: &str) -> ExprType {
        ExprType::quantity(lookup(name).unwrap())
    }

    #[test]
    fn test_shadowing_and_siblings() {
        let mut table = SymbolTable::new();
        let g = table.global();
        let outer = table.declare(g, "x", Span::default(), None, var(ExprType::real()));
        let a = table.open_scope(g, ScopeKind::Block, None);
        let b = table.open_scope(g, ScopeKind::Block, None);
        let inner = table.declare(a, "x", Span::default(), None, var(q("mV")));
        let only_a = table.declare(a, "y", Span::default(), None, var(q("mV")));

        assert_eq!(table.resolve(a, "x", SymbolKind::Variable), Some(inner));
        assert_eq!(table.resolve(b, "x", SymbolKind::Variable), Some(outer));
        assert_eq!(table.resolve(a, "y", SymbolKind::Variable), Some(only_a));
        assert_eq!(table.resolve(b, "y", SymbolKind::Variable), None);
        assert_eq!(table.resolve_local(b, "x", SymbolKind::Variable), None);
        assert_eq!(table.resolve(a, "x", SymbolKind::Method), None);
    }

    #[test]
    fn test_resolve_method_by_dimension() {
        let mut table = SymbolTable::new();
        let g = table.global();
        let volts = table.declare(
            g,
            "f",
            Span::default(),
            None,
            method(vec![ParamSpec::Typed(SymbolType::Known(q("mV")))]),
        );
        let _pair = table.declare(
            g,
            "f",
            Span::default(),
            None,
            method(vec![ParamSpec::Any, ParamSpec::Any]),
        );

        assert_eq!(table.resolve_method(g, "f", &[q("V")]), Some(volts));
        assert_eq!(table.resolve_method(g, "f", &[q("ms")]), None);
        assert_eq!(table.resolve_method(g, "g", &[q("ms")]), None);
        assert_eq!(table.methods_with_arity(g, "f", 1), vec![volts]);
        assert!(table.methods_with_arity(g, "f", 3).is_empty());
    }

    #[test]
    fn test_resolve_method_ambiguity() {
        let mut table = SymbolTable::new();
        let g = table.global();
        let any = table.declare(g, "h", Span::default(), None, builtin(vec![ParamSpec::Any]));
        let entity = table.open_scope(g, ScopeKind::Entity, None);
        let local = table.declare(
            entity,
            "h",
            Span::default(),
            None,
            method(vec![ParamSpec::Generic]),
        );

        // The nearest scope declaring `h` hides the global overload.
        assert_eq!(table.resolve_method(entity, "h", &[q("mV")]), Some(local));
        assert_eq!(table.resolve_method(g, "h", &[q("mV")]), Some(any));

        let generic = table.declare(
            g,
            "h",
            Span::default(),
            None,
            builtin(vec![ParamSpec::Generic]),
        );
        assert_eq!(table.accepting_overloads(g, "h", &[q("mV")]), vec![any, generic]);
        assert_eq!(table.resolve_method(g, "h", &[q("mV")]), None);
        assert_eq!(table.accepting_overloads(g, "h", &[ExprType::string()]), vec![any]);
        assert_eq!(table.resolve_method(g, "h", &[ExprType::string()]), Some(any));
    }

    #[test]
    fn test_nearest_overload_set_wins() {
        let mut table = SymbolTable::new();
        let g = table.global();
        let a = table.open_scope(g, ScopeKind::Entity, None);
        table.declare(a, "f", Span::default(), None, method(vec![ParamSpec::Generic]));
        let b = table.open_scope(a, ScopeKind::Function, None);
        let near = table.declare(b, "f", Span::default(), None, method(vec![ParamSpec::Any]));
        assert_eq!(table.method_candidates(b, "f"), vec![near]);
        assert_eq!(table.resolve_method(b, "f", &[q("mV")]), Some(near));
    }

    #[test]
    fn test_ambiguity_is_a_miss() {
        let mut table = SymbolTable::new();
        let g = table.global();
        let builtin = |params| match method(params) {
            SymbolData::Method(m) => SymbolData::Method(MethodSymbol {
                predefined: true,
                ..m
            }),
            other => other,
        };
        table.declare(g, "h", Span::default(), None, builtin(vec![ParamSpec::Generic]));
        table.declare(g, "h", Span::default(), None, builtin(vec![ParamSpec::Any]));
        assert!(table.duplicates().is_empty());
        assert_eq!(table.resolve_method(g, "h", &[q("mV")]), None);
        // Only the `Any` overload takes a boolean.
        assert!(table.resolve_method(g, "h", &[ExprType::boolean()]).is_some());
    }

    #[test]
    fn test_unit_expressions() {
        let table = SymbolTable::new();
        let g = table.global();
        let parse =
            |s: &str| nestml_parser::parse_declaration_line(&format!("x {} = 1", s)).unwrap();

        let decl = parse("nS/ms");
        let SymbolType::Known(t) = table.resolve_type_expr(g, &decl.ty) else {
            panic!("nS/ms should resolve");
        };
        assert_eq!(t.to_string(), "nS/ms");

        let decl = parse("1/s");
        assert!(matches!(table.resolve_type_expr(g, &decl.ty), SymbolType::Known(_)));

        let decl = parse("furlong");
        assert_eq!(
            table.resolve_type_expr(g, &decl.ty),
            SymbolType::Unknown("furlong".to_string())
        );
    }
}
