//! Symbol-table construction.
//!
//! # What This Pass Does
//!
//! 1. **Seeds the global scope** - primitive types, units, built-in
//!    functions and variables from [`Predefined::global`]
//! 2. **Declaration pass** - one neuron symbol and body scope per entity;
//!    variables for every block, port and shape; methods for functions;
//!    scopes for function bodies, the update block and nested blocks
//! 3. **Reference pass** - resolves every declared type expression against
//!    the populated scopes, then flags locals shadowing state variables
//!
//! Two passes are needed because blocks of one neuron may refer to each
//! other in any order.
//!
//! # What This Pass Does NOT Do
//!
//! - **No reporting of structural errors** - duplicates and unknown types
//!   are recorded on the table; the checkers report them
//! - **No expression typing** - see [`crate::inference`]
//!
//! # Pipeline Position
//!
//! ```text
//! AST -> Builder -> Type inference -> CoCos
//!        ^^^^^^^
//!      YOU ARE HERE
//! ```

use crate::findings::{AnalysisError, FindingCode, FindingKind, FindingSink};
use crate::predefined::Predefined;
use crate::symbols::*;
use crate::types::ExprType;
use nestml_ast::{
    BlockKind, BodyElement, CompilationUnit, Declaration, Entity, Equation, FunctionDef,
    Initializer, InputPort, SignalKind, Span, StmtKind, TypeExpr,
};
use nestml_units::lookup;
use tracing::debug;

/// Checker id used for findings raised while building the table.
pub const BUILDER_ID: &str = "SymbolTableBuilder";

/// Build the symbol table for a compilation unit.
///
/// # Parameters
/// - `unit`: Parsed compilation unit
/// - `sink`: Receives the shadowing warnings
///
/// # Returns
/// - `Ok(SymbolTable)` with every declaration materialized
/// - `Err(AnalysisError::FailQuick)` only if the sink aborts
pub fn build_symbol_table(
    unit: &CompilationUnit,
    sink: &mut FindingSink<'_>,
) -> Result<SymbolTable, AnalysisError> {
    let mut builder = Builder {
        table: SymbolTable::new(),
        entity: None,
        locals: Vec::new(),
    };

    builder.seed_predefined();
    builder.table.set_enclosing(unit.id, builder.table.global());
    for entity in &unit.entities {
        builder.declare_entity(entity);
    }
    debug!(
        scopes = builder.table.scope_count(),
        symbols = builder.table.symbol_count(),
        "declaration pass complete"
    );

    builder.resolve_pending();
    builder.check_shadowing(sink)?;
    debug!(
        duplicates = builder.table.duplicates().len(),
        "reference pass complete"
    );

    Ok(builder.table)
}

struct Builder {
    table: SymbolTable,
    /// Neuron symbol of the entity being declared.
    entity: Option<SymbolId>,
    /// Local variables declared by statements, in AST order.
    locals: Vec<SymbolId>,
}

impl Builder {
    // =========================================================================
    // Declaration pass
    // =========================================================================

    fn seed_predefined(&mut self) {
        let predefined = Predefined::global();
        let global = self.table.global();

        for ty in &predefined.types {
            self.table.declare(
                global,
                &ty.name,
                Span::default(),
                None,
                SymbolData::Type(TypeSymbol {
                    ty: ty.ty,
                    is_unit: ty.is_unit,
                }),
            );
        }
        for function in &predefined.functions {
            self.table.declare(
                global,
                function.name,
                Span::default(),
                None,
                SymbolData::Method(MethodSymbol {
                    params: function.params.clone(),
                    returns: function.returns.clone(),
                    declaring_entity: None,
                    predefined: true,
                }),
            );
        }
        for variable in &predefined.variables {
            self.table.declare(
                global,
                variable.name,
                Span::default(),
                None,
                SymbolData::Variable(VariableSymbol {
                    ty: SymbolType::Known(variable.ty),
                    block: VariableBlock::Predefined,
                    is_alias: false,
                    initial_value: None,
                    declaring_entity: None,
                    predefined: true,
                }),
            );
        }
    }

    fn declare_entity(&mut self, entity: &Entity) {
        let global = self.table.global();
        self.table.set_enclosing(entity.id, global);
        let body = self.table.open_scope(global, ScopeKind::Entity, None);
        let neuron = self.table.declare(
            global,
            &entity.name.name,
            entity.name.span,
            Some(entity.id),
            SymbolData::Neuron(NeuronSymbol {
                entity_kind: entity.kind,
                body_scope: body,
                members: Vec::new(),
            }),
        );
        self.table.set_owner(body, neuron);
        self.table.set_opened(entity.id, body);
        self.entity = Some(neuron);

        for element in &entity.body {
            match element {
                BodyElement::Block(block) => {
                    self.table.set_enclosing(block.id, body);
                    let kind = match block.kind {
                        BlockKind::State => VariableBlock::State,
                        BlockKind::Parameters => VariableBlock::Parameters,
                        BlockKind::Internals => VariableBlock::Internals,
                    };
                    for decl in &block.declarations {
                        self.declare_variables(decl, body, kind);
                    }
                }
                BodyElement::Equations(eqs) => {
                    self.table.set_enclosing(eqs.id, body);
                    for eq in &eqs.equations {
                        match eq {
                            Equation::Ode(ode) => self.table.set_enclosing(ode.id, body),
                            Equation::Shape(shape) => {
                                self.table.set_enclosing(shape.id, body);
                                self.declare_variable(
                                    body,
                                    &shape.name.name,
                                    shape.name.span,
                                    shape.id,
                                    VariableSymbol {
                                        ty: SymbolType::FromDefinition,
                                        block: VariableBlock::OdeDerived,
                                        is_alias: false,
                                        initial_value: Some(shape.rhs.id),
                                        declaring_entity: self.entity,
                                        predefined: false,
                                    },
                                );
                            }
                        }
                    }
                }
                BodyElement::Input(input) => {
                    self.table.set_enclosing(input.id, body);
                    for port in &input.ports {
                        self.declare_port(port, body);
                    }
                }
                BodyElement::Output(output) => self.table.set_enclosing(output.id, body),
                BodyElement::Update(update) => {
                    self.table.set_enclosing(update.id, body);
                    let scope = self.table.open_scope(body, ScopeKind::Update, None);
                    self.table.set_opened(update.id, scope);
                    self.table.set_enclosing(update.body.id, body);
                    self.table.set_opened(update.body.id, scope);
                    self.declare_statements(&update.body.stmts, scope);
                }
                BodyElement::Function(function) => self.declare_function(function, body),
            }
        }

        let members: Vec<SymbolId> = self.table.scope(body).symbols().collect();
        if let SymbolData::Neuron(n) = &mut self.table.symbol_mut(neuron).data {
            n.members = members;
        }
        self.entity = None;
    }

    fn declare_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        span: Span,
        node: nestml_ast::NodeId,
        var: VariableSymbol,
    ) -> SymbolId {
        self.table
            .declare(scope, name, span, Some(node), SymbolData::Variable(var))
    }

    fn declare_variables(&mut self, decl: &Declaration, scope: ScopeId, block: VariableBlock) {
        self.table.set_enclosing(decl.id, scope);
        let initial_value = match &decl.initializer {
            Some(Initializer::Single(expr)) => Some(expr.id),
            _ => None,
        };
        for name in &decl.names {
            let id = self.declare_variable(
                scope,
                &name.name,
                name.span,
                decl.id,
                VariableSymbol {
                    ty: SymbolType::Pending,
                    block,
                    is_alias: decl.is_alias,
                    initial_value,
                    declaring_entity: self.entity,
                    predefined: false,
                },
            );
            self.defer(id, TypeSlot::Variable, &decl.ty);
            if block == VariableBlock::Local {
                self.locals.push(id);
            }
        }
    }

    fn declare_port(&mut self, port: &InputPort, scope: ScopeId) {
        self.table.set_enclosing(port.id, scope);
        let ty = match (&port.ty, port.signal) {
            (Some(_), _) => SymbolType::Pending,
            (None, SignalKind::Spike) => SymbolType::Known(ExprType::real()),
            (None, SignalKind::Current) => match lookup("pA") {
                Some(unit) => SymbolType::Known(ExprType::quantity(unit)),
                None => SymbolType::Unknown("pA".to_string()),
            },
        };
        let id = self.declare_variable(
            scope,
            &port.name.name,
            port.name.span,
            port.id,
            VariableSymbol {
                ty,
                block: VariableBlock::Input,
                is_alias: false,
                initial_value: None,
                declaring_entity: self.entity,
                predefined: false,
            },
        );
        if let Some(ty) = &port.ty {
            self.defer(id, TypeSlot::Variable, ty);
        }
    }

    fn declare_function(&mut self, function: &FunctionDef, body: ScopeId) {
        self.table.set_enclosing(function.id, body);
        let returns = match &function.return_type {
            Some(_) => ReturnSpec::Typed(SymbolType::Pending),
            None => ReturnSpec::Typed(SymbolType::Known(ExprType::void())),
        };
        let method = self.table.declare(
            body,
            &function.name.name,
            function.name.span,
            Some(function.id),
            SymbolData::Method(MethodSymbol {
                params: vec![ParamSpec::Typed(SymbolType::Pending); function.params.len()],
                returns,
                declaring_entity: self.entity,
                predefined: false,
            }),
        );
        for (i, param) in function.params.iter().enumerate() {
            self.defer(method, TypeSlot::Param(i), &param.ty);
        }
        if let Some(ty) = &function.return_type {
            self.defer(method, TypeSlot::Return, ty);
        }

        let scope = self
            .table
            .open_scope(body, ScopeKind::Function, Some(method));
        self.table.set_opened(function.id, scope);
        self.table.set_enclosing(function.body.id, body);
        self.table.set_opened(function.body.id, scope);

        for param in &function.params {
            self.table.set_enclosing(param.id, scope);
            let id = self.declare_variable(
                scope,
                &param.name.name,
                param.name.span,
                param.id,
                VariableSymbol {
                    ty: SymbolType::Pending,
                    block: VariableBlock::Local,
                    is_alias: false,
                    initial_value: None,
                    declaring_entity: self.entity,
                    predefined: false,
                },
            );
            self.defer(id, TypeSlot::Variable, &param.ty);
        }
        self.declare_statements(&function.body.stmts, scope);
    }

    fn declare_statements(&mut self, stmts: &[nestml_ast::Stmt], scope: ScopeId) {
        for stmt in stmts {
            self.table.set_enclosing(stmt.id, scope);
            match &stmt.kind {
                StmtKind::Declaration(decl) => {
                    self.declare_variables(decl, scope, VariableBlock::Local)
                }
                StmtKind::If(if_stmt) => {
                    for (_, block) in &if_stmt.branches {
                        self.declare_nested(block, scope);
                    }
                    if let Some(block) = &if_stmt.else_block {
                        self.declare_nested(block, scope);
                    }
                }
                StmtKind::For(for_stmt) => self.declare_nested(&for_stmt.body, scope),
                StmtKind::While { body, .. } => self.declare_nested(body, scope),
                StmtKind::Assignment(_) | StmtKind::Call(_) | StmtKind::Return(_) => {}
            }
        }
    }

    fn declare_nested(&mut self, block: &nestml_ast::Block, parent: ScopeId) {
        let scope = self.table.open_scope(parent, ScopeKind::Block, None);
        self.table.set_enclosing(block.id, parent);
        self.table.set_opened(block.id, scope);
        self.declare_statements(&block.stmts, scope);
    }

    fn defer(&mut self, symbol: SymbolId, slot: TypeSlot, ty: &TypeExpr) {
        self.table.pending.push(PendingType {
            symbol,
            slot,
            ty: ty.clone(),
        });
    }

    // =========================================================================
    // Reference pass
    // =========================================================================

    fn resolve_pending(&mut self) {
        let pending = std::mem::take(&mut self.table.pending);
        for item in pending {
            let scope = self.table.symbol(item.symbol).scope;
            let resolved = self.table.resolve_type_expr(scope, &item.ty);
            match (&mut self.table.symbol_mut(item.symbol).data, item.slot) {
                (SymbolData::Variable(var), TypeSlot::Variable) => var.ty = resolved,
                (SymbolData::Method(method), TypeSlot::Param(i)) => {
                    if let Some(param) = method.params.get_mut(i) {
                        *param = ParamSpec::Typed(resolved);
                    }
                }
                (SymbolData::Method(method), TypeSlot::Return) => {
                    method.returns = ReturnSpec::Typed(resolved);
                }
                _ => {}
            }
        }
    }

    fn check_shadowing(&self, sink: &mut FindingSink<'_>) -> Result<(), AnalysisError> {
        for local in &self.locals {
            let symbol = self.table.symbol(*local);
            let Some(entity) = self.table.entity_of(symbol.scope) else {
                continue;
            };
            let Some(body) = self.table.symbol(entity).as_neuron().map(|n| n.body_scope) else {
                continue;
            };
            let shadowed = self
                .table
                .resolve_local(body, &symbol.name, SymbolKind::Variable)
                .and_then(|id| self.table.symbol(id).as_variable())
                .is_some_and(|v| v.block == VariableBlock::State);
            if shadowed {
                sink.emit(
                    FindingKind::Warning,
                    BUILDER_ID,
                    FindingCode::ShadowedStateVariable,
                    symbol.span,
                    format!(
                        "local variable '{}' shadows the state variable of the same name",
                        symbol.name
                    ),
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use nestml_ast::{NodeRef, SourceMap};
    use nestml_parser::parse_compilation_unit;

    const MODEL: &str = "\
neuron n:
  state:
    V_m mV = -70 mV
  end
  equations:
    shape g = exp(-t / tau)
    V_m' = -V_m / tau
  end
  parameters:
    tau ms = 10 ms
  end
  input:
    spikes <- spike
    I_in <- current
  end
  update:
    x real = 1
    if x > 0:
      V_m real = 2
    end
  end
  function f(a mV, b ms) mV:
    return a
  end
end
";

    fn build(source: &str) -> (SymbolTable, crate::findings::Findings) {
        let unit = parse_compilation_unit(source, 0).unwrap();
        let sources = SourceMap::new();
        let config = AnalysisConfig::collect_all();
        let mut sink = FindingSink::new(&sources, &config);
        let table = build_symbol_table(&unit, &mut sink).unwrap();
        (table, sink.into_findings())
    }

    #[test]
    fn test_entity_scope_and_members() {
        let (table, _) = build(MODEL);
        let global = table.global();
        let neuron = table.resolve(global, "n", SymbolKind::Neuron).unwrap();
        let body = table.symbol(neuron).as_neuron().unwrap().body_scope;
        for name in ["V_m", "g", "tau", "spikes", "I_in"] {
            assert!(
                table.resolve_local(body, name, SymbolKind::Variable).is_some(),
                "{} missing",
                name
            );
        }
        assert!(table.resolve_local(body, "f", SymbolKind::Method).is_some());
        assert_eq!(table.symbol(neuron).as_neuron().unwrap().members.len(), 6);
    }

    #[test]
    fn test_reference_pass_resolves_types() {
        let (table, _) = build(MODEL);
        let neuron = table.resolve(table.global(), "n", SymbolKind::Neuron).unwrap();
        let body = table.symbol(neuron).as_neuron().unwrap().body_scope;

        let v_m = table.resolve_local(body, "V_m", SymbolKind::Variable).unwrap();
        assert_eq!(table.variable_type(v_m).unwrap().to_string(), "mV");

        let i_in = table.resolve_local(body, "I_in", SymbolKind::Variable).unwrap();
        assert_eq!(table.variable_type(i_in).unwrap().to_string(), "pA");

        let g = table.resolve_local(body, "g", SymbolKind::Variable).unwrap();
        assert_eq!(
            table.symbol(g).as_variable().unwrap().ty,
            SymbolType::FromDefinition
        );

        let f = table.resolve_local(body, "f", SymbolKind::Method).unwrap();
        let sig = table.symbol(f).as_method().unwrap();
        assert!(sig.params.iter().all(|p| matches!(p, ParamSpec::Typed(SymbolType::Known(_)))));
        assert!(matches!(sig.returns, ReturnSpec::Typed(SymbolType::Known(_))));
    }

    #[test]
    fn test_every_statement_has_a_scope() {
        let unit = parse_compilation_unit(MODEL, 0).unwrap();
        let sources = SourceMap::new();
        let config = AnalysisConfig::collect_all();
        let mut sink = FindingSink::new(&sources, &config);
        let table = build_symbol_table(&unit, &mut sink).unwrap();

        let mut missing = Vec::new();
        nestml_ast::walk_unit(&unit, &mut |node| match node {
            NodeRef::Stmt(_) | NodeRef::Declaration(_) | NodeRef::Ode(_) | NodeRef::Block(_) => {
                if table.enclosing_scope(node.id()).is_none() {
                    missing.push(node.id());
                }
            }
            _ => {}
        });
        assert!(missing.is_empty(), "nodes without scope: {:?}", missing);
    }

    #[test]
    fn test_local_shadowing_state_warns() {
        let (_, findings) = build(MODEL);
        let warnings: Vec<_> = findings.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, Some(FindingCode::ShadowedStateVariable));
        assert_eq!(warnings[0].checker, BUILDER_ID);
    }

    #[test]
    fn test_duplicates_recorded() {
        let (table, findings) = build(
            "neuron n:\n  parameters:\n    a real = 1\n    a real = 2\n  end\nend\nneuron n:\nend\n",
        );
        assert_eq!(table.duplicates().len(), 2);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_unknown_type_recorded() {
        let (table, _) = build("neuron n:\n  parameters:\n    a furlong = 1\n  end\nend\n");
        let neuron = table.resolve(table.global(), "n", SymbolKind::Neuron).unwrap();
        let body = table.symbol(neuron).as_neuron().unwrap().body_scope;
        let a = table.resolve_local(body, "a", SymbolKind::Variable).unwrap();
        assert_eq!(
            table.symbol(a).as_variable().unwrap().ty,
            SymbolType::Unknown("furlong".to_string())
        );
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let (a, _) = build(MODEL);
        let (b, _) = build(MODEL);
        assert_eq!(a.dump(), b.dump());
        assert!(a.dump().contains("variable V_m: mV [state]"));
    }
}
