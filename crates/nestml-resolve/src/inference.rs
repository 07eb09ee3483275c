//! Type and unit inference.
//!
//! Assigns a [`TypeRecord`] to every expression node of a compilation unit.
//! Problems found on the way (unresolved names, operator and call
//! violations) are not reported here; they are attached to the node where
//! they arise as [`TypeIssue`]s and emitted later by the expression checker,
//! so the finding order stays under the runner's control.
//!
//! # Error Records
//!
//! A node whose own rule fails, or whose operand already failed, gets
//! [`TypeRecord::Error`]. Rules seeing an error operand return an error
//! record silently, so one mistake yields one finding.
//!
//! # Pipeline Position
//!
//! ```text
//! Builder -> Type inference -> CoCos
//!            ^^^^^^^^^^^^^^
//!            YOU ARE HERE
//! ```

use crate::findings::{AnalysisError, FindingCode, FindingKind};
use crate::predefined::millis;
use crate::symbols::{ParamSpec, ReturnSpec, ScopeId, SymbolId, SymbolKind, SymbolTable, SymbolType};
use crate::types::{assignability, Assignability, BaseType, ExprType, TypeRecord};
use nestml_ast::{
    walk_unit, BinaryOp, CompilationUnit, Equation, Expr, ExprKind, NodeId, NodeRef, Span,
    StmtKind, UnaryOp,
};
use nestml_units::{Conversion, Unit};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// A problem found while typing one expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeIssue {
    pub kind: FindingKind,
    pub code: FindingCode,
    pub message: String,
    pub span: Span,
}

/// Inference results for one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct ExprTypes {
    records: HashMap<NodeId, TypeRecord>,
    issues: HashMap<NodeId, Vec<TypeIssue>>,
    /// Types of shape variables, taken from their defining expression.
    derived: HashMap<SymbolId, TypeRecord>,
}

impl ExprTypes {
    pub fn get(&self, id: NodeId) -> Option<&TypeRecord> {
        self.records.get(&id)
    }

    /// Record of `expr`; a node that was never typed counts as an error.
    pub fn of(&self, expr: &Expr) -> TypeRecord {
        self.records.get(&expr.id).copied().unwrap_or(TypeRecord::Error)
    }

    pub fn valid(&self, expr: &Expr) -> Option<ExprType> {
        self.of(expr).valid().copied()
    }

    /// Issues attached to a node, in the order they were found.
    pub fn issues(&self, id: NodeId) -> &[TypeIssue] {
        self.issues.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn issue_count(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn derived_type(&self, symbol: SymbolId) -> Option<&TypeRecord> {
        self.derived.get(&symbol)
    }
}

/// Type every expression of `unit`.
///
/// # Returns
/// - `Ok(ExprTypes)` with a record for every expression node
/// - `Err(AnalysisError::Internal)` if an expression has no enclosing
///   scope or was left untyped
pub fn infer_types(
    unit: &CompilationUnit,
    table: &SymbolTable,
) -> Result<ExprTypes, AnalysisError> {
    let mut roots: Vec<(&Expr, NodeId)> = Vec::new();
    let mut shape_defs: Vec<(NodeId, &Expr)> = Vec::new();

    walk_unit(unit, &mut |node| match node {
        NodeRef::Declaration(decl) => {
            if let Some(init) = &decl.initializer {
                roots.extend(init.exprs().into_iter().map(|e| (e, decl.id)));
            }
            if let Some(guard) = &decl.guard {
                roots.push((guard, decl.id));
            }
        }
        NodeRef::Equations(eqs) => {
            for eq in &eqs.equations {
                match eq {
                    Equation::Ode(ode) => roots.push((&ode.rhs, ode.id)),
                    Equation::Shape(shape) => {
                        roots.push((&shape.rhs, shape.id));
                        shape_defs.push((shape.id, &shape.rhs));
                    }
                }
            }
        }
        NodeRef::Stmt(stmt) => match &stmt.kind {
            StmtKind::Assignment(a) => roots.push((&a.value, stmt.id)),
            StmtKind::Call(call) => roots.push((call, stmt.id)),
            StmtKind::Return(Some(value)) => roots.push((value, stmt.id)),
            StmtKind::If(if_stmt) => {
                roots.extend(if_stmt.branches.iter().map(|(cond, _)| (cond, stmt.id)))
            }
            StmtKind::For(f) => {
                roots.push((&f.from, stmt.id));
                roots.push((&f.to, stmt.id));
                if let Some(step) = &f.step {
                    roots.push((step, stmt.id));
                }
            }
            StmtKind::While { condition, .. } => roots.push((condition, stmt.id)),
            StmtKind::Return(None) | StmtKind::Declaration(_) => {}
        },
        _ => {}
    });

    let mut inference = Inference {
        table,
        shapes: HashMap::new(),
        in_progress: HashSet::new(),
        out: ExprTypes::default(),
    };

    for (node, rhs) in shape_defs {
        let scope = scope_of(table, node)?;
        if let Some(symbol) = table.symbols_of(node).first() {
            inference.shapes.insert(*symbol, (rhs, scope));
        }
    }

    for &(expr, holder) in &roots {
        let scope = scope_of(table, holder)?;
        trace!(root = %expr.id, holder = %holder, "inferring expression");
        inference.infer(expr, scope);
    }

    let out = inference.out;
    let mut untyped = None;
    walk_unit(unit, &mut |node| {
        if let NodeRef::Expr(expr) = node {
            if untyped.is_none() && !out.records.contains_key(&expr.id) {
                untyped = Some(expr.id);
            }
        }
    });
    if let Some(id) = untyped {
        return Err(AnalysisError::Internal(format!(
            "expression {} was left without a type record",
            id
        )));
    }

    debug!(
        roots = roots.len(),
        records = out.len(),
        issues = out.issue_count(),
        "type inference complete"
    );
    Ok(out)
}

fn scope_of(table: &SymbolTable, node: NodeId) -> Result<ScopeId, AnalysisError> {
    table
        .enclosing_scope(node)
        .ok_or_else(|| AnalysisError::Internal(format!("node {} has no enclosing scope", node)))
}

// =============================================================================
// Rules
// =============================================================================

/// Which additive-style rule a pair of operands is checked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Additive {
    Add,
    Sub,
    /// The two branches of `?:`.
    Branches,
}

struct Inference<'a> {
    table: &'a SymbolTable,
    shapes: HashMap<SymbolId, (&'a Expr, ScopeId)>,
    in_progress: HashSet<SymbolId>,
    out: ExprTypes,
}

impl<'a> Inference<'a> {
    fn infer(&mut self, expr: &'a Expr, scope: ScopeId) -> TypeRecord {
        if let Some(record) = self.out.records.get(&expr.id) {
            return *record;
        }
        let record = self.infer_node(expr, scope);
        self.out.records.insert(expr.id, record);
        record
    }

    fn infer_node(&mut self, expr: &'a Expr, scope: ScopeId) -> TypeRecord {
        match &expr.kind {
            ExprKind::IntLiteral(v) => TypeRecord::Valid(ExprType::integer().with_value(*v as f64)),
            ExprKind::RealLiteral(v) => TypeRecord::Valid(ExprType::real().with_value(*v)),
            ExprKind::BoolLiteral(_) => TypeRecord::Valid(ExprType::boolean()),
            ExprKind::StringLiteral(_) => TypeRecord::Valid(ExprType::string()),
            ExprKind::Quantity { value, unit, .. } => {
                match self.table.resolve_unit(scope, &unit.name) {
                    Some(u) => TypeRecord::Valid(ExprType::quantity(u).with_value(*value)),
                    None => self.fail(
                        expr,
                        FindingCode::UnknownUnit,
                        format!("unknown unit '{}'", unit.name),
                    ),
                }
            }
            ExprKind::Name(name) => self.infer_name(expr, name, scope),
            ExprKind::Paren(inner) => self.infer(inner, scope),
            ExprKind::Unary { op, operand } => {
                let operand = self.infer(operand, scope);
                self.infer_unary(expr, *op, operand)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.infer(lhs, scope);
                let rhs = self.infer(rhs, scope);
                match (lhs, rhs) {
                    (TypeRecord::Valid(l), TypeRecord::Valid(r)) => {
                        self.infer_binary(expr, *op, l, r)
                    }
                    _ => TypeRecord::Error,
                }
            }
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.infer(condition, scope);
                let then_t = self.infer(then_branch, scope);
                let else_t = self.infer(else_branch, scope);
                if let TypeRecord::Valid(c) = cond {
                    if !c.is_boolean() {
                        return self.fail(
                            expr,
                            FindingCode::TypeMismatch,
                            format!("the condition of '?:' must be boolean, got {}", c),
                        );
                    }
                }
                match (cond, then_t, else_t) {
                    (TypeRecord::Valid(_), TypeRecord::Valid(a), TypeRecord::Valid(b)) => {
                        self.additive(expr, Additive::Branches, a, b)
                    }
                    _ => TypeRecord::Error,
                }
            }
            ExprKind::Call { callee, args } => {
                let args: Vec<TypeRecord> = args.iter().map(|a| self.infer(a, scope)).collect();
                self.infer_call(expr, &callee.name, &args, scope)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Names
    // -------------------------------------------------------------------------

    fn infer_name(&mut self, expr: &Expr, name: &str, scope: ScopeId) -> TypeRecord {
        if let Some(id) = self.table.resolve(scope, name, SymbolKind::Variable) {
            return self.variable_record(expr, id);
        }

        let base = name.trim_end_matches('\'');
        let order = name.len() - base.len();
        if order > 0 {
            if let Some(id) = self.table.resolve(scope, base, SymbolKind::Variable) {
                return match self.variable_record(expr, id) {
                    TypeRecord::Valid(t) if t.is_numeric() => derivative(&t, order)
                        .map(|u| TypeRecord::Valid(ExprType::quantity(u)))
                        .unwrap_or(TypeRecord::Error),
                    TypeRecord::Valid(t) => self.fail(
                        expr,
                        FindingCode::TypeMismatch,
                        format!("cannot differentiate '{}' of type {}", base, t),
                    ),
                    TypeRecord::Error => TypeRecord::Error,
                };
            }
        }

        if let Some(unit) = self.table.resolve_unit(scope, name) {
            return TypeRecord::Valid(ExprType::quantity(unit).with_value(1.0));
        }

        self.fail(
            expr,
            FindingCode::UnresolvedVariable,
            format!("cannot resolve the variable '{}'", name),
        )
    }

    fn variable_record(&mut self, expr: &Expr, id: SymbolId) -> TypeRecord {
        let Some(var) = self.table.symbol(id).as_variable() else {
            return TypeRecord::Error;
        };
        match &var.ty {
            SymbolType::Known(t) => TypeRecord::Valid(t.non_constant()),
            SymbolType::FromDefinition => self.shape_record(expr, id),
            // Unresolved declared types are reported at the declaration.
            SymbolType::Pending | SymbolType::Unknown(_) => TypeRecord::Error,
        }
    }

    fn shape_record(&mut self, expr: &Expr, id: SymbolId) -> TypeRecord {
        if let Some(record) = self.out.derived.get(&id) {
            return *record;
        }
        if self.in_progress.contains(&id) {
            let name = self.table.symbol(id).name.clone();
            return self.fail(
                expr,
                FindingCode::TypeMismatch,
                format!("the definition of '{}' refers to itself", name),
            );
        }
        let Some((rhs, scope)) = self.shapes.get(&id).copied() else {
            return TypeRecord::Error;
        };
        self.in_progress.insert(id);
        let record = match self.infer(rhs, scope) {
            TypeRecord::Valid(t) => TypeRecord::Valid(t.non_constant()),
            TypeRecord::Error => TypeRecord::Error,
        };
        self.in_progress.remove(&id);
        self.out.derived.insert(id, record);
        record
    }

    // -------------------------------------------------------------------------
    // Operators
    // -------------------------------------------------------------------------

    fn infer_unary(&mut self, expr: &Expr, op: UnaryOp, operand: TypeRecord) -> TypeRecord {
        let TypeRecord::Valid(t) = operand else {
            return TypeRecord::Error;
        };
        match op {
            UnaryOp::Neg | UnaryOp::Plus if t.is_numeric() => {
                let mut out = t;
                if op == UnaryOp::Neg {
                    out.value = t.value.map(|v| -v);
                }
                TypeRecord::Valid(out)
            }
            UnaryOp::Not if t.is_boolean() => TypeRecord::Valid(t),
            _ => self.fail(
                expr,
                FindingCode::TypeMismatch,
                format!("cannot apply unary '{}' to {}", op.symbol(), t),
            ),
        }
    }

    fn infer_binary(&mut self, expr: &Expr, op: BinaryOp, l: ExprType, r: ExprType) -> TypeRecord {
        match op {
            BinaryOp::Add => self.additive(expr, Additive::Add, l, r),
            BinaryOp::Sub => self.additive(expr, Additive::Sub, l, r),
            BinaryOp::Mul | BinaryOp::Div => self.multiplicative(expr, op, l, r),
            BinaryOp::Mod => {
                if !l.is_numeric() || !r.is_numeric() {
                    return self.operand_mismatch(expr, op, &l, &r);
                }
                if !l.unit.same_dimension(&r.unit) {
                    return self.fail(
                        expr,
                        FindingCode::IncompatibleDimensions,
                        format!("cannot take {} modulo {}", l, r),
                    );
                }
                let out = ExprType {
                    base: numeric_base(&l, &r),
                    ..l
                };
                TypeRecord::Valid(folded(out, fold(&l, &r, |a, b| a % b)))
            }
            BinaryOp::Pow => self.power(expr, l, r),
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => self.comparison(expr, op, l, r),
            BinaryOp::And | BinaryOp::Or => {
                if l.is_boolean() && r.is_boolean() {
                    TypeRecord::Valid(ExprType::boolean())
                } else {
                    self.operand_mismatch(expr, op, &l, &r)
                }
            }
        }
    }

    fn additive(&mut self, expr: &Expr, rule: Additive, l: ExprType, r: ExprType) -> TypeRecord {
        if !l.is_numeric() || !r.is_numeric() {
            if rule == Additive::Branches && l.base == r.base {
                return TypeRecord::Valid(l.non_constant());
            }
            let message = match rule {
                Additive::Add => format!("cannot add {} and {}", l, r),
                Additive::Sub => format!("cannot subtract {} from {}", r, l),
                Additive::Branches => {
                    format!("the branches of '?:' have different types {} and {}", l, r)
                }
            };
            return self.fail(expr, FindingCode::TypeMismatch, message);
        }

        if !l.unit.same_dimension(&r.unit) {
            let message = match rule {
                Additive::Add => format!("cannot add {} and {}", l, r),
                Additive::Sub => format!("cannot subtract {} from {}", r, l),
                Additive::Branches => format!(
                    "the branches of '?:' have incompatible dimensions {} and {}",
                    l, r
                ),
            };
            return self.fail(expr, FindingCode::IncompatibleDimensions, message);
        }

        let both_affine = l.unit.is_affine() && r.unit.is_affine();
        if both_affine && rule != Additive::Branches {
            let verb = if rule == Additive::Add { "adding" } else { "subtracting" };
            self.warn(
                expr,
                FindingCode::AffineQuantityAddition,
                format!(
                    "{} two affine quantities ({} and {}); one should be a difference",
                    verb, l, r
                ),
            );
        }

        let rescaled = r.unit.magnitude_conversion_to(&l.unit) == Conversion::Rescale;
        if rescaled {
            self.warn(
                expr,
                FindingCode::ImplicitMagnitudeConversion,
                format!("implicit conversion from {} to {}", r, l),
            );
        }

        let unit = if both_affine && rule == Additive::Sub {
            l.unit.delta()
        } else if r.unit.is_affine() && !l.unit.is_affine() {
            r.unit
        } else {
            l.unit
        };
        let out = ExprType {
            base: numeric_base(&l, &r),
            unit,
            constant: false,
            value: None,
        };
        let value = match rule {
            _ if rescaled => None,
            Additive::Add => fold(&l, &r, |a, b| a + b),
            Additive::Sub => fold(&l, &r, |a, b| a - b),
            Additive::Branches => None,
        };
        TypeRecord::Valid(folded(out, value))
    }

    fn multiplicative(
        &mut self,
        expr: &Expr,
        op: BinaryOp,
        l: ExprType,
        r: ExprType,
    ) -> TypeRecord {
        if !l.is_numeric() || !r.is_numeric() {
            return self.operand_mismatch(expr, op, &l, &r);
        }
        let (unit, value) = if op == BinaryOp::Mul {
            (
                l.unit.delta().multiply(&r.unit.delta()),
                fold(&l, &r, |a, b| a * b),
            )
        } else {
            let integral = l.base == BaseType::Integer && r.base == BaseType::Integer;
            (
                l.unit.delta().divide(&r.unit.delta()),
                fold(&l, &r, |a, b| if integral { (a / b).trunc() } else { a / b })
                    .filter(|v| v.is_finite()),
            )
        };
        let Some(unit) = unit else {
            return self.fail(
                expr,
                FindingCode::IncompatibleDimensions,
                format!("cannot apply '{}' to the units of {} and {}", op.symbol(), l, r),
            );
        };
        let out = ExprType {
            base: numeric_base(&l, &r),
            unit,
            constant: false,
            value: None,
        };
        TypeRecord::Valid(folded(out, value))
    }

    fn power(&mut self, expr: &Expr, l: ExprType, r: ExprType) -> TypeRecord {
        if !l.is_numeric() || !r.is_numeric() {
            return self.operand_mismatch(expr, BinaryOp::Pow, &l, &r);
        }
        if !r.unit.is_dimensionless() {
            return self.fail(
                expr,
                FindingCode::InvalidExponent,
                format!("the exponent of '**' must be dimensionless, got {}", r),
            );
        }

        if let Some(n) = r.integer_value() {
            let Some(unit) = i32::try_from(n).ok().and_then(|n| l.unit.delta().pow(n)) else {
                return self.fail(
                    expr,
                    FindingCode::InvalidExponent,
                    format!("cannot raise {} to the power {}", l, n),
                );
            };
            let base = if l.base == BaseType::Integer && n >= 0 {
                BaseType::Integer
            } else {
                BaseType::Real
            };
            let out = ExprType {
                base,
                unit,
                constant: false,
                value: None,
            };
            return TypeRecord::Valid(folded(out, fold(&l, &r, f64::powf)));
        }

        if !l.unit.is_dimensionless() {
            return self.fail(
                expr,
                FindingCode::InvalidExponent,
                format!(
                    "a non-integer exponent needs a dimensionless base, got {}",
                    l
                ),
            );
        }
        TypeRecord::Valid(folded(ExprType::real(), fold(&l, &r, f64::powf)))
    }

    fn comparison(&mut self, expr: &Expr, op: BinaryOp, l: ExprType, r: ExprType) -> TypeRecord {
        if l.is_numeric() && r.is_numeric() {
            if !l.unit.same_dimension(&r.unit) {
                return self.fail(
                    expr,
                    FindingCode::IncompatibleDimensions,
                    format!("cannot compare {} and {}", l, r),
                );
            }
            if r.unit.conversion_to(&l.unit) == Conversion::Rescale {
                self.warn(
                    expr,
                    FindingCode::ImplicitMagnitudeConversion,
                    format!("implicit conversion from {} to {}", r, l),
                );
            }
            return TypeRecord::Valid(ExprType::boolean());
        }
        let equality = matches!(op, BinaryOp::Eq | BinaryOp::Ne);
        if equality && l.base == r.base {
            return TypeRecord::Valid(ExprType::boolean());
        }
        self.fail(
            expr,
            FindingCode::TypeMismatch,
            format!("cannot compare {} and {}", l, r),
        )
    }

    fn operand_mismatch(
        &mut self,
        expr: &Expr,
        op: BinaryOp,
        l: &ExprType,
        r: &ExprType,
    ) -> TypeRecord {
        self.fail(
            expr,
            FindingCode::TypeMismatch,
            format!("cannot apply '{}' to {} and {}", op.symbol(), l, r),
        )
    }

    // -------------------------------------------------------------------------
    // Calls
    // -------------------------------------------------------------------------

    fn infer_call(
        &mut self,
        expr: &Expr,
        name: &str,
        args: &[TypeRecord],
        scope: ScopeId,
    ) -> TypeRecord {
        let table = self.table;
        let candidates = table.method_candidates(scope, name);
        if candidates.is_empty() {
            return self.fail(
                expr,
                FindingCode::UnresolvedFunction,
                format!("cannot resolve the function '{}'", name),
            );
        }

        let by_arity = table.methods_with_arity(scope, name, args.len());
        if by_arity.is_empty() {
            let mut arities: Vec<usize> = candidates
                .iter()
                .filter_map(|m| table.symbol(*m).as_method().map(|sig| sig.arity()))
                .collect();
            arities.sort_unstable();
            arities.dedup();
            let expected: Vec<String> = arities.iter().map(|a| a.to_string()).collect();
            return self.fail(
                expr,
                FindingCode::WrongArgumentCount,
                format!(
                    "'{}' takes {} argument(s), got {}",
                    name,
                    expected.join(" or "),
                    args.len()
                ),
            );
        }

        let Some(args) = args
            .iter()
            .map(|a| a.valid().copied())
            .collect::<Option<Vec<ExprType>>>()
        else {
            return TypeRecord::Error;
        };

        // A lone overload of the right arity is checked argument by argument below.
        let chosen = match (table.resolve_method(scope, name, &args), by_arity.as_slice()) {
            (Some(method), _) => method,
            (None, [only]) => *only,
            (None, _) => {
                let accepting = table.accepting_overloads(scope, name, &args).len();
                if accepting == 0 {
                    let shown: Vec<String> = args.iter().map(ExprType::to_string).collect();
                    return self.fail(
                        expr,
                        FindingCode::IncompatibleDimensions,
                        format!("no overload of '{}' accepts ({})", name, shown.join(", ")),
                    );
                }
                return self.fail(
                    expr,
                    FindingCode::AmbiguousFunctionCall,
                    format!("call to '{}' matches {} overloads", name, accepting),
                );
            }
        };
        let Some(sig) = table.symbol(chosen).as_method() else {
            return TypeRecord::Error;
        };

        let mut failed = false;
        let mut generic: Option<ExprType> = None;
        for (i, (param, arg)) in sig.params.iter().zip(&args).enumerate() {
            let position = i + 1;
            match param {
                ParamSpec::Typed(SymbolType::Known(target)) => match assignability(target, arg) {
                    Assignability::Compatible => {}
                    Assignability::Rescale => self.warn(
                        expr,
                        FindingCode::ImplicitMagnitudeConversion,
                        format!(
                            "implicit conversion from {} to {} in argument {} of '{}'",
                            arg, target, position, name
                        ),
                    ),
                    Assignability::Narrowing => self.warn(
                        expr,
                        FindingCode::ImplicitTypeConversion,
                        format!(
                            "implicit conversion from {} to {} in argument {} of '{}'",
                            arg, target, position, name
                        ),
                    ),
                    Assignability::IncompatibleDimensions => {
                        failed = true;
                        self.error(
                            expr,
                            FindingCode::IncompatibleDimensions,
                            format!(
                                "argument {} of '{}' is {}, expected {}",
                                position, name, arg, target
                            ),
                        );
                    }
                    Assignability::BaseMismatch => {
                        failed = true;
                        self.error(
                            expr,
                            FindingCode::TypeMismatch,
                            format!(
                                "argument {} of '{}' is {}, expected {}",
                                position, name, arg, target
                            ),
                        );
                    }
                },
                // Unresolved parameter types are reported at the function.
                ParamSpec::Typed(_) | ParamSpec::Any => {}
                ParamSpec::Generic => {
                    if !arg.is_numeric() {
                        failed = true;
                        self.error(
                            expr,
                            FindingCode::TypeMismatch,
                            format!(
                                "argument {} of '{}' must be numeric, got {}",
                                position, name, arg
                            ),
                        );
                        continue;
                    }
                    match generic {
                        None => generic = Some(*arg),
                        Some(first) if !first.unit.same_dimension(&arg.unit) => {
                            failed = true;
                            self.error(
                                expr,
                                FindingCode::IncompatibleDimensions,
                                format!(
                                    "arguments of '{}' must share a dimension, got {} and {}",
                                    name, first, arg
                                ),
                            );
                        }
                        Some(first) => {
                            let conversion = arg.unit.magnitude_conversion_to(&first.unit);
                            if conversion == Conversion::Rescale {
                                self.warn(
                                    expr,
                                    FindingCode::ImplicitMagnitudeConversion,
                                    format!("implicit conversion from {} to {}", arg, first),
                                );
                            }
                        }
                    }
                }
            }
        }
        if failed {
            return TypeRecord::Error;
        }

        match &sig.returns {
            ReturnSpec::Typed(SymbolType::Known(t)) => TypeRecord::Valid(t.non_constant()),
            ReturnSpec::Typed(_) => TypeRecord::Error,
            ReturnSpec::Generic => generic
                .map(|t| TypeRecord::Valid(t.non_constant()))
                .unwrap_or(TypeRecord::Error),
            ReturnSpec::Sqrt => {
                let Some(arg) = generic else {
                    return TypeRecord::Error;
                };
                match arg.unit.delta().sqrt() {
                    Some(unit) => TypeRecord::Valid(ExprType::quantity(unit)),
                    None => self.fail(
                        expr,
                        FindingCode::InvalidExponent,
                        format!("cannot take the square root of {}", arg),
                    ),
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Issues
    // -------------------------------------------------------------------------

    fn push(&mut self, expr: &Expr, kind: FindingKind, code: FindingCode, message: String) {
        self.out.issues.entry(expr.id).or_default().push(TypeIssue {
            kind,
            code,
            message,
            span: expr.span,
        });
    }

    fn error(&mut self, expr: &Expr, code: FindingCode, message: String) {
        self.push(expr, FindingKind::Error, code, message);
    }

    fn warn(&mut self, expr: &Expr, code: FindingCode, message: String) {
        self.push(expr, FindingKind::Warning, code, message);
    }

    /// Attach an ERROR and mark the node as failed.
    fn fail(&mut self, expr: &Expr, code: FindingCode, message: String) -> TypeRecord {
        self.error(expr, code, message);
        TypeRecord::Error
    }
}

/// Unit of the `order`-th time derivative of a value of type `t`.
fn derivative(t: &ExprType, order: usize) -> Option<Unit> {
    let order = i32::try_from(order).ok()?;
    t.unit.delta().divide(&millis().pow(order)?)
}

fn numeric_base(l: &ExprType, r: &ExprType) -> BaseType {
    if l.base == BaseType::Integer && r.base == BaseType::Integer {
        BaseType::Integer
    } else {
        BaseType::Real
    }
}

fn fold(l: &ExprType, r: &ExprType, f: impl Fn(f64, f64) -> f64) -> Option<f64> {
    match (l.value, r.value) {
        (Some(a), Some(b)) if l.constant && r.constant => Some(f(a, b)),
        _ => None,
    }
}

fn folded(t: ExprType, value: Option<f64>) -> ExprType {
    match value {
        Some(v) => t.with_value(v),
        None => t.non_constant(),
    }
}
