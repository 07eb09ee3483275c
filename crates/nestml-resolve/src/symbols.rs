//! Scopes and symbols.
//!
//! The symbol table is an arena: scopes and symbols live in two vectors and
//! refer to each other by [`ScopeId`] / [`SymbolId`]. Parent links, declaring
//! scopes and declaring neurons are ids, never ownership edges.
//!
//! # Scope Tree
//!
//! ```text
//! Global (predefined types, units, functions, variables; neurons)
//! └── Entity body (parameters, state, internals, input ports, shapes, functions)
//!     ├── Function (parameters and top-level locals)
//!     │   └── Block (if/for/while bodies)
//!     └── Update (top-level locals)
//!         └── Block
//! ```
//!
//! Names are keyed by `(name, kind)`, so a variable and a method may share a
//! name. A key can hold several symbols: method overloads, and duplicate
//! declarations the builder recorded for the checkers to report.

use crate::types::ExprType;
use indexmap::IndexMap;
use nestml_ast::{EntityKind, NodeId, Span, TypeExpr};
use std::collections::HashMap;
use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Namespace partition of the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    Neuron,
    Variable,
    Method,
    Type,
}

impl SymbolKind {
    pub fn name(self) -> &'static str {
        match self {
            SymbolKind::Neuron => "neuron",
            SymbolKind::Variable => "variable",
            SymbolKind::Method => "function",
            SymbolKind::Type => "type",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    /// Body of a neuron or component.
    Entity,
    /// Parameters and top-level statements of a function.
    Function,
    /// Top-level statements of the update block.
    Update,
    /// Body of an `if`/`elif`/`else`/`for`/`while`.
    Block,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Symbol the scope belongs to: the neuron for entity bodies, the method
    /// for function scopes.
    pub owner: Option<SymbolId>,
    symbols: IndexMap<(String, SymbolKind), Vec<SymbolId>>,
}

impl Scope {
    /// Symbols declared under `(name, kind)` in this scope, in declaration order.
    pub fn get(&self, name: &str, kind: SymbolKind) -> &[SymbolId] {
        self.symbols
            .get(&(name.to_string(), kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.values().flatten().copied()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.values().map(Vec::len).sum()
    }
}

// =============================================================================
// Symbols
// =============================================================================

/// Declared type of a variable, parameter or return slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolType {
    /// Not yet resolved (between the two builder passes).
    Pending,
    Known(ExprType),
    /// The type expression named something that is not a type or unit.
    Unknown(String),
    /// Type is that of the defining expression (shapes).
    FromDefinition,
}

impl SymbolType {
    pub fn known(&self) -> Option<&ExprType> {
        match self {
            SymbolType::Known(t) => Some(t),
            _ => None,
        }
    }
}

/// Block a variable was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableBlock {
    State,
    Parameters,
    Internals,
    Input,
    Output,
    Local,
    OdeDerived,
    /// Predefined global variables (`t`, `e`, `inf`).
    Predefined,
}

impl VariableBlock {
    pub fn name(self) -> &'static str {
        match self {
            VariableBlock::State => "state",
            VariableBlock::Parameters => "parameters",
            VariableBlock::Internals => "internals",
            VariableBlock::Input => "input",
            VariableBlock::Output => "output",
            VariableBlock::Local => "local",
            VariableBlock::OdeDerived => "ode",
            VariableBlock::Predefined => "predefined",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub ty: SymbolType,
    pub block: VariableBlock,
    pub is_alias: bool,
    /// Root of the initial-value (or defining) expression.
    pub initial_value: Option<NodeId>,
    /// Neuron/component the variable belongs to.
    pub declaring_entity: Option<SymbolId>,
    pub predefined: bool,
}

/// Parameter slot of a method signature.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSpec {
    Typed(SymbolType),
    /// Any numeric value; every generic slot of one call must share a dimension.
    Generic,
    /// Anything (printing, buffers).
    Any,
}

/// Return slot of a method signature.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnSpec {
    Typed(SymbolType),
    /// Type of the first generic argument.
    Generic,
    /// Square root of the first argument's unit.
    Sqrt,
}

#[derive(Debug, Clone)]
pub struct MethodSymbol {
    pub params: Vec<ParamSpec>,
    pub returns: ReturnSpec,
    pub declaring_entity: Option<SymbolId>,
    pub predefined: bool,
}

impl MethodSymbol {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone)]
pub struct NeuronSymbol {
    pub entity_kind: EntityKind,
    pub body_scope: ScopeId,
    /// Variables and methods declared directly in the body.
    pub members: Vec<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub ty: ExprType,
    /// Whether this is a unit (as opposed to a primitive type).
    pub is_unit: bool,
}

#[derive(Debug, Clone)]
pub enum SymbolData {
    Neuron(NeuronSymbol),
    Variable(VariableSymbol),
    Method(MethodSymbol),
    Type(TypeSymbol),
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    /// Declaring scope.
    pub scope: ScopeId,
    /// Declaration site; zero span for predefined symbols.
    pub span: Span,
    /// AST node that introduced the symbol.
    pub node: Option<NodeId>,
    pub data: SymbolData,
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self.data {
            SymbolData::Neuron(_) => SymbolKind::Neuron,
            SymbolData::Variable(_) => SymbolKind::Variable,
            SymbolData::Method(_) => SymbolKind::Method,
            SymbolData::Type(_) => SymbolKind::Type,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableSymbol> {
        match &self.data {
            SymbolData::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodSymbol> {
        match &self.data {
            SymbolData::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_neuron(&self) -> Option<&NeuronSymbol> {
        match &self.data {
            SymbolData::Neuron(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeSymbol> {
        match &self.data {
            SymbolData::Type(t) => Some(t),
            _ => None,
        }
    }
}

/// A symbol declared under a `(name, kind)` key that was already taken in
/// the same scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duplicate {
    pub original: SymbolId,
    pub duplicate: SymbolId,
}

/// A type expression that has to be resolved in the reference pass.
#[derive(Debug, Clone)]
pub(crate) struct PendingType {
    pub symbol: SymbolId,
    pub slot: TypeSlot,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeSlot {
    Variable,
    Param(usize),
    Return,
}

// =============================================================================
// Symbol table
// =============================================================================

/// Arena of scopes and symbols for one compilation unit.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    /// Scope each AST node is declared or evaluated in.
    enclosing: HashMap<NodeId, ScopeId>,
    /// Scope opened by an AST node (entity bodies, functions, update, blocks).
    opened: HashMap<NodeId, ScopeId>,
    /// Symbols introduced by an AST node, in order (one per declared name).
    node_symbols: HashMap<NodeId, Vec<SymbolId>>,
    duplicates: Vec<Duplicate>,
    pub(crate) pending: Vec<PendingType>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding only the empty global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                id: ScopeId(0),
                kind: ScopeKind::Global,
                parent: None,
                children: Vec::new(),
                owner: None,
                symbols: IndexMap::new(),
            }],
            symbols: Vec::new(),
            enclosing: HashMap::new(),
            opened: HashMap::new(),
            node_symbols: HashMap::new(),
            duplicates: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub(crate) fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn duplicates(&self) -> &[Duplicate] {
        &self.duplicates
    }

    pub fn is_duplicate(&self, id: SymbolId) -> Option<&Duplicate> {
        self.duplicates.iter().find(|d| d.duplicate == id)
    }

    /// Scope an AST node is declared or evaluated in.
    pub fn enclosing_scope(&self, node: NodeId) -> Option<ScopeId> {
        self.enclosing.get(&node).copied()
    }

    /// Scope opened by an AST node.
    pub fn opened_scope(&self, node: NodeId) -> Option<ScopeId> {
        self.opened.get(&node).copied()
    }

    /// Symbols introduced by an AST node.
    pub fn symbols_of(&self, node: NodeId) -> &[SymbolId] {
        self.node_symbols
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nearest ancestor scope (including `scope`) of the given kind.
    pub fn ancestor_of_kind(&self, scope: ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            if s.kind == kind {
                return Some(id);
            }
            current = s.parent;
        }
        None
    }

    /// Neuron/component symbol whose body (transitively) contains `scope`.
    pub fn entity_of(&self, scope: ScopeId) -> Option<SymbolId> {
        self.ancestor_of_kind(scope, ScopeKind::Entity)
            .and_then(|s| self.scope(s).owner)
    }

    pub fn entity_kind_of(&self, scope: ScopeId) -> Option<EntityKind> {
        let entity = self.entity_of(scope)?;
        self.symbol(entity).as_neuron().map(|n| n.entity_kind)
    }

    // =========================================================================
    // Construction (builder only)
    // =========================================================================

    pub(crate) fn open_scope(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        owner: Option<SymbolId>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            owner,
            symbols: IndexMap::new(),
        });
        self.scopes[parent.0 as usize].children.push(id);
        id
    }

    pub(crate) fn set_owner(&mut self, scope: ScopeId, owner: SymbolId) {
        self.scopes[scope.0 as usize].owner = Some(owner);
    }

    /// Add a symbol to `scope`.
    ///
    /// If the `(name, kind)` key is already taken the symbol is still added
    /// and the pair is recorded as a duplicate. Method overloads with
    /// different arities, and predefined overloads, are not duplicates.
    pub(crate) fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        span: Span,
        node: Option<NodeId>,
        data: SymbolData,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let symbol = Symbol {
            id,
            name: name.to_string(),
            scope,
            span,
            node,
            data,
        };
        let kind = symbol.kind();

        let existing = self.scopes[scope.0 as usize]
            .get(name, kind)
            .iter()
            .copied()
            .find(|other| self.clashes(&symbol, *other));
        if let Some(original) = existing {
            self.duplicates.push(Duplicate {
                original,
                duplicate: id,
            });
        }

        self.symbols.push(symbol);
        self.scopes[scope.0 as usize]
            .symbols
            .entry((name.to_string(), kind))
            .or_default()
            .push(id);
        if let Some(node) = node {
            self.node_symbols.entry(node).or_default().push(id);
        }
        id
    }

    fn clashes(&self, new: &Symbol, existing: SymbolId) -> bool {
        match (&new.data, &self.symbol(existing).data) {
            (SymbolData::Method(a), SymbolData::Method(b)) => {
                !a.predefined && !b.predefined && a.arity() == b.arity()
            }
            _ => true,
        }
    }

    pub(crate) fn set_enclosing(&mut self, node: NodeId, scope: ScopeId) {
        self.enclosing.insert(node, scope);
    }

    pub(crate) fn set_opened(&mut self, node: NodeId, scope: ScopeId) {
        self.opened.insert(node, scope);
    }

    // =========================================================================
    // Dump
    // =========================================================================

    /// Render the scope tree, one line per scope and symbol.
    ///
    /// Predefined symbols are summarized by count. The output is a pure
    /// function of the tree, so two builds of the same AST dump identically.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_scope(self.global(), 0, &mut out);
        out
    }

    fn dump_scope(&self, id: ScopeId, depth: usize, out: &mut String) {
        let scope = self.scope(id);
        let indent = "  ".repeat(depth);
        let owner = scope
            .owner
            .map(|o| format!(" {}", self.symbol(o).name))
            .unwrap_or_default();
        let _ = writeln!(out, "{}scope {:?}{}", indent, scope.kind, owner);

        let mut predefined = 0;
        for sym_id in scope.symbols() {
            let symbol = self.symbol(sym_id);
            if self.is_predefined(symbol) {
                predefined += 1;
                continue;
            }
            let _ = writeln!(out, "{}  {}", indent, SymbolLine(self, symbol));
        }
        if predefined > 0 {
            let _ = writeln!(out, "{}  ({} predefined)", indent, predefined);
        }
        for child in &scope.children {
            self.dump_scope(*child, depth + 1, out);
        }
    }

    fn is_predefined(&self, symbol: &Symbol) -> bool {
        match &symbol.data {
            SymbolData::Variable(v) => v.predefined,
            SymbolData::Method(m) => m.predefined,
            SymbolData::Type(_) => true,
            SymbolData::Neuron(_) => false,
        }
    }
}

struct SymbolLine<'a>(&'a SymbolTable, &'a Symbol);

impl fmt::Display for SymbolLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let SymbolLine(table, symbol) = self;
        write!(f, "{} {}", symbol.kind().name(), symbol.name)?;
        match &symbol.data {
            SymbolData::Neuron(n) => write!(f, " [{}]", n.entity_kind.keyword()),
            SymbolData::Variable(v) => {
                write!(f, ": {} [{}", SymbolTypeDisplay(&v.ty), v.block.name())?;
                if v.is_alias {
                    write!(f, ", alias")?;
                }
                write!(f, "]")
            }
            SymbolData::Method(m) => {
                write!(f, "(")?;
                for (i, p) in m.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match p {
                        ParamSpec::Typed(t) => write!(f, "{}", SymbolTypeDisplay(t))?,
                        ParamSpec::Generic => write!(f, "T")?,
                        ParamSpec::Any => write!(f, "_")?,
                    }
                }
                write!(f, ")")?;
                match &m.returns {
                    ReturnSpec::Typed(t) => write!(f, " -> {}", SymbolTypeDisplay(t)),
                    ReturnSpec::Generic => write!(f, " -> T"),
                    ReturnSpec::Sqrt => write!(f, " -> sqrt(T)"),
                }
            }
            SymbolData::Type(t) => write!(f, " = {}", t.ty),
        }?;
        if let Some(dup) = table.is_duplicate(symbol.id) {
            write!(f, " (duplicate of #{})", dup.original.0)?;
        }
        Ok(())
    }
}

struct SymbolTypeDisplay<'a>(&'a SymbolType);

impl fmt::Display for SymbolTypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            SymbolType::Pending => write!(f, "?"),
            SymbolType::Known(t) => write!(f, "{}", t),
            SymbolType::Unknown(name) => write!(f, "<unknown {}>", name),
            SymbolType::FromDefinition => write!(f, "<defined>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable() -> SymbolData {
        SymbolData::Variable(VariableSymbol {
            ty: SymbolType::Known(ExprType::real()),
            block: VariableBlock::Parameters,
            is_alias: false,
            initial_value: None,
            declaring_entity: None,
            predefined: false,
        })
    }

    fn method(arity: usize) -> SymbolData {
        SymbolData::Method(MethodSymbol {
            params: vec![ParamSpec::Any; arity],
            returns: ReturnSpec::Typed(SymbolType::Known(ExprType::void())),
            declaring_entity: None,
            predefined: false,
        })
    }

    #[test]
    fn test_scope_tree_links() {
        let mut table = SymbolTable::new();
        let body = table.open_scope(table.global(), ScopeKind::Entity, None);
        let inner = table.open_scope(body, ScopeKind::Update, None);
        assert_eq!(table.scope(inner).parent, Some(body));
        assert_eq!(table.scope(table.global()).children, vec![body]);
        assert_eq!(table.ancestor_of_kind(inner, ScopeKind::Entity), Some(body));
        assert_eq!(table.ancestor_of_kind(body, ScopeKind::Function), None);
    }

    #[test]
    fn test_duplicates_are_recorded_not_rejected() {
        let mut table = SymbolTable::new();
        let g = table.global();
        let a = table.declare(g, "x", Span::default(), None, variable());
        let b = table.declare(g, "x", Span::default(), None, variable());
        assert_eq!(table.scope(g).get("x", SymbolKind::Variable), &[a, b]);
        assert_eq!(
            table.duplicates(),
            &[Duplicate {
                original: a,
                duplicate: b
            }]
        );
    }

    #[test]
    fn test_kinds_partition_names() {
        let mut table = SymbolTable::new();
        let g = table.global();
        table.declare(g, "f", Span::default(), None, variable());
        table.declare(g, "f", Span::default(), None, method(0));
        assert!(table.duplicates().is_empty());
    }

    #[test]
    fn test_overloads_by_arity() {
        let mut table = SymbolTable::new();
        let g = table.global();
        table.declare(g, "f", Span::default(), None, method(0));
        table.declare(g, "f", Span::default(), None, method(1));
        assert!(table.duplicates().is_empty());
        table.declare(g, "f", Span::default(), None, method(1));
        assert_eq!(table.duplicates().len(), 1);
    }
}
