//! Minimal statement and control-flow model consumed by the analyses.
//!
//! This module is the front-end boundary: any bytecode reader or custom IR
//! can lower a method body into a [`Method`] via [`MethodBuilder`]. The
//! analyses only ever look at the statement shapes defined here; everything
//! a front end cannot express maps to [`Stmt::Nop`] and degrades precision
//! instead of failing.

use std::collections::BTreeSet;
use std::fmt;

/// A method-local variable, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(String);

impl Var {
    /// Creates a new variable with the given name.
    ///
    /// # Panics
    ///
    /// Panics if the name is empty.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "Variable names must be non-empty");
        Var(name)
    }

    /// Returns the variable name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a statement within a [`Method`] body.
///
/// Statement ids are dense and follow body order; the entry statement has
/// id 0. Allocation sites are identified by the id of their `new` statement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StmtId(usize);

impl StmtId {
    pub fn new(index: usize) -> Self {
        StmtId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// An atomic operand: a local variable, an integer literal, or `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Var(Var),
    Const(i64),
    Null,
}

impl Operand {
    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Operand::Var(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(v) => write!(f, "{}", v),
            Operand::Const(c) => write!(f, "{}", c),
            Operand::Null => write!(f, "null"),
        }
    }
}

/// Binary arithmetic operators appearing on assignment right-hand sides.
///
/// Only `+`, `-`, `*` and `/` have precise interval semantics; the rest are
/// recognized shapes whose results the interval domain treats as unknown.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        };
        write!(f, "{}", s)
    }
}

/// Comparison operators of conditional statements.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    /// The comparison that holds on the branch *not* taken.
    pub fn negated(self) -> CmpOp {
        match self {
            CmpOp::Lt => CmpOp::Ge,
            CmpOp::Le => CmpOp::Gt,
            CmpOp::Gt => CmpOp::Le,
            CmpOp::Ge => CmpOp::Lt,
            CmpOp::Eq => CmpOp::Ne,
            CmpOp::Ne => CmpOp::Eq,
        }
    }

    /// The comparison that holds on the given branch of a conditional.
    pub fn on_branch(self, on_true: bool) -> CmpOp {
        if on_true {
            self
        } else {
            self.negated()
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        };
        write!(f, "{}", s)
    }
}

/// The condition of an `if` statement: `lhs op rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cond {
    pub lhs: Operand,
    pub op: CmpOp,
    pub rhs: Operand,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

/// Right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rhs {
    /// `v = c`, `v = v2`, or `v = null`.
    Operand(Operand),
    /// `v = -v2`.
    Neg(Var),
    /// `v = lhs op rhs`.
    Binary { op: BinOp, lhs: Operand, rhs: Operand },
    /// `v = new int[len]`, an array allocation site.
    NewArray { len: Operand },
    /// `v = base[index]`.
    ArrayLoad { base: Var, index: Operand },
}

/// A single statement of a method body.
///
/// The analyses classify statements as assignment, conditional-with-target,
/// identity (parameter bind), or other; `Goto`, `Return`, `ArrayStore` and
/// `Nop` all fall into the "other" class for the transfer functions, but
/// array loads/stores still contribute element accesses to the safety check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Assign { target: Var, rhs: Rhs },
    ArrayStore { base: Var, index: Operand, value: Operand },
    If { cond: Cond, target: StmtId },
    /// Binds a parameter (or other ambient value) to a local.
    Identity { target: Var },
    Goto { target: StmtId },
    Return,
    Nop,
}

/// An array-element access occurring inside a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayAccess {
    pub base: Var,
    pub index: Operand,
}

impl Stmt {
    /// All array-element accesses performed by this statement.
    pub fn accesses(&self) -> Vec<ArrayAccess> {
        match self {
            Stmt::Assign {
                rhs: Rhs::ArrayLoad { base, index },
                ..
            } => vec![ArrayAccess {
                base: base.clone(),
                index: index.clone(),
            }],
            Stmt::ArrayStore { base, index, .. } => vec![ArrayAccess {
                base: base.clone(),
                index: index.clone(),
            }],
            _ => Vec::new(),
        }
    }

    /// Whether this statement is an array allocation (`v = new int[len]`).
    pub fn is_allocation(&self) -> bool {
        matches!(
            self,
            Stmt::Assign {
                rhs: Rhs::NewArray { .. },
                ..
            }
        )
    }
}

/// A resolved method body: statements, the successor relation, and the
/// typed-variable catalogue (integer-like vs integer-array locals).
///
/// Built once via [`MethodBuilder`] and immutable for the whole run.
#[derive(Debug, Clone)]
pub struct Method {
    name: String,
    stmts: Vec<Stmt>,
    int_vars: BTreeSet<Var>,
    array_vars: BTreeSet<Var>,
}

impl Method {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entry statement (always id 0).
    pub fn entry(&self) -> StmtId {
        StmtId(0)
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.0]
    }

    /// Statement ids in body order.
    pub fn stmt_ids(&self) -> impl Iterator<Item = StmtId> {
        (0..self.stmts.len()).map(StmtId)
    }

    /// Successors of a statement: fallthrough and/or jump target.
    pub fn successors(&self, id: StmtId) -> Vec<StmtId> {
        let next = if id.0 + 1 < self.stmts.len() {
            Some(StmtId(id.0 + 1))
        } else {
            None
        };
        match self.stmt(id) {
            Stmt::If { target, .. } => {
                let mut succs = Vec::with_capacity(2);
                if let Some(next) = next {
                    succs.push(next);
                }
                if !succs.contains(target) {
                    succs.push(*target);
                }
                succs
            }
            Stmt::Goto { target } => vec![*target],
            Stmt::Return => Vec::new(),
            _ => next.into_iter().collect(),
        }
    }

    pub fn int_vars(&self) -> &BTreeSet<Var> {
        &self.int_vars
    }

    pub fn array_vars(&self) -> &BTreeSet<Var> {
        &self.array_vars
    }

    pub fn is_int_var(&self, var: &Var) -> bool {
        self.int_vars.contains(var)
    }

    pub fn is_array_var(&self, var: &Var) -> bool {
        self.array_vars.contains(var)
    }

    /// Ids of all array-allocation statements, in body (first-seen) order.
    pub fn alloc_sites(&self) -> Vec<StmtId> {
        self.stmt_ids().filter(|&id| self.stmt(id).is_allocation()).collect()
    }
}

/// Incremental builder for [`Method`] bodies.
///
/// Statements are appended in body order; conditional and goto targets may
/// refer forward to ids that do not exist yet and are validated by
/// [`MethodBuilder::build`].
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    stmts: Vec<Stmt>,
    int_vars: BTreeSet<Var>,
    array_vars: BTreeSet<Var>,
}

impl MethodBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stmts: Vec::new(),
            int_vars: BTreeSet::new(),
            array_vars: BTreeSet::new(),
        }
    }

    /// Declares an integer-like local and returns its handle.
    pub fn int_var(&mut self, name: &str) -> Var {
        let var = Var::new(name);
        self.int_vars.insert(var.clone());
        var
    }

    /// Declares an integer-array local and returns its handle.
    pub fn array_var(&mut self, name: &str) -> Var {
        let var = Var::new(name);
        self.array_vars.insert(var.clone());
        var
    }

    /// Appends a statement and returns its id.
    pub fn push(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len());
        self.stmts.push(stmt);
        id
    }

    /// The id the next pushed statement will receive.
    pub fn next_id(&self) -> StmtId {
        StmtId(self.stmts.len())
    }

    /// Finalizes the method.
    ///
    /// # Panics
    ///
    /// Panics if the body is empty, a jump target is out of range, or a
    /// variable is declared both integer and array.
    pub fn build(self) -> Method {
        assert!(!self.stmts.is_empty(), "Method body must be non-empty");
        for (i, stmt) in self.stmts.iter().enumerate() {
            let target = match stmt {
                Stmt::If { target, .. } => Some(*target),
                Stmt::Goto { target } => Some(*target),
                _ => None,
            };
            if let Some(target) = target {
                assert!(
                    target.0 < self.stmts.len(),
                    "Statement s{} jumps to out-of-range target {}",
                    i,
                    target
                );
            }
        }
        assert!(
            self.int_vars.is_disjoint(&self.array_vars),
            "A variable cannot be both integer and array typed"
        );
        Method {
            name: self.name,
            stmts: self.stmts,
            int_vars: self.int_vars,
            array_vars: self.array_vars,
        }
    }
}
