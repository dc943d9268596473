//! # absint-rs: Abstract Interpretation for Array-Access Safety
//!
//! **`absint-rs`** is an intraprocedural abstract-interpretation engine that
//! proves array-element accesses in-bounds and non-null. It runs a generic
//! worklist fixpoint over a method's control-flow graph with two abstract
//! domains and combines their results into per-statement safety verdicts.
//!
//! ## How it works
//!
//! Every statement gets a **program point** (the state just before it
//! executes) and the analysis computes one lattice element per point:
//!
//! - The **interval domain** tracks, per integer variable, a `[low, high]`
//!   range over the extended integers. A configurable window `[L, U]` widens
//!   escaping bounds to infinity, which keeps the lattice finite-height and
//!   guarantees termination.
//! - The **points-to domain** tracks, per array variable, the set of
//!   allocation sites (plus `null`) it may reference.
//!
//! The **safety checker** then classifies every array access: an access is
//! `Safe` when the base can never be null and the index interval stays below
//! every aliasable allocation's size interval.
//!
//! ## Basic Usage
//!
//! ```rust
//! use absint_rs::fixpoint::solve;
//! use absint_rs::flow::FlowGraph;
//! use absint_rs::interval::{IntervalDomain, Window};
//! use absint_rs::ir::{BinOp, CmpOp, Cond, MethodBuilder, Operand, Rhs, Stmt, StmtId};
//! use absint_rs::pointsto::PointsToDomain;
//! use absint_rs::safety::{check_method, Verdict};
//!
//! // a = new int[3];
//! // for (i = 0; i < 3; i++) a[i] = 1;
//! let mut b = MethodBuilder::new("fill");
//! let a = b.array_var("a");
//! let i = b.int_var("i");
//! b.push(Stmt::Assign {
//!     target: a.clone(),
//!     rhs: Rhs::NewArray { len: Operand::Const(3) },
//! });
//! b.push(Stmt::Assign {
//!     target: i.clone(),
//!     rhs: Rhs::Operand(Operand::Const(0)),
//! });
//! b.push(Stmt::If {
//!     cond: Cond {
//!         lhs: Operand::Var(i.clone()),
//!         op: CmpOp::Lt,
//!         rhs: Operand::Const(3),
//!     },
//!     target: StmtId::new(4),
//! });
//! b.push(Stmt::Return);
//! let store = b.push(Stmt::ArrayStore {
//!     base: a,
//!     index: Operand::Var(i.clone()),
//!     value: Operand::Const(1),
//! });
//! b.push(Stmt::Assign {
//!     target: i.clone(),
//!     rhs: Rhs::Binary {
//!         op: BinOp::Add,
//!         lhs: Operand::Var(i),
//!         rhs: Operand::Const(1),
//!     },
//! });
//! b.push(Stmt::Goto { target: StmtId::new(2) });
//! let method = b.build();
//!
//! // Run both domains to a fixpoint and check the accesses.
//! let graph = FlowGraph::build(&method);
//! let intervals = IntervalDomain::new(&method, Window::new(-1000, 1000));
//! let points = PointsToDomain::new(&method);
//! let iv_facts = solve(&graph, &intervals, intervals.initial());
//! let pt_facts = solve(&graph, &points, points.initial());
//! let verdicts = check_method(&method, &graph, &iv_facts, &pt_facts);
//!
//! // The guard i < 3 pins the index to [0, 2] against size 3.
//! assert_eq!(verdicts[&store], Verdict::Safe);
//! ```
//!
//! ## Core Components
//!
//! - **[`ir`]**: the minimal statement/CFG model and [`MethodBuilder`][crate::ir::MethodBuilder].
//! - **[`flow`]**: program-point numbering and labelled flow edges.
//! - **[`lattice`]**: the [`Domain`][crate::lattice::Domain] contract the driver runs against.
//! - **[`interval`]**, **[`pointsto`]**: the two shipped domains.
//! - **[`fixpoint`]**: the generic worklist driver, with optional tracing.
//! - **[`safety`]**: the array-bounds checker.
//! - **[`report`]**: textual rendering of facts, traces and verdicts.

pub mod fixpoint;
pub mod flow;
pub mod interval;
pub mod ir;
pub mod lattice;
pub mod pointsto;
pub mod report;
pub mod safety;
