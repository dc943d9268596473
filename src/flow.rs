//! Program-point numbering over a method's control-flow graph.
//!
//! A program point denotes the state *just before* a statement executes.
//! The entry statement receives the reserved point 0; the remaining points
//! follow the body traversal order, so the numbering is stable for a fixed
//! method. Every directed edge carries its enclosing statement and whether
//! it is the true branch of a conditional; all other edges are implicitly
//! the fallthrough/false branch.

use std::fmt;

use crate::ir::{Method, Stmt, StmtId};

/// A program point: the state just before a statement executes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramPoint(usize);

impl ProgramPoint {
    /// The reserved entry point.
    pub const ENTRY: ProgramPoint = ProgramPoint(0);

    pub fn new(index: usize) -> Self {
        ProgramPoint(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// An outgoing edge of a program point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    /// Destination point.
    pub to: ProgramPoint,
    /// The statement executed along this edge.
    pub stmt: StmtId,
    /// True iff this edge is the true branch of a conditional.
    pub on_true: bool,
}

/// The program-point graph of one method.
///
/// Holds the point↔statement bijection and the labelled edge relation the
/// fixpoint driver iterates over.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    /// Point of each statement, indexed by statement id.
    point_of: Vec<ProgramPoint>,
    /// Statement of each point, indexed by point.
    stmt_of: Vec<StmtId>,
    /// Outgoing edges, indexed by point.
    edges: Vec<Vec<FlowEdge>>,
}

impl FlowGraph {
    /// Numbers the program points of a method and labels all edges.
    ///
    /// The entry statement gets point 0; the remaining statements get
    /// consecutive points in body order.
    pub fn build(method: &Method) -> Self {
        let n = method.len();

        // Entry first, then the rest in traversal order. With dense
        // statement ids and the entry at id 0, the bijection is identity,
        // but both directions are kept explicit.
        let mut point_of = vec![ProgramPoint(0); n];
        let mut stmt_of = vec![method.entry(); n];
        point_of[method.entry().index()] = ProgramPoint::ENTRY;
        let mut next = 1;
        for id in method.stmt_ids() {
            if id != method.entry() {
                point_of[id.index()] = ProgramPoint(next);
                stmt_of[next] = id;
                next += 1;
            }
        }

        let mut edges = vec![Vec::new(); n];
        for id in method.stmt_ids() {
            let from = point_of[id.index()];
            let true_target = match method.stmt(id) {
                Stmt::If { target, .. } => Some(*target),
                _ => None,
            };
            for succ in method.successors(id) {
                let to = point_of[succ.index()];
                let on_true = true_target == Some(succ);
                edges[from.index()].push(FlowEdge { to, stmt: id, on_true });
            }
        }

        log::debug!(
            "flow graph for `{}`: {} points, {} edges",
            method.name(),
            n,
            edges.iter().map(Vec::len).sum::<usize>()
        );

        Self {
            point_of,
            stmt_of,
            edges,
        }
    }

    /// Number of program points.
    pub fn len(&self) -> usize {
        self.stmt_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmt_of.is_empty()
    }

    /// All program points, in id order.
    pub fn points(&self) -> impl Iterator<Item = ProgramPoint> {
        (0..self.len()).map(ProgramPoint)
    }

    /// The program point just before the given statement.
    pub fn point_of(&self, stmt: StmtId) -> ProgramPoint {
        self.point_of[stmt.index()]
    }

    /// The statement executed at the given program point.
    pub fn stmt_of(&self, point: ProgramPoint) -> StmtId {
        self.stmt_of[point.index()]
    }

    /// Outgoing edges of a point.
    pub fn edges(&self, point: ProgramPoint) -> &[FlowEdge] {
        &self.edges[point.index()]
    }

    /// The statement enclosing the edge `from -> to`, if such an edge exists.
    pub fn enclosing_stmt(&self, from: ProgramPoint, to: ProgramPoint) -> Option<StmtId> {
        self.edges(from).iter().find(|e| e.to == to).map(|e| e.stmt)
    }

    /// Whether the edge `from -> to` is a conditional's true branch.
    pub fn is_true_branch(&self, from: ProgramPoint, to: ProgramPoint) -> bool {
        self.edges(from).iter().any(|e| e.to == to && e.on_true)
    }
}
