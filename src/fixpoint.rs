//! Generic worklist fixpoint driver (Kildall's algorithm).
//!
//! The driver knows nothing about the domains beyond the [`Domain`]
//! contract. Facts start out bottom everywhere except the entry point and
//! only ever grow: each dequeued point pushes its fact across every
//! outgoing edge and joins the result into the destination. The loop
//! terminates because both shipped domains have finite height for a fixed
//! variable set, allocation-site universe and interval window.

use std::collections::VecDeque;

use crate::flow::{FlowGraph, ProgramPoint};
use crate::lattice::Domain;

/// The computed per-point facts of one fixpoint run.
#[derive(Debug, Clone, PartialEq)]
pub struct Facts<E> {
    elems: Vec<E>,
}

impl<E> Facts<E> {
    /// The fact holding just before the statement at `point` executes.
    pub fn get(&self, point: ProgramPoint) -> &E {
        &self.elems[point.index()]
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// All facts in program-point order.
    pub fn iter(&self) -> impl Iterator<Item = (ProgramPoint, &E)> {
        self.elems
            .iter()
            .enumerate()
            .map(|(i, e)| (ProgramPoint::new(i), e))
    }
}

/// One entry of the diagnostic trace.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent<E> {
    /// The joined fact computed for a destination point while processing
    /// one edge, recorded whether or not it changed the stored fact.
    Update { point: ProgramPoint, elem: E },
    /// Sentinel: all edges of the named dequeued point have been processed.
    Processed { point: ProgramPoint },
}

/// Append-only ordered log of a fixpoint run.
pub type Trace<E> = Vec<TraceEvent<E>>;

/// Runs the worklist to a fixpoint and returns the per-point facts.
///
/// `initial` seeds the entry point; every other point starts at bottom.
pub fn solve<D: Domain>(graph: &FlowGraph, domain: &D, initial: D::Element) -> Facts<D::Element> {
    run(graph, domain, initial, None)
}

/// Like [`solve`], additionally recording the diagnostic trace.
pub fn solve_traced<D: Domain>(
    graph: &FlowGraph,
    domain: &D,
    initial: D::Element,
) -> (Facts<D::Element>, Trace<D::Element>) {
    let mut trace = Trace::new();
    let facts = run(graph, domain, initial, Some(&mut trace));
    (facts, trace)
}

fn run<D: Domain>(
    graph: &FlowGraph,
    domain: &D,
    initial: D::Element,
    mut trace: Option<&mut Trace<D::Element>>,
) -> Facts<D::Element> {
    let n = graph.len();
    let mut elems: Vec<D::Element> = (0..n).map(|_| domain.bottom()).collect();
    if n > 0 {
        elems[ProgramPoint::ENTRY.index()] = initial;
    }

    // Seed with every point so unreachable points are visited (and stay
    // bottom) instead of silently skipped.
    let mut worklist: VecDeque<ProgramPoint> = graph.points().collect();
    let mut in_queue = vec![true; n];

    let mut dequeues = 0usize;
    while let Some(point) = worklist.pop_front() {
        in_queue[point.index()] = false;
        dequeues += 1;

        for edge in graph.edges(point) {
            let candidate = domain.transfer(&elems[point.index()], edge.stmt, edge.on_true);
            let updated = domain.join(&elems[edge.to.index()], &candidate);
            if let Some(trace) = trace.as_mut() {
                trace.push(TraceEvent::Update {
                    point: edge.to,
                    elem: updated.clone(),
                });
            }
            if updated != elems[edge.to.index()] {
                elems[edge.to.index()] = updated;
                if !in_queue[edge.to.index()] {
                    in_queue[edge.to.index()] = true;
                    worklist.push_back(edge.to);
                }
            }
        }
        if let Some(trace) = trace.as_mut() {
            trace.push(TraceEvent::Processed { point });
        }
    }

    log::debug!("fixpoint reached after {} dequeues over {} points", dequeues, n);
    Facts { elems }
}
