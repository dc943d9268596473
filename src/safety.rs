//! Array-bounds safety checker over the combined analysis results.
//!
//! Consumes the final interval and points-to facts and classifies every
//! array-element access as provably fine or not. The verdict is per
//! statement: a statement is "Safe" only when every access it performs is.

use std::collections::BTreeMap;
use std::fmt;

use crate::fixpoint::Facts;
use crate::flow::FlowGraph;
use crate::interval::{Interval, IntervalElement};
use crate::ir::{ArrayAccess, Method, Operand, Rhs, Stmt, StmtId};
use crate::pointsto::{AllocSite, PointsToElement, Target};

/// Safety classification of one statement's array accesses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    PotentiallyUnsafe,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Safe => write!(f, "Safe"),
            Verdict::PotentiallyUnsafe => write!(f, "Potentially Unsafe"),
        }
    }
}

/// Size interval of every allocation site.
///
/// A literal length is a point interval; a variable length is read from the
/// interval fact holding just before the allocation executes.
pub fn allocation_sizes(
    method: &Method,
    graph: &FlowGraph,
    intervals: &Facts<IntervalElement>,
) -> BTreeMap<AllocSite, Interval> {
    method
        .alloc_sites()
        .into_iter()
        .map(|id| {
            let len = match method.stmt(id) {
                Stmt::Assign {
                    rhs: Rhs::NewArray { len },
                    ..
                } => len,
                _ => unreachable!("alloc_sites returns only allocations"),
            };
            let size = match len {
                Operand::Const(c) => Interval::point(*c),
                Operand::Var(v) => intervals
                    .get(graph.point_of(id))
                    .get(v)
                    .unwrap_or_else(Interval::top),
                Operand::Null => Interval::top(),
            };
            (AllocSite::new(id), size)
        })
        .collect()
}

/// Classifies every statement that accesses a tracked array base.
///
/// Statements whose fact is bottom in either domain are unreachable and
/// classified "Safe" vacuously.
pub fn check_method(
    method: &Method,
    graph: &FlowGraph,
    intervals: &Facts<IntervalElement>,
    points: &Facts<PointsToElement>,
) -> BTreeMap<StmtId, Verdict> {
    let sizes = allocation_sizes(method, graph, intervals);
    let mut verdicts = BTreeMap::new();

    for id in method.stmt_ids() {
        let accesses: Vec<ArrayAccess> = method
            .stmt(id)
            .accesses()
            .into_iter()
            .filter(|a| method.is_array_var(&a.base))
            .collect();
        if accesses.is_empty() {
            continue;
        }

        let point = graph.point_of(id);
        let iv = intervals.get(point);
        let pt = points.get(point);

        let verdict = if iv.is_bottom() || pt.is_bottom() {
            Verdict::Safe
        } else if accesses.iter().all(|a| access_in_bounds(a, iv, pt, &sizes)) {
            Verdict::Safe
        } else {
            Verdict::PotentiallyUnsafe
        };
        log::debug!("{}: {} at {}", id, verdict, point);
        verdicts.insert(id, verdict);
    }
    verdicts
}

fn access_in_bounds(
    access: &ArrayAccess,
    iv: &IntervalElement,
    pt: &PointsToElement,
    sizes: &BTreeMap<AllocSite, Interval>,
) -> bool {
    let aliases = match pt.get(&access.base) {
        Some(aliases) => aliases,
        None => return false,
    };
    if aliases.contains(&Target::Null) {
        return false;
    }
    let index = match &access.index {
        Operand::Const(c) => Interval::point(*c),
        Operand::Var(v) => iv.get(v).unwrap_or_else(Interval::top),
        Operand::Null => Interval::top(),
    };
    aliases.iter().all(|target| match target {
        Target::Null => false,
        Target::Site(site) => {
            let size = sizes.get(site).copied().unwrap_or_else(Interval::top);
            index.high < size.low
        }
    })
}
