//! Textual rendering of analysis results.
//!
//! Everything here is pure string production; callers decide where the text
//! goes. Program points are rendered as two-digit numbers and infinities as
//! `-inf`/`inf`. Allocation sites get stable labels `alloc#k` in first-seen
//! (body) order, so reports are reproducible across runs.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::fixpoint::{Facts, Trace, TraceEvent};
use crate::flow::FlowGraph;
use crate::interval::IntervalElement;
use crate::ir::StmtId;
use crate::pointsto::{AllocSite, PointsToElement, Target};
use crate::safety::Verdict;

/// Stable `alloc#k` labels for the given site universe, in first-seen order.
pub fn site_labels(sites: &[AllocSite]) -> BTreeMap<AllocSite, String> {
    sites
        .iter()
        .enumerate()
        .map(|(k, &site)| (site, format!("alloc#{}", k)))
        .collect()
}

/// One line per program point with its final interval fact.
pub fn interval_report(facts: &Facts<IntervalElement>) -> String {
    let mut out = String::new();
    for (point, elem) in facts.iter() {
        writeln!(out, "{:02} : {}", point.index(), elem).unwrap();
    }
    out
}

/// One line per program point with its final alias sets, sites labelled.
pub fn points_to_report(facts: &Facts<PointsToElement>, sites: &[AllocSite]) -> String {
    let labels = site_labels(sites);
    let mut out = String::new();
    for (point, elem) in facts.iter() {
        let rendered = match elem {
            PointsToElement::Bottom => "bot".to_string(),
            PointsToElement::Reach(map) => {
                let vars: Vec<String> = map
                    .iter()
                    .map(|(var, targets)| {
                        let ts: Vec<&str> = targets
                            .iter()
                            .map(|t| match t {
                                Target::Null => "null",
                                Target::Site(site) => labels[site].as_str(),
                            })
                            .collect();
                        format!("{}:{{{}}}", var, ts.join(", "))
                    })
                    .collect();
                format!("{{{}}}", vars.join(", "))
            }
        };
        writeln!(out, "{:02} : {}", point.index(), rendered).unwrap();
    }
    out
}

/// One line per checked statement: `label: NN: verdict`.
pub fn safety_report(
    label: &str,
    graph: &FlowGraph,
    verdicts: &BTreeMap<StmtId, Verdict>,
) -> String {
    let mut out = String::new();
    for (&stmt, verdict) in verdicts {
        let point = graph.point_of(stmt);
        writeln!(out, "{}: {:02}: {}", label, point.index(), verdict).unwrap();
    }
    out
}

/// Renders an interval-domain trace, one variable per line.
///
/// Bottom facts are skipped; sentinels become blank separator lines, with
/// runs of blanks collapsed.
pub fn interval_trace_report(label: &str, trace: &Trace<IntervalElement>) -> String {
    let mut out = String::new();
    let mut last_was_blank = false;
    for event in trace {
        match event {
            TraceEvent::Processed { .. } => {
                if !last_was_blank && !out.is_empty() {
                    out.push('\n');
                    last_was_blank = true;
                }
            }
            TraceEvent::Update { point, elem } => match elem {
                IntervalElement::Bottom => {}
                IntervalElement::Reach(map) => {
                    for (var, interval) in map {
                        writeln!(out, "{}: in{:02}: {}:{}", label, point.index(), var, interval)
                            .unwrap();
                        last_was_blank = false;
                    }
                }
            },
        }
    }
    out
}
