//! Allocation-site points-to abstract domain for array variables.
//!
//! Each array variable maps to the set of values it may hold: the symbolic
//! `null` and/or allocation sites, where a site is identified by the id of
//! its `new int[..]` statement. The site universe is fixed for a run: it is
//! the set of allocation statements of the analysed method.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ir::{CmpOp, Cond, Method, Operand, Rhs, Stmt, StmtId, Var};
use crate::lattice::Domain;

/// An array allocation site, identified by its `new` statement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AllocSite(StmtId);

impl AllocSite {
    pub fn new(stmt: StmtId) -> Self {
        AllocSite(stmt)
    }

    pub fn stmt(self) -> StmtId {
        self.0
    }
}

impl fmt::Display for AllocSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "new@{}", self.0)
    }
}

/// A value an array variable may hold.
///
/// The derived ordering puts `Null` before every site, which keeps the
/// rendering of target sets stable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    Null,
    Site(AllocSite),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Null => write!(f, "null"),
            Target::Site(site) => write!(f, "{}", site),
        }
    }
}

/// Set of possible targets of one variable.
pub type TargetSet = BTreeSet<Target>;

/// Abstract value of the points-to domain at one program point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointsToElement {
    /// Unreachable or contradictory state.
    Bottom,
    /// Reachable state: one target set per array variable.
    Reach(BTreeMap<Var, TargetSet>),
}

impl PointsToElement {
    pub fn is_bottom(&self) -> bool {
        matches!(self, PointsToElement::Bottom)
    }

    /// The target set tracked for a variable, if any.
    pub fn get(&self, var: &Var) -> Option<&TargetSet> {
        match self {
            PointsToElement::Bottom => None,
            PointsToElement::Reach(map) => map.get(var),
        }
    }
}

impl fmt::Display for PointsToElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointsToElement::Bottom => write!(f, "bot"),
            PointsToElement::Reach(map) => {
                write!(f, "{{")?;
                for (i, (var, targets)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{{", var)?;
                    for (j, t) in targets.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", t)?;
                    }
                    write!(f, "}}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// The points-to domain for one method.
#[derive(Debug, Clone)]
pub struct PointsToDomain<'m> {
    method: &'m Method,
    sites: Vec<AllocSite>,
}

impl<'m> PointsToDomain<'m> {
    pub fn new(method: &'m Method) -> Self {
        let sites = method.alloc_sites().into_iter().map(AllocSite::new).collect();
        Self { method, sites }
    }

    /// The fixed site universe, in body order.
    pub fn sites(&self) -> &[AllocSite] {
        &self.sites
    }

    /// The entry element: every array variable starts out null.
    pub fn initial(&self) -> PointsToElement {
        let mut null = TargetSet::new();
        null.insert(Target::Null);
        let map = self
            .method
            .array_vars()
            .iter()
            .map(|v| (v.clone(), null.clone()))
            .collect();
        PointsToElement::Reach(map)
    }

    /// The unconstrained target set: any site or null.
    fn any_target(&self) -> TargetSet {
        let mut set: TargetSet = self.sites.iter().map(|&s| Target::Site(s)).collect();
        set.insert(Target::Null);
        set
    }

    fn transfer_assign(
        &self,
        map: &BTreeMap<Var, TargetSet>,
        stmt: StmtId,
        target: &Var,
        rhs: &Rhs,
    ) -> PointsToElement {
        let mut out = map.clone();
        match rhs {
            Rhs::NewArray { .. } => {
                let mut set = TargetSet::new();
                set.insert(Target::Site(AllocSite::new(stmt)));
                out.insert(target.clone(), set);
            }
            Rhs::Operand(Operand::Null) => {
                let mut set = TargetSet::new();
                set.insert(Target::Null);
                out.insert(target.clone(), set);
            }
            Rhs::Operand(Operand::Var(v2)) if map.contains_key(v2) => {
                let set = map[v2].clone();
                out.insert(target.clone(), set);
            }
            // Integer-valued and unrecognized right-hand sides do not touch
            // array references.
            _ => return PointsToElement::Reach(map.clone()),
        }
        PointsToElement::Reach(out)
    }

    fn transfer_guard(
        &self,
        map: &BTreeMap<Var, TargetSet>,
        cond: &Cond,
        on_true: bool,
    ) -> PointsToElement {
        let op = cond.op.on_branch(on_true);
        if !matches!(op, CmpOp::Eq | CmpOp::Ne) {
            return PointsToElement::Reach(map.clone());
        }
        let mut out = map.clone();
        match (&cond.lhs, &cond.rhs) {
            (Operand::Var(v), Operand::Null) | (Operand::Null, Operand::Var(v))
                if map.contains_key(v) =>
            {
                match op {
                    CmpOp::Eq => {
                        if !map[v].contains(&Target::Null) {
                            return PointsToElement::Bottom;
                        }
                        let mut set = TargetSet::new();
                        set.insert(Target::Null);
                        out.insert(v.clone(), set);
                    }
                    CmpOp::Ne => {
                        let mut set = map[v].clone();
                        set.remove(&Target::Null);
                        if set.is_empty() {
                            return PointsToElement::Bottom;
                        }
                        out.insert(v.clone(), set);
                    }
                    _ => unreachable!(),
                }
            }
            (Operand::Var(v1), Operand::Var(v2))
                if map.contains_key(v1) && map.contains_key(v2) =>
            {
                let s1 = &map[v1];
                let s2 = &map[v2];
                match op {
                    CmpOp::Eq => {
                        let meet: TargetSet = s1.intersection(s2).copied().collect();
                        if meet.is_empty() {
                            return PointsToElement::Bottom;
                        }
                        out.insert(v1.clone(), meet.clone());
                        out.insert(v2.clone(), meet);
                    }
                    CmpOp::Ne => {
                        let null_only = |s: &TargetSet| {
                            s.len() == 1 && s.contains(&Target::Null)
                        };
                        if null_only(s1) && null_only(s2) {
                            return PointsToElement::Bottom;
                        } else if null_only(s1) {
                            let mut set = s2.clone();
                            set.remove(&Target::Null);
                            out.insert(v2.clone(), set);
                        } else if null_only(s2) {
                            let mut set = s1.clone();
                            set.remove(&Target::Null);
                            out.insert(v1.clone(), set);
                        }
                        // Two sites from the same allocation statement can
                        // still be distinct arrays, so nothing can be removed
                        // when neither side is exactly {null}.
                    }
                    _ => unreachable!(),
                }
            }
            // Integer comparisons and untracked operands say nothing about
            // references.
            _ => {}
        }
        PointsToElement::Reach(out)
    }
}

impl Domain for PointsToDomain<'_> {
    type Element = PointsToElement;

    fn bottom(&self) -> PointsToElement {
        PointsToElement::Bottom
    }

    /// Per-variable union of target sets.
    ///
    /// # Panics
    ///
    /// Panics if the two elements track different variable sets; that can
    /// only happen when elements from different methods are mixed.
    fn join(&self, a: &PointsToElement, b: &PointsToElement) -> PointsToElement {
        let (ma, mb) = match (a, b) {
            (PointsToElement::Bottom, _) => return b.clone(),
            (_, PointsToElement::Bottom) => return a.clone(),
            (PointsToElement::Reach(ma), PointsToElement::Reach(mb)) => (ma, mb),
        };
        assert!(
            ma.len() == mb.len() && ma.keys().eq(mb.keys()),
            "Invalid abstract state: joined elements track different variables"
        );
        let out = ma
            .iter()
            .map(|(var, s1)| (var.clone(), s1.union(&mb[var]).copied().collect()))
            .collect();
        PointsToElement::Reach(out)
    }

    fn transfer(&self, elem: &PointsToElement, stmt: StmtId, on_true: bool) -> PointsToElement {
        let map = match elem {
            PointsToElement::Bottom => return PointsToElement::Bottom,
            PointsToElement::Reach(map) => map,
        };
        match self.method.stmt(stmt) {
            Stmt::Assign { target, rhs } if map.contains_key(target) => {
                self.transfer_assign(map, stmt, target, rhs)
            }
            Stmt::If { cond, .. } => self.transfer_guard(map, cond, on_true),
            Stmt::Identity { target } if map.contains_key(target) => {
                // A parameter may alias any allocation or be null.
                let mut out = map.clone();
                out.insert(target.clone(), self.any_target());
                PointsToElement::Reach(out)
            }
            _ => elem.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::MethodBuilder;

    use test_log::test;

    // a = new int[3]; b = a; if (b == null) goto end; b = null; end: return
    fn alias_method() -> (Method, Var, Var) {
        let mut b = MethodBuilder::new("alias");
        let a = b.array_var("a");
        let bb = b.array_var("b");
        b.push(Stmt::Assign {
            target: a.clone(),
            rhs: Rhs::NewArray {
                len: Operand::Const(3),
            },
        });
        b.push(Stmt::Assign {
            target: bb.clone(),
            rhs: Rhs::Operand(Operand::Var(a.clone())),
        });
        b.push(Stmt::If {
            cond: Cond {
                lhs: Operand::Var(bb.clone()),
                op: CmpOp::Eq,
                rhs: Operand::Null,
            },
            target: StmtId::new(4),
        });
        b.push(Stmt::Assign {
            target: bb.clone(),
            rhs: Rhs::Operand(Operand::Null),
        });
        b.push(Stmt::Return);
        (b.build(), a, bb)
    }

    fn site(id: usize) -> Target {
        Target::Site(AllocSite::new(StmtId::new(id)))
    }

    fn set(targets: &[Target]) -> TargetSet {
        targets.iter().copied().collect()
    }

    #[test]
    fn test_initial_is_all_null() {
        let (m, a, bb) = alias_method();
        let d = PointsToDomain::new(&m);
        let init = d.initial();
        assert_eq!(init.get(&a), Some(&set(&[Target::Null])));
        assert_eq!(init.get(&bb), Some(&set(&[Target::Null])));
    }

    #[test]
    fn test_allocation_and_copy() {
        let (m, a, bb) = alias_method();
        let d = PointsToDomain::new(&m);
        assert_eq!(d.sites(), &[AllocSite::new(StmtId::new(0))]);

        let after_alloc = d.transfer(&d.initial(), StmtId::new(0), false);
        assert_eq!(after_alloc.get(&a), Some(&set(&[site(0)])));

        let after_copy = d.transfer(&after_alloc, StmtId::new(1), false);
        assert_eq!(after_copy.get(&bb), Some(&set(&[site(0)])));
    }

    #[test]
    fn test_null_assignment() {
        let (m, _, bb) = alias_method();
        let d = PointsToDomain::new(&m);
        let e = d.transfer(&d.initial(), StmtId::new(0), false);
        let e = d.transfer(&e, StmtId::new(1), false);
        let e = d.transfer(&e, StmtId::new(3), false);
        assert_eq!(e.get(&bb), Some(&set(&[Target::Null])));
    }

    #[test]
    fn test_null_guard_narrows() {
        let (m, a, bb) = alias_method();
        let d = PointsToDomain::new(&m);

        let mut map = BTreeMap::new();
        map.insert(a.clone(), set(&[site(0)]));
        map.insert(bb.clone(), set(&[Target::Null, site(0)]));
        let e = PointsToElement::Reach(map);

        // if (b == null): true branch keeps {null}, false branch keeps the site.
        let t = d.transfer(&e, StmtId::new(2), true);
        assert_eq!(t.get(&bb), Some(&set(&[Target::Null])));
        let f = d.transfer(&e, StmtId::new(2), false);
        assert_eq!(f.get(&bb), Some(&set(&[site(0)])));
    }

    #[test]
    fn test_null_guard_infeasible() {
        let (m, a, bb) = alias_method();
        let d = PointsToDomain::new(&m);

        // b cannot be null, so the == null branch is dead.
        let mut map = BTreeMap::new();
        map.insert(a.clone(), set(&[site(0)]));
        map.insert(bb.clone(), set(&[site(0)]));
        let e = PointsToElement::Reach(map);
        assert!(d.transfer(&e, StmtId::new(2), true).is_bottom());

        // b can only be null, so the != null branch is dead.
        let mut map = BTreeMap::new();
        map.insert(a.clone(), set(&[site(0)]));
        map.insert(bb.clone(), set(&[Target::Null]));
        let e = PointsToElement::Reach(map);
        assert!(d.transfer(&e, StmtId::new(2), false).is_bottom());
    }

    #[test]
    fn test_var_var_guard() {
        let mut b = MethodBuilder::new("m");
        let x = b.array_var("x");
        let y = b.array_var("y");
        b.push(Stmt::Assign {
            target: x.clone(),
            rhs: Rhs::NewArray {
                len: Operand::Const(1),
            },
        });
        b.push(Stmt::Assign {
            target: y.clone(),
            rhs: Rhs::NewArray {
                len: Operand::Const(1),
            },
        });
        let if_id = b.push(Stmt::If {
            cond: Cond {
                lhs: Operand::Var(x.clone()),
                op: CmpOp::Eq,
                rhs: Operand::Var(y.clone()),
            },
            target: StmtId::new(3),
        });
        b.push(Stmt::Return);
        let m = b.build();
        let d = PointsToDomain::new(&m);

        let mut map = BTreeMap::new();
        map.insert(x.clone(), set(&[Target::Null, site(0)]));
        map.insert(y.clone(), set(&[site(0), site(1)]));
        let e = PointsToElement::Reach(map);

        // x == y: both narrow to the common targets.
        let t = d.transfer(&e, if_id, true);
        assert_eq!(t.get(&x), Some(&set(&[site(0)])));
        assert_eq!(t.get(&y), Some(&set(&[site(0)])));

        // x != y with neither side exactly {null}: nothing can be removed.
        let f = d.transfer(&e, if_id, false);
        assert_eq!(f, e);

        // x != y with x exactly {null}: null drops out of y.
        let mut map = BTreeMap::new();
        map.insert(x.clone(), set(&[Target::Null]));
        map.insert(y.clone(), set(&[Target::Null, site(1)]));
        let e = PointsToElement::Reach(map);
        let f = d.transfer(&e, if_id, false);
        assert_eq!(f.get(&y), Some(&set(&[site(1)])));

        // x == y with disjoint targets is infeasible.
        let mut map = BTreeMap::new();
        map.insert(x.clone(), set(&[site(0)]));
        map.insert(y.clone(), set(&[site(1)]));
        let e = PointsToElement::Reach(map);
        assert!(d.transfer(&e, if_id, true).is_bottom());
    }

    #[test]
    fn test_identity_is_any_target() {
        let mut b = MethodBuilder::new("m");
        let x = b.array_var("x");
        let id0 = b.push(Stmt::Identity { target: x.clone() });
        b.push(Stmt::Assign {
            target: x.clone(),
            rhs: Rhs::NewArray {
                len: Operand::Const(2),
            },
        });
        let m = b.build();
        let d = PointsToDomain::new(&m);

        let e = d.transfer(&d.initial(), id0, false);
        assert_eq!(e.get(&x), Some(&set(&[Target::Null, site(1)])));
    }

    #[test]
    fn test_join_is_union() {
        let (m, a, bb) = alias_method();
        let d = PointsToDomain::new(&m);

        let mut m1 = BTreeMap::new();
        m1.insert(a.clone(), set(&[site(0)]));
        m1.insert(bb.clone(), set(&[Target::Null]));
        let e1 = PointsToElement::Reach(m1);

        let mut m2 = BTreeMap::new();
        m2.insert(a.clone(), set(&[site(0)]));
        m2.insert(bb.clone(), set(&[site(0)]));
        let e2 = PointsToElement::Reach(m2);

        let j = d.join(&e1, &e2);
        assert_eq!(j.get(&a), Some(&set(&[site(0)])));
        assert_eq!(j.get(&bb), Some(&set(&[Target::Null, site(0)])));

        // Bottom is the identity.
        assert_eq!(d.join(&d.bottom(), &e1), e1);
        assert_eq!(d.join(&e2, &d.bottom()), e2);
    }

    #[test]
    fn test_join_laws() {
        let (m, a, bb) = alias_method();
        let d = PointsToDomain::new(&m);

        let reach = |sa: &[Target], sb: &[Target]| {
            let mut map = BTreeMap::new();
            map.insert(a.clone(), set(sa));
            map.insert(bb.clone(), set(sb));
            PointsToElement::Reach(map)
        };
        let e1 = reach(&[site(0)], &[Target::Null]);
        let e2 = reach(&[Target::Null], &[site(0)]);
        let e3 = reach(&[Target::Null, site(0)], &[site(0)]);

        // Idempotent, commutative, associative.
        assert_eq!(d.join(&e1, &e1), e1);
        assert_eq!(d.join(&e1, &e2), d.join(&e2, &e1));
        assert_eq!(
            d.join(&d.join(&e1, &e2), &e3),
            d.join(&e1, &d.join(&e2, &e3)),
        );
        assert_eq!(
            d.join(&e1, &e2),
            reach(&[Target::Null, site(0)], &[Target::Null, site(0)]),
        );
    }

    #[test]
    fn test_transfer_monotone_on_null_guard() {
        // s0: x = new ..; s1: y = new ..; s2: if x == y goto s3; s3: return
        let mut b = MethodBuilder::new("m");
        let x = b.array_var("x");
        let y = b.array_var("y");
        b.push(Stmt::Assign {
            target: x.clone(),
            rhs: Rhs::NewArray {
                len: Operand::Const(1),
            },
        });
        b.push(Stmt::Assign {
            target: y.clone(),
            rhs: Rhs::NewArray {
                len: Operand::Const(1),
            },
        });
        let if_id = b.push(Stmt::If {
            cond: Cond {
                lhs: Operand::Var(x.clone()),
                op: CmpOp::Eq,
                rhs: Operand::Var(y.clone()),
            },
            target: StmtId::new(3),
        });
        b.push(Stmt::Return);
        let m = b.build();
        let d = PointsToDomain::new(&m);

        let reach = |sx: &[Target], sy: &[Target]| {
            let mut map = BTreeMap::new();
            map.insert(x.clone(), set(sx));
            map.insert(y.clone(), set(sy));
            PointsToElement::Reach(map)
        };

        // On the != edge, the smaller element (x exactly {null}) narrows y
        // while the larger one stays put; the outputs must stay ordered.
        let small = reach(&[Target::Null], &[Target::Null, site(1)]);
        let large = reach(&[Target::Null, site(0)], &[Target::Null, site(1)]);
        assert_eq!(d.join(&small, &large), large);

        let ts = d.transfer(&small, if_id, false);
        let tl = d.transfer(&large, if_id, false);
        assert_eq!(ts, reach(&[Target::Null], &[site(1)]));
        assert_eq!(tl, large);
        assert_eq!(d.join(&ts, &tl), tl);

        // Same check on the == edge.
        let ts = d.transfer(&small, if_id, true);
        let tl = d.transfer(&large, if_id, true);
        assert_eq!(d.join(&ts, &tl), tl);
    }

    #[test]
    #[should_panic(expected = "Invalid abstract state")]
    fn test_join_rejects_mismatched_variables() {
        let (m, a, bb) = alias_method();
        let d = PointsToDomain::new(&m);

        let mut m1 = BTreeMap::new();
        m1.insert(a, set(&[site(0)]));
        let mut m2 = BTreeMap::new();
        m2.insert(bb, set(&[Target::Null]));
        d.join(&PointsToElement::Reach(m1), &PointsToElement::Reach(m2));
    }
}
