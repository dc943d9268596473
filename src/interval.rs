//! Bounded integer-interval abstract domain.
//!
//! Tracks, per integer variable, an interval over the extended integers.
//! The domain is parameterised by a finite window `[L, U]`: any finite bound
//! escaping the window is widened to the matching infinity, which keeps the
//! lattice finite-height for a fixed variable set.
//!
//! Every freshly built element goes through the same normalization pipeline,
//! in this order:
//!
//! 1. any interval with `low > high` collapses the whole element to bottom;
//! 2. bounds are contracted to integers (with `i64` endpoints this holds by
//!    construction; division applies ceil/floor rounding per corner, which
//!    commutes with the min/max corner selection);
//! 3. finite bounds strictly outside the window are replaced by infinities.

use std::cmp::{max, min};
use std::collections::BTreeMap;
use std::fmt;

use crate::ir::{BinOp, CmpOp, Cond, Method, Operand, Rhs, Stmt, StmtId, Var};
use crate::lattice::Domain;

/// Bound of an interval: -inf, a finite integer, or +inf.
///
/// The derived ordering places `NegInf` below every finite bound and
/// `PosInf` above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    NegInf,
    Finite(i64),
    PosInf,
}

impl Bound {
    pub fn is_finite(self) -> bool {
        matches!(self, Bound::Finite(_))
    }

    pub fn as_finite(self) -> Option<i64> {
        match self {
            Bound::Finite(n) => Some(n),
            _ => None,
        }
    }

    pub fn add(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.saturating_add(b)),
            // Valid endpoint sums never mix opposite infinities: a low bound
            // of +inf (or a high bound of -inf) requires a degenerate
            // caller-built interval.
            (Bound::NegInf, Bound::PosInf) | (Bound::PosInf, Bound::NegInf) => {
                debug_assert!(false, "Adding opposite infinities");
                Bound::PosInf
            }
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
        }
    }

    pub fn sub(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.saturating_sub(b)),
            (Bound::PosInf, Bound::NegInf) => Bound::PosInf,
            (Bound::NegInf, Bound::PosInf) => Bound::NegInf,
            (Bound::PosInf, _) => Bound::PosInf,
            (Bound::NegInf, _) => Bound::NegInf,
            (_, Bound::PosInf) => Bound::NegInf,
            (_, Bound::NegInf) => Bound::PosInf,
        }
    }

    pub fn mul(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => Bound::Finite(a.saturating_mul(b)),
            (Bound::Finite(0), _) | (_, Bound::Finite(0)) => Bound::Finite(0),
            (Bound::PosInf, Bound::PosInf) | (Bound::NegInf, Bound::NegInf) => Bound::PosInf,
            (Bound::PosInf, Bound::NegInf) | (Bound::NegInf, Bound::PosInf) => Bound::NegInf,
            (Bound::PosInf, Bound::Finite(b)) | (Bound::Finite(b), Bound::PosInf) => {
                if b > 0 {
                    Bound::PosInf
                } else {
                    Bound::NegInf
                }
            }
            (Bound::NegInf, Bound::Finite(b)) | (Bound::Finite(b), Bound::NegInf) => {
                if b > 0 {
                    Bound::NegInf
                } else {
                    Bound::PosInf
                }
            }
        }
    }

    pub fn neg(self) -> Bound {
        match self {
            Bound::NegInf => Bound::PosInf,
            Bound::Finite(n) => Bound::Finite(n.saturating_neg()),
            Bound::PosInf => Bound::NegInf,
        }
    }

    /// Next integer up; infinities are fixed points.
    pub fn succ(self) -> Bound {
        match self {
            Bound::Finite(n) => Bound::Finite(n.saturating_add(1)),
            b => b,
        }
    }

    /// Next integer down; infinities are fixed points.
    pub fn pred(self) -> Bound {
        match self {
            Bound::Finite(n) => Bound::Finite(n.saturating_sub(1)),
            b => b,
        }
    }

    /// Quotient rounded toward -inf. The divisor must not be zero.
    fn div_floor(self, other: Bound) -> Bound {
        debug_assert_ne!(other, Bound::Finite(0), "Division by a zero bound");
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => {
                let q = a / b;
                if a % b != 0 && (a < 0) != (b < 0) {
                    Bound::Finite(q - 1)
                } else {
                    Bound::Finite(q)
                }
            }
            (Bound::Finite(_), _) => Bound::Finite(0),
            (Bound::PosInf, Bound::Finite(b)) => {
                if b > 0 {
                    Bound::PosInf
                } else {
                    Bound::NegInf
                }
            }
            (Bound::NegInf, Bound::Finite(b)) => {
                if b > 0 {
                    Bound::NegInf
                } else {
                    Bound::PosInf
                }
            }
            (Bound::PosInf, Bound::PosInf) | (Bound::NegInf, Bound::NegInf) => Bound::PosInf,
            (Bound::PosInf, Bound::NegInf) | (Bound::NegInf, Bound::PosInf) => Bound::NegInf,
        }
    }

    /// Quotient rounded toward +inf. The divisor must not be zero.
    fn div_ceil(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => {
                let q = a / b;
                if a % b != 0 && (a < 0) == (b < 0) {
                    Bound::Finite(q + 1)
                } else {
                    Bound::Finite(q)
                }
            }
            _ => self.div_floor(other),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInf => write!(f, "-inf"),
            Bound::Finite(n) => write!(f, "{}", n),
            Bound::PosInf => write!(f, "inf"),
        }
    }
}

/// An interval `[low, high]` over the extended integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub low: Bound,
    pub high: Bound,
}

impl Interval {
    pub fn new(low: Bound, high: Bound) -> Self {
        Self { low, high }
    }

    /// The single-point interval `[c, c]`.
    pub fn point(c: i64) -> Self {
        Self {
            low: Bound::Finite(c),
            high: Bound::Finite(c),
        }
    }

    /// The full interval `[-inf, inf]`.
    pub fn top() -> Self {
        Self {
            low: Bound::NegInf,
            high: Bound::PosInf,
        }
    }

    pub fn is_empty(self) -> bool {
        self.low > self.high
    }

    pub fn is_point(self) -> bool {
        self.low == self.high
    }

    pub fn join(self, other: Interval) -> Interval {
        Interval::new(min(self.low, other.low), max(self.high, other.high))
    }

    /// The negated interval `[-high, -low]`.
    pub fn neg(self) -> Interval {
        Interval::new(self.high.neg(), self.low.neg())
    }

    /// Applies the normalization pipeline (see module docs).
    ///
    /// Returns `None` when the interval is empty, which collapses the
    /// containing element to bottom.
    pub fn normalized(self, window: Window) -> Option<Interval> {
        if self.is_empty() {
            return None;
        }
        // Integer contract: i64 bounds are integral by construction.
        let low = if self.low < window.low { Bound::NegInf } else { self.low };
        let high = if self.high > window.high { Bound::PosInf } else { self.high };
        Some(Interval::new(low, high))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// The tracked finite window `[L, U]` of the interval domain.
///
/// Finite bounds strictly outside the window are widened to infinities
/// during normalization. This deliberately non-standard clamp policy is
/// what keeps the domain finite-height; downstream safety verdicts depend
/// on it, so it is applied exactly as stated and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub low: Bound,
    pub high: Bound,
}

impl Window {
    /// A window with the given finite limits.
    ///
    /// # Panics
    ///
    /// Panics if `low > high`.
    pub fn new(low: i64, high: i64) -> Self {
        assert!(low <= high, "Window limits must satisfy low <= high");
        Self {
            low: Bound::Finite(low),
            high: Bound::Finite(high),
        }
    }

    /// The unbounded window: no clamping takes place.
    pub fn unbounded() -> Self {
        Self {
            low: Bound::NegInf,
            high: Bound::PosInf,
        }
    }
}

/// Interval image of a binary operation over two input intervals.
///
/// Returns `None` only for division by the exact interval `{0}` (an
/// infeasible path). Results may come back empty and are collapsed by the
/// element constructor.
pub fn binop(op: BinOp, a: Interval, b: Interval) -> Option<Interval> {
    match op {
        BinOp::Add => Some(Interval::new(a.low.add(b.low), a.high.add(b.high))),
        BinOp::Sub => Some(Interval::new(a.low.sub(b.high), a.high.sub(b.low))),
        BinOp::Mul => {
            let corners = [
                a.low.mul(b.low),
                a.low.mul(b.high),
                a.high.mul(b.low),
                a.high.mul(b.high),
            ];
            let low = corners.iter().copied().min().unwrap_or(Bound::NegInf);
            let high = corners.iter().copied().max().unwrap_or(Bound::PosInf);
            Some(Interval::new(low, high))
        }
        BinOp::Div => {
            let zero = Bound::Finite(0);
            if b.low == zero && b.high == zero {
                // Dividing by exactly {0}: infeasible.
                None
            } else if b.low == zero {
                // Divisor touches zero from above: substitute 1 for the low end.
                Some(div_corners(a, &[Bound::Finite(1), b.high]))
            } else if b.high == zero {
                // Divisor touches zero from below: substitute -1 for the high end.
                Some(div_corners(a, &[b.low, Bound::Finite(-1)]))
            } else if b.low < zero && b.high > zero {
                // Divisor straddles zero: split into the negative and positive
                // sub-ranges and join the two results.
                Some(div_corners(
                    a,
                    &[b.low, Bound::Finite(-1), Bound::Finite(1), b.high],
                ))
            } else {
                Some(div_corners(a, &[b.low, b.high]))
            }
        }
        // Operators without precise interval semantics degrade to top.
        BinOp::Rem => Some(Interval::top()),
    }
}

/// Min/max over the corner quotients of `a` against the given divisor ends.
///
/// The low end rounds up and the high end rounds down; monotone rounding
/// commutes with min/max, so this equals "divide exactly, then contract to
/// integers".
fn div_corners(a: Interval, divisors: &[Bound]) -> Interval {
    let mut low = Bound::PosInf;
    let mut high = Bound::NegInf;
    for &n in &[a.low, a.high] {
        for &d in divisors {
            low = min(low, n.div_ceil(d));
            high = max(high, n.div_floor(d));
        }
    }
    Interval::new(low, high)
}

/// Narrows `(a, b)` under the comparison `a op b` holding.
///
/// Returns `None` when the comparison cannot hold (infeasible branch).
pub fn compare(op: CmpOp, a: Interval, b: Interval) -> Option<(Interval, Interval)> {
    match op {
        CmpOp::Lt => {
            if a.low >= b.high {
                return None;
            }
            let na = Interval::new(a.low, min(a.high, b.high.pred()));
            let nb = Interval::new(max(a.low.succ(), b.low), b.high);
            Some((na, nb))
        }
        CmpOp::Gt => {
            let (nb, na) = compare(CmpOp::Lt, b, a)?;
            Some((na, nb))
        }
        CmpOp::Le => {
            if a.low > b.high {
                return None;
            }
            let na = Interval::new(a.low, min(a.high, b.high));
            let nb = Interval::new(max(a.low, b.low), b.high);
            Some((na, nb))
        }
        CmpOp::Ge => {
            let (nb, na) = compare(CmpOp::Le, b, a)?;
            Some((na, nb))
        }
        CmpOp::Eq => {
            if a.low > b.high || a.high < b.low {
                return None;
            }
            let meet = Interval::new(max(a.low, b.low), min(a.high, b.high));
            Some((meet, meet))
        }
        CmpOp::Ne => {
            if a.is_point() && b.is_point() && a.low == b.low {
                return None;
            }
            let mut na = a;
            let mut nb = b;
            // A single point sitting on the other operand's endpoint shaves
            // that endpoint off by one.
            if a.is_point() && a.low == b.low {
                nb.low = nb.low.succ();
            } else if a.is_point() && a.low == b.high {
                nb.high = nb.high.pred();
            } else if b.is_point() && b.low == a.low {
                na.low = na.low.succ();
            } else if b.is_point() && b.low == a.high {
                na.high = na.high.pred();
            }
            Some((na, nb))
        }
    }
}

/// Abstract value of the interval domain at one program point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalElement {
    /// Unreachable or contradictory state.
    Bottom,
    /// Reachable state: one interval per tracked integer variable.
    Reach(BTreeMap<Var, Interval>),
}

impl IntervalElement {
    pub fn is_bottom(&self) -> bool {
        matches!(self, IntervalElement::Bottom)
    }

    /// The interval tracked for a variable, if any.
    pub fn get(&self, var: &Var) -> Option<Interval> {
        match self {
            IntervalElement::Bottom => None,
            IntervalElement::Reach(map) => map.get(var).copied(),
        }
    }
}

impl fmt::Display for IntervalElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalElement::Bottom => write!(f, "bot"),
            IntervalElement::Reach(map) => {
                write!(f, "{{")?;
                for (i, (var, interval)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", var, interval)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// The interval domain for one method, with its configured window.
#[derive(Debug, Clone)]
pub struct IntervalDomain<'m> {
    method: &'m Method,
    window: Window,
}

impl<'m> IntervalDomain<'m> {
    pub fn new(method: &'m Method, window: Window) -> Self {
        Self { method, window }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// The entry element: every integer variable is unconstrained.
    pub fn initial(&self) -> IntervalElement {
        let map = self
            .method
            .int_vars()
            .iter()
            .map(|v| (v.clone(), Interval::top()))
            .collect();
        IntervalElement::Reach(map)
    }

    /// Builds an element from a raw map, applying normalization to every
    /// interval; any empty interval collapses the element to bottom.
    fn mk(&self, map: BTreeMap<Var, Interval>) -> IntervalElement {
        let mut out = BTreeMap::new();
        for (var, interval) in map {
            match interval.normalized(self.window) {
                Some(n) => {
                    out.insert(var, n);
                }
                None => return IntervalElement::Bottom,
            }
        }
        IntervalElement::Reach(out)
    }

    /// Interval of an operand: tracked variable or literal constant.
    fn operand_interval(&self, map: &BTreeMap<Var, Interval>, op: &Operand) -> Option<Interval> {
        match op {
            Operand::Const(c) => Some(Interval::point(*c)),
            Operand::Var(v) => map.get(v).copied(),
            Operand::Null => None,
        }
    }

    fn transfer_assign(
        &self,
        map: &BTreeMap<Var, Interval>,
        target: &Var,
        rhs: &Rhs,
    ) -> IntervalElement {
        let mut out = map.clone();
        match rhs {
            Rhs::Operand(Operand::Const(c)) => {
                out.insert(target.clone(), Interval::point(*c));
            }
            Rhs::Operand(Operand::Var(v2)) => {
                let interval = map.get(v2).copied().unwrap_or_else(Interval::top);
                out.insert(target.clone(), interval);
            }
            Rhs::Neg(v2) => {
                let interval = map.get(v2).copied().map_or_else(Interval::top, Interval::neg);
                out.insert(target.clone(), interval);
            }
            Rhs::Binary { op, lhs, rhs } => {
                match (
                    self.operand_interval(map, lhs),
                    self.operand_interval(map, rhs),
                ) {
                    (Some(a), Some(b)) => match binop(*op, a, b) {
                        Some(interval) => {
                            out.insert(target.clone(), interval);
                        }
                        None => {
                            log::trace!("{} {} {}: division by {{0}}, collapsing", lhs, op, rhs);
                            return IntervalElement::Bottom;
                        }
                    },
                    // An untracked operand leaves the result unknown.
                    _ => {
                        out.insert(target.clone(), Interval::top());
                    }
                }
            }
            // Null, allocation and array-load right-hand sides carry no
            // integer value the domain understands: pass through.
            Rhs::Operand(Operand::Null) | Rhs::NewArray { .. } | Rhs::ArrayLoad { .. } => {
                return IntervalElement::Reach(map.clone());
            }
        }
        self.mk(out)
    }

    fn transfer_guard(
        &self,
        map: &BTreeMap<Var, Interval>,
        cond: &Cond,
        on_true: bool,
    ) -> IntervalElement {
        let op = cond.op.on_branch(on_true);
        let mut out = map.clone();
        match (&cond.lhs, &cond.rhs) {
            (Operand::Var(v), Operand::Const(c)) if map.contains_key(v) => {
                match compare(op, map[v], Interval::point(*c)) {
                    Some((na, _)) => {
                        out.insert(v.clone(), na);
                    }
                    None => return IntervalElement::Bottom,
                }
            }
            (Operand::Const(c), Operand::Var(v)) if map.contains_key(v) => {
                match compare(op, Interval::point(*c), map[v]) {
                    Some((_, nb)) => {
                        out.insert(v.clone(), nb);
                    }
                    None => return IntervalElement::Bottom,
                }
            }
            (Operand::Var(v1), Operand::Var(v2))
                if map.contains_key(v1) && map.contains_key(v2) =>
            {
                match compare(op, map[v1], map[v2]) {
                    Some((n1, n2)) => {
                        out.insert(v1.clone(), n1);
                        out.insert(v2.clone(), n2);
                    }
                    None => return IntervalElement::Bottom,
                }
            }
            // Untracked operands: the guard tells us nothing.
            _ => return IntervalElement::Reach(map.clone()),
        }
        self.mk(out)
    }
}

impl Domain for IntervalDomain<'_> {
    type Element = IntervalElement;

    fn bottom(&self) -> IntervalElement {
        IntervalElement::Bottom
    }

    /// Per-variable min/max of the two elements.
    ///
    /// # Panics
    ///
    /// Panics if the two elements track different variable sets; that can
    /// only happen when elements from different methods are mixed.
    fn join(&self, a: &IntervalElement, b: &IntervalElement) -> IntervalElement {
        let (ma, mb) = match (a, b) {
            (IntervalElement::Bottom, _) => return b.clone(),
            (_, IntervalElement::Bottom) => return a.clone(),
            (IntervalElement::Reach(ma), IntervalElement::Reach(mb)) => (ma, mb),
        };
        assert!(
            ma.len() == mb.len() && ma.keys().eq(mb.keys()),
            "Invalid abstract state: joined elements track different variables"
        );
        let out = ma
            .iter()
            .map(|(var, &i1)| (var.clone(), i1.join(mb[var])))
            .collect();
        self.mk(out)
    }

    fn transfer(&self, elem: &IntervalElement, stmt: StmtId, on_true: bool) -> IntervalElement {
        let map = match elem {
            IntervalElement::Bottom => return IntervalElement::Bottom,
            IntervalElement::Reach(map) => map,
        };
        match self.method.stmt(stmt) {
            Stmt::Assign { target, rhs } if map.contains_key(target) => {
                self.transfer_assign(map, target, rhs)
            }
            Stmt::If { cond, .. } => self.transfer_guard(map, cond, on_true),
            Stmt::Identity { target } if map.contains_key(target) => {
                // Parameter binds carry no value information.
                let mut out = map.clone();
                out.insert(target.clone(), Interval::top());
                self.mk(out)
            }
            // Untracked targets and unrecognized shapes: pass through.
            _ => elem.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::MethodBuilder;

    use test_log::test;

    fn method_xy() -> Method {
        let mut b = MethodBuilder::new("m");
        b.int_var("x");
        b.int_var("y");
        b.push(Stmt::Return);
        b.build()
    }

    fn elem(pairs: &[(&str, Interval)]) -> IntervalElement {
        IntervalElement::Reach(
            pairs
                .iter()
                .map(|(name, i)| (Var::new(*name), *i))
                .collect(),
        )
    }

    fn fin(low: i64, high: i64) -> Interval {
        Interval::new(Bound::Finite(low), Bound::Finite(high))
    }

    #[test]
    fn test_bound_ordering() {
        assert!(Bound::NegInf < Bound::Finite(i64::MIN));
        assert!(Bound::Finite(i64::MAX) < Bound::PosInf);
        assert!(Bound::Finite(-1) < Bound::Finite(1));
    }

    #[test]
    fn test_normalization_empty_is_none() {
        assert_eq!(fin(5, 3).normalized(Window::unbounded()), None);
        assert!(fin(3, 3).normalized(Window::unbounded()).is_some());
    }

    #[test]
    fn test_normalization_clamps_to_infinity() {
        let w = Window::new(0, 10);
        assert_eq!(
            fin(-5, 12).normalized(w),
            Some(Interval::top()),
        );
        assert_eq!(fin(0, 10).normalized(w), Some(fin(0, 10)));
        assert_eq!(
            fin(3, 11).normalized(w),
            Some(Interval::new(Bound::Finite(3), Bound::PosInf)),
        );
    }

    #[test]
    fn test_binop_add_sub() {
        assert_eq!(binop(BinOp::Add, fin(1, 2), fin(10, 20)), Some(fin(11, 22)));
        assert_eq!(binop(BinOp::Sub, fin(1, 2), fin(10, 20)), Some(fin(-19, -8)));
    }

    #[test]
    #[should_panic(expected = "opposite infinities")]
    fn test_binop_add_rejects_degenerate_interval() {
        // A low bound of +inf cannot come out of normalization.
        let degenerate = Interval::new(Bound::PosInf, Bound::PosInf);
        let _ = binop(BinOp::Add, Interval::new(Bound::NegInf, Bound::Finite(0)), degenerate);
    }

    #[test]
    fn test_binop_mul_corners() {
        assert_eq!(binop(BinOp::Mul, fin(-2, 3), fin(4, 5)), Some(fin(-10, 15)));
        assert_eq!(binop(BinOp::Mul, fin(-2, -1), fin(-3, -2)), Some(fin(2, 6)));
    }

    #[test]
    fn test_binop_div_by_zero_interval() {
        assert_eq!(binop(BinOp::Div, fin(1, 10), fin(0, 0)), None);
    }

    #[test]
    fn test_binop_div_excluding_zero() {
        assert_eq!(binop(BinOp::Div, fin(10, 20), fin(2, 5)), Some(fin(2, 10)));
        assert_eq!(binop(BinOp::Div, fin(-20, -10), fin(2, 5)), Some(fin(-10, -2)));
    }

    #[test]
    fn test_binop_div_zero_touching_end() {
        // [10, 20] / [0, 5]: low end substituted by 1.
        assert_eq!(binop(BinOp::Div, fin(10, 20), fin(0, 5)), Some(fin(2, 20)));
        // [10, 20] / [-5, 0]: high end substituted by -1.
        assert_eq!(binop(BinOp::Div, fin(10, 20), fin(-5, 0)), Some(fin(-20, -2)));
    }

    #[test]
    fn test_binop_div_straddling_zero() {
        assert_eq!(binop(BinOp::Div, fin(6, 6), fin(-2, 3)), Some(fin(-6, 6)));
    }

    #[test]
    fn test_binop_div_rounding_collapses() {
        // 1/2 rounds to the empty interval [1, 0]; the element constructor
        // turns this into bottom.
        let r = binop(BinOp::Div, fin(1, 1), fin(2, 2)).unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn test_binop_rem_is_top() {
        assert_eq!(binop(BinOp::Rem, fin(1, 2), fin(3, 4)), Some(Interval::top()));
    }

    #[test]
    fn test_compare_lt() {
        let (a, b) = compare(CmpOp::Lt, fin(0, 10), fin(5, 5)).unwrap();
        assert_eq!(a, fin(0, 4));
        assert_eq!(b, fin(5, 5));
        assert_eq!(compare(CmpOp::Lt, fin(5, 10), fin(0, 5)), None);
    }

    #[test]
    fn test_compare_eq_intersection() {
        let (a, b) = compare(CmpOp::Eq, fin(0, 10), fin(5, 15)).unwrap();
        assert_eq!(a, fin(5, 10));
        assert_eq!(b, fin(5, 10));
        assert_eq!(compare(CmpOp::Eq, fin(0, 4), fin(5, 9)), None);
    }

    #[test]
    fn test_compare_ne_endpoint_shrink() {
        // Point on the other's high endpoint shaves it off.
        let (a, _) = compare(CmpOp::Ne, fin(0, 10), fin(10, 10)).unwrap();
        assert_eq!(a, fin(0, 9));
        let (a, _) = compare(CmpOp::Ne, fin(0, 10), fin(0, 0)).unwrap();
        assert_eq!(a, fin(1, 10));
        // Identical points are contradictory.
        assert_eq!(compare(CmpOp::Ne, fin(5, 5), fin(5, 5)), None);
        // Interior points change nothing.
        let (a, b) = compare(CmpOp::Ne, fin(0, 10), fin(5, 5)).unwrap();
        assert_eq!((a, b), (fin(0, 10), fin(5, 5)));
    }

    #[test]
    fn test_join_laws() {
        let m = method_xy();
        let d = IntervalDomain::new(&m, Window::unbounded());
        let bot = d.bottom();
        let e1 = elem(&[("x", fin(0, 5))]);
        let e2 = elem(&[("x", fin(3, 10))]);
        let e3 = elem(&[("x", fin(-2, 2))]);

        // Bottom is the identity.
        assert_eq!(d.join(&bot, &e1), e1);
        assert_eq!(d.join(&e1, &bot), e1);
        // Idempotent, commutative, associative.
        assert_eq!(d.join(&e1, &e1), e1);
        assert_eq!(d.join(&e1, &e2), d.join(&e2, &e1));
        assert_eq!(
            d.join(&d.join(&e1, &e2), &e3),
            d.join(&e1, &d.join(&e2, &e3)),
        );
        assert_eq!(d.join(&e1, &e2), elem(&[("x", fin(0, 10))]));
    }

    #[test]
    #[should_panic(expected = "Invalid abstract state")]
    fn test_join_rejects_mismatched_variables() {
        let m = method_xy();
        let d = IntervalDomain::new(&m, Window::unbounded());
        d.join(&elem(&[("x", fin(0, 1))]), &elem(&[("y", fin(0, 1))]));
    }

    #[test]
    fn test_transfer_constant_assignment() {
        // x initialized to top with window [0, 10]; after x = 5, x is [5, 5].
        let mut b = MethodBuilder::new("m");
        let x = b.int_var("x");
        let s0 = b.push(Stmt::Assign {
            target: x.clone(),
            rhs: Rhs::Operand(Operand::Const(5)),
        });
        let m = b.build();
        let d = IntervalDomain::new(&m, Window::new(0, 10));

        let out = d.transfer(&d.initial(), s0, false);
        assert_eq!(out.get(&x), Some(fin(5, 5)));
    }

    #[test]
    fn test_transfer_guard_both_branches() {
        // if (x < 5) with x:[0, 10]: true edge [0, 4], false edge [5, 10].
        let mut b = MethodBuilder::new("m");
        let x = b.int_var("x");
        let s0 = b.push(Stmt::If {
            cond: Cond {
                lhs: Operand::Var(x.clone()),
                op: CmpOp::Lt,
                rhs: Operand::Const(5),
            },
            target: StmtId::new(0),
        });
        let m = b.build();
        let d = IntervalDomain::new(&m, Window::unbounded());
        let input = elem(&[("x", fin(0, 10))]);

        let t = d.transfer(&input, s0, true);
        assert_eq!(t.get(&x), Some(fin(0, 4)));
        let f = d.transfer(&input, s0, false);
        assert_eq!(f.get(&x), Some(fin(5, 10)));
    }

    #[test]
    fn test_transfer_guard_infeasible_branch() {
        let mut b = MethodBuilder::new("m");
        let x = b.int_var("x");
        let s0 = b.push(Stmt::If {
            cond: Cond {
                lhs: Operand::Var(x.clone()),
                op: CmpOp::Lt,
                rhs: Operand::Const(5),
            },
            target: StmtId::new(0),
        });
        let m = b.build();
        let d = IntervalDomain::new(&m, Window::unbounded());

        // x:[7, 9] can never satisfy x < 5.
        let input = elem(&[("x", fin(7, 9))]);
        assert!(d.transfer(&input, s0, true).is_bottom());
        assert_eq!(d.transfer(&input, s0, false).get(&x), Some(fin(7, 9)));
    }

    #[test]
    fn test_transfer_negation_and_copy() {
        let mut b = MethodBuilder::new("m");
        let x = b.int_var("x");
        let y = b.int_var("y");
        let s0 = b.push(Stmt::Assign {
            target: x.clone(),
            rhs: Rhs::Neg(y.clone()),
        });
        let s1 = b.push(Stmt::Assign {
            target: x.clone(),
            rhs: Rhs::Operand(Operand::Var(y.clone())),
        });
        let m = b.build();
        let d = IntervalDomain::new(&m, Window::unbounded());
        let input = elem(&[("x", Interval::top()), ("y", fin(2, 5))]);

        assert_eq!(d.transfer(&input, s0, false).get(&x), Some(fin(-5, -2)));
        assert_eq!(d.transfer(&input, s1, false).get(&x), Some(fin(2, 5)));
    }

    #[test]
    fn test_transfer_untracked_passthrough() {
        let mut b = MethodBuilder::new("m");
        let x = b.int_var("x");
        let a = b.array_var("a");
        // Assignment to an array variable is invisible to this domain.
        let s0 = b.push(Stmt::Assign {
            target: a,
            rhs: Rhs::NewArray {
                len: Operand::Var(x.clone()),
            },
        });
        let m = b.build();
        let d = IntervalDomain::new(&m, Window::unbounded());
        let input = elem(&[("x", fin(1, 2))]);

        assert_eq!(d.transfer(&input, s0, false), input);
    }

    #[test]
    fn test_transfer_identity_is_top() {
        let mut b = MethodBuilder::new("m");
        let x = b.int_var("x");
        let s0 = b.push(Stmt::Identity { target: x.clone() });
        let m = b.build();
        let d = IntervalDomain::new(&m, Window::unbounded());
        let input = elem(&[("x", fin(1, 2))]);

        assert_eq!(d.transfer(&input, s0, false).get(&x), Some(Interval::top()));
    }

    #[test]
    fn test_transfer_monotone_on_assignment() {
        let mut b = MethodBuilder::new("m");
        let x = b.int_var("x");
        let y = b.int_var("y");
        let s0 = b.push(Stmt::Assign {
            target: x.clone(),
            rhs: Rhs::Binary {
                op: BinOp::Add,
                lhs: Operand::Var(y.clone()),
                rhs: Operand::Const(1),
            },
        });
        let m = b.build();
        let d = IntervalDomain::new(&m, Window::unbounded());

        let small = elem(&[("x", fin(0, 0)), ("y", fin(1, 2))]);
        let large = elem(&[("x", fin(0, 0)), ("y", fin(0, 5))]);
        assert_eq!(d.join(&small, &large), large);

        let ts = d.transfer(&small, s0, false);
        let tl = d.transfer(&large, s0, false);
        assert_eq!(d.join(&ts, &tl), tl);
    }

    #[test]
    fn test_bottom_annihilates() {
        let mut b = MethodBuilder::new("m");
        let x = b.int_var("x");
        let s0 = b.push(Stmt::Assign {
            target: x,
            rhs: Rhs::Operand(Operand::Const(1)),
        });
        let m = b.build();
        let d = IntervalDomain::new(&m, Window::unbounded());
        assert!(d.transfer(&d.bottom(), s0, false).is_bottom());
        assert!(d.transfer(&d.bottom(), s0, true).is_bottom());
    }
}
