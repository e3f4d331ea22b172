//! Expression AST.
//!
//! Expressions are immutable values built with the fluent methods on
//! [`ColumnRef`] and [`Expr`]:
//!
//! ```rust
//! use oxide_evolve_core::query::{col, Expr};
//!
//! let filter = col("users", "age")
//!     .gt_eq(18)
//!     .and(col("users", "name").like("A%"));
//! assert!(matches!(filter, Expr::And(ref children) if children.len() == 2));
//! ```

use std::ops::{Add, Div, Mul, Not, Sub};

use super::value::{SqlValue, ToSqlValue};

/// Creates a table-qualified column reference.
#[must_use]
pub fn col(table: &str, name: &str) -> ColumnRef {
    ColumnRef {
        table: Some(String::from(table)),
        name: String::from(name),
    }
}

/// Creates an unqualified column reference.
#[must_use]
pub fn column(name: &str) -> ColumnRef {
    ColumnRef {
        table: None,
        name: String::from(name),
    }
}

/// A column reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Optional table qualifier.
    pub table: Option<String>,
    /// Column name.
    pub name: String,
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// `COUNT`.
    Count,
    /// `SUM`.
    Sum,
    /// `AVG`.
    Avg,
    /// `MIN`.
    Min,
    /// `MAX`.
    Max,
}

impl AggregateFunction {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

impl MathOp {
    /// Returns the operator symbol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
}

impl CompareOp {
    /// Returns the operator symbol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column.
    Column(ColumnRef),
    /// A constant, bound as a parameter.
    Constant(SqlValue),
    /// An aggregate over a column, or `COUNT(*)` without one.
    Aggregate {
        /// Function.
        function: AggregateFunction,
        /// Aggregated column.
        column: Option<ColumnRef>,
    },
    /// Arithmetic.
    Math {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: MathOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Comparison.
    Compare {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `value BETWEEN low AND high`.
    Between {
        /// Tested value.
        value: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
    },
    /// `value [NOT] IN (set)`.
    In {
        /// Tested value.
        value: Box<Expr>,
        /// Candidate set.
        set: Vec<Expr>,
        /// `NOT IN` when set.
        negated: bool,
    },
    /// N-ary conjunction.
    And(Vec<Expr>),
    /// N-ary disjunction.
    Or(Vec<Expr>),
    /// Negation.
    Not(Box<Expr>),
}

impl Expr {
    /// Creates a bound constant.
    #[must_use]
    pub fn constant<T: ToSqlValue>(value: T) -> Self {
        Self::Constant(value.to_sql_value())
    }

    fn compare(self, op: CompareOp, right: impl Into<Self>) -> Self {
        Self::Compare {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    fn math(self, op: MathOp, right: impl Into<Self>) -> Self {
        Self::Math {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    /// `self = right`
    #[must_use]
    pub fn eq(self, right: impl Into<Self>) -> Self {
        self.compare(CompareOp::Eq, right)
    }

    /// `self <> right`
    #[must_use]
    pub fn not_eq(self, right: impl Into<Self>) -> Self {
        self.compare(CompareOp::NotEq, right)
    }

    /// `self < right`
    #[must_use]
    pub fn lt(self, right: impl Into<Self>) -> Self {
        self.compare(CompareOp::Lt, right)
    }

    /// `self <= right`
    #[must_use]
    pub fn lt_eq(self, right: impl Into<Self>) -> Self {
        self.compare(CompareOp::LtEq, right)
    }

    /// `self > right`
    #[must_use]
    pub fn gt(self, right: impl Into<Self>) -> Self {
        self.compare(CompareOp::Gt, right)
    }

    /// `self >= right`
    #[must_use]
    pub fn gt_eq(self, right: impl Into<Self>) -> Self {
        self.compare(CompareOp::GtEq, right)
    }

    /// `self LIKE pattern`
    #[must_use]
    pub fn like(self, pattern: impl Into<Self>) -> Self {
        self.compare(CompareOp::Like, pattern)
    }

    /// `self NOT LIKE pattern`
    #[must_use]
    pub fn not_like(self, pattern: impl Into<Self>) -> Self {
        self.compare(CompareOp::NotLike, pattern)
    }

    /// `self BETWEEN low AND high`
    #[must_use]
    pub fn between(self, low: impl Into<Self>, high: impl Into<Self>) -> Self {
        Self::Between {
            value: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
        }
    }

    /// `self IN (values)`
    #[must_use]
    pub fn in_set<I, T>(self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::In {
            value: Box::new(self),
            set: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// `self NOT IN (values)`
    #[must_use]
    pub fn not_in<I, T>(self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::In {
            value: Box::new(self),
            set: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// Conjunction, flattening nested `AND`s.
    #[must_use]
    pub fn and(self, other: impl Into<Self>) -> Self {
        let mut children = match self {
            Self::And(children) => children,
            other => vec![other],
        };
        match other.into() {
            Self::And(more) => children.extend(more),
            other => children.push(other),
        }
        Self::And(children)
    }

    /// Disjunction, flattening nested `OR`s.
    #[must_use]
    pub fn or(self, other: impl Into<Self>) -> Self {
        let mut children = match self {
            Self::Or(children) => children,
            other => vec![other],
        };
        match other.into() {
            Self::Or(more) => children.extend(more),
            other => children.push(other),
        }
        Self::Or(children)
    }

    /// Returns whether this node renders without operators.
    pub(crate) const fn is_atomic(&self) -> bool {
        matches!(
            self,
            Self::Column(_) | Self::Constant(_) | Self::Aggregate { .. }
        )
    }
}

/// Conjunction of all expressions.
#[must_use]
pub fn all<I: IntoIterator<Item = Expr>>(exprs: I) -> Expr {
    Expr::And(exprs.into_iter().collect())
}

/// Disjunction of all expressions.
#[must_use]
pub fn any<I: IntoIterator<Item = Expr>>(exprs: I) -> Expr {
    Expr::Or(exprs.into_iter().collect())
}

/// `COUNT(*)`
#[must_use]
pub const fn count_all() -> Expr {
    Expr::Aggregate {
        function: AggregateFunction::Count,
        column: None,
    }
}

fn aggregate(function: AggregateFunction, column: ColumnRef) -> Expr {
    Expr::Aggregate {
        function,
        column: Some(column),
    }
}

/// `COUNT(column)`
#[must_use]
pub fn count(column: ColumnRef) -> Expr {
    aggregate(AggregateFunction::Count, column)
}

/// `SUM(column)`
#[must_use]
pub fn sum(column: ColumnRef) -> Expr {
    aggregate(AggregateFunction::Sum, column)
}

/// `AVG(column)`
#[must_use]
pub fn avg(column: ColumnRef) -> Expr {
    aggregate(AggregateFunction::Avg, column)
}

/// `MIN(column)`
#[must_use]
pub fn min(column: ColumnRef) -> Expr {
    aggregate(AggregateFunction::Min, column)
}

/// `MAX(column)`
#[must_use]
pub fn max(column: ColumnRef) -> Expr {
    aggregate(AggregateFunction::Max, column)
}

macro_rules! column_forwarders {
    ($($(#[$doc:meta])* $name:ident),*) => {
        impl ColumnRef {
            $(
                $(#[$doc])*
                #[must_use]
                pub fn $name(self, right: impl Into<Expr>) -> Expr {
                    Expr::Column(self).$name(right)
                }
            )*

            /// `self BETWEEN low AND high`
            #[must_use]
            pub fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
                Expr::Column(self).between(low, high)
            }

            /// `self IN (values)`
            #[must_use]
            pub fn in_set<I, T>(self, values: I) -> Expr
            where
                I: IntoIterator<Item = T>,
                T: Into<Expr>,
            {
                Expr::Column(self).in_set(values)
            }

            /// `self NOT IN (values)`
            #[must_use]
            pub fn not_in<I, T>(self, values: I) -> Expr
            where
                I: IntoIterator<Item = T>,
                T: Into<Expr>,
            {
                Expr::Column(self).not_in(values)
            }
        }
    };
}

column_forwarders!(
    /// `self = right`
    eq,
    /// `self <> right`
    not_eq,
    /// `self < right`
    lt,
    /// `self <= right`
    lt_eq,
    /// `self > right`
    gt,
    /// `self >= right`
    gt_eq,
    /// `self LIKE pattern`
    like,
    /// `self NOT LIKE pattern`
    not_like
);

impl From<ColumnRef> for Expr {
    fn from(column: ColumnRef) -> Self {
        Self::Column(column)
    }
}

macro_rules! constant_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Self::Constant(value.to_sql_value())
                }
            }
        )*
    };
}

constant_from!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str, Vec<u8>, SqlValue);

macro_rules! math_ops {
    ($($trait:ident $method:ident $op:ident),*) => {
        $(
            impl<T: Into<Expr>> $trait<T> for Expr {
                type Output = Expr;

                fn $method(self, right: T) -> Expr {
                    self.math(MathOp::$op, right)
                }
            }

            impl<T: Into<Expr>> $trait<T> for ColumnRef {
                type Output = Expr;

                fn $method(self, right: T) -> Expr {
                    Expr::Column(self).math(MathOp::$op, right)
                }
            }
        )*
    };
}

math_ops!(Add add Add, Sub sub Subtract, Mul mul Multiply, Div div Divide);

impl Not for Expr {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_flattens() {
        let expr = column("a").eq(1).and(column("b").eq(2)).and(column("c").eq(3));
        assert!(matches!(expr, Expr::And(ref children) if children.len() == 3));
    }

    #[test]
    fn test_or_keeps_nested_and() {
        let expr = column("a").eq(1).and(column("b").eq(2)).or(column("c").eq(3));
        let Expr::Or(children) = expr else {
            panic!("expected OR");
        };
        assert!(matches!(children[0], Expr::And(_)));
    }

    #[test]
    fn test_operators_build_math_nodes() {
        let expr = column("n") + 1;
        assert!(matches!(
            expr,
            Expr::Math {
                op: MathOp::Add,
                ..
            }
        ));
        let negated = !column("active").eq(true);
        assert!(matches!(negated, Expr::Not(_)));
    }

    #[test]
    fn test_in_set_converts_values() {
        let expr = column("id").in_set([1, 2, 3]);
        let Expr::In { set, negated, .. } = expr else {
            panic!("expected IN");
        };
        assert!(!negated);
        assert_eq!(set[2], Expr::Constant(SqlValue::Int(3)));
    }
}
