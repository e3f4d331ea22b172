//! SELECT builder using the typestate pattern.

use std::marker::PhantomData;

use super::compile::{CompiledQuery, ParamAllocator, Writer};
use super::expr::{ColumnRef, Expr};
use crate::dialect::Dialect;

/// Marker: no projection yet.
pub struct NoColumns;
/// Marker: projection given.
pub struct HasColumns;
/// Marker: no FROM clause yet.
pub struct NoFrom;
/// Marker: FROM clause given.
pub struct HasFrom;

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `FULL JOIN`
    Full,
}

impl JoinKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

#[derive(Debug, Clone)]
struct Join {
    kind: JoinKind,
    table: String,
    left: ColumnRef,
    right: ColumnRef,
}

/// A SELECT statement builder.
///
/// `build()` is only available once both the projection and the FROM
/// clause are given; filtering, grouping and ordering only after FROM.
///
/// # Example
///
/// ```rust
/// use oxide_evolve_core::dialect::Dialect;
/// use oxide_evolve_core::query::{col, Select};
///
/// let query = Select::new()
///     .columns([col("users", "id"), col("users", "name")])
///     .from("users")
///     .where_clause(col("users", "age").gt(18))
///     .build(Dialect::Sqlite);
///
/// assert_eq!(
///     query.sql,
///     "SELECT \"users\".\"id\", \"users\".\"name\" FROM \"users\" WHERE \"users\".\"age\" > :p1"
/// );
/// ```
pub struct Select<Cols, From> {
    distinct: bool,
    columns: Vec<Expr>,
    from: Option<String>,
    joins: Vec<Join>,
    filter: Option<Expr>,
    group_by: Vec<ColumnRef>,
    having: Option<Expr>,
    order_by: Vec<(Expr, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    _state: PhantomData<(Cols, From)>,
}

impl Select<NoColumns, NoFrom> {
    /// Creates an empty SELECT.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            distinct: false,
            columns: Vec::new(),
            from: None,
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            _state: PhantomData,
        }
    }
}

impl Default for Select<NoColumns, NoFrom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cols, From> Select<Cols, From> {
    fn transition<C, F>(self) -> Select<C, F> {
        Select {
            distinct: self.distinct,
            columns: self.columns,
            from: self.from,
            joins: self.joins,
            filter: self.filter,
            group_by: self.group_by,
            having: self.having,
            order_by: self.order_by,
            limit: self.limit,
            offset: self.offset,
            _state: PhantomData,
        }
    }

    /// Adds DISTINCT.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

impl<From> Select<NoColumns, From> {
    /// Sets the projection: columns, aggregates or any expression.
    #[must_use]
    pub fn columns<I, T>(mut self, columns: I) -> Select<HasColumns, From>
    where
        I: IntoIterator<Item = T>,
        T: Into<Expr>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self.transition()
    }

    /// Selects `*`.
    #[must_use]
    pub fn all(mut self) -> Select<HasColumns, From> {
        self.columns.clear();
        self.transition()
    }
}

impl<Cols> Select<Cols, NoFrom> {
    /// Sets the table to select from.
    #[must_use]
    pub fn from(mut self, table: &str) -> Select<Cols, HasFrom> {
        self.from = Some(String::from(table));
        self.transition()
    }
}

impl<Cols> Select<Cols, HasFrom> {
    fn join(mut self, kind: JoinKind, table: &str, left: ColumnRef, right: ColumnRef) -> Self {
        self.joins.push(Join {
            kind,
            table: String::from(table),
            left,
            right,
        });
        self
    }

    /// Adds `INNER JOIN table ON left = right`.
    #[must_use]
    pub fn inner_join(self, table: &str, left: ColumnRef, right: ColumnRef) -> Self {
        self.join(JoinKind::Inner, table, left, right)
    }

    /// Adds `LEFT JOIN table ON left = right`.
    #[must_use]
    pub fn left_join(self, table: &str, left: ColumnRef, right: ColumnRef) -> Self {
        self.join(JoinKind::Left, table, left, right)
    }

    /// Adds `RIGHT JOIN table ON left = right`.
    #[must_use]
    pub fn right_join(self, table: &str, left: ColumnRef, right: ColumnRef) -> Self {
        self.join(JoinKind::Right, table, left, right)
    }

    /// Adds `FULL JOIN table ON left = right`.
    #[must_use]
    pub fn full_join(self, table: &str, left: ColumnRef, right: ColumnRef) -> Self {
        self.join(JoinKind::Full, table, left, right)
    }

    /// Sets the WHERE clause.
    #[must_use]
    pub fn where_clause(mut self, expr: Expr) -> Self {
        self.filter = Some(expr);
        self
    }

    /// Adds GROUP BY columns.
    #[must_use]
    pub fn group_by<I: IntoIterator<Item = ColumnRef>>(mut self, columns: I) -> Self {
        self.group_by.extend(columns);
        self
    }

    /// Sets the HAVING clause.
    #[must_use]
    pub fn having(mut self, expr: Expr) -> Self {
        self.having = Some(expr);
        self
    }

    /// Adds an ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, expr: impl Into<Expr>, order: Order) -> Self {
        self.order_by.push((expr.into(), order));
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets OFFSET.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }
}

impl Select<HasColumns, HasFrom> {
    /// Builds the statement.
    #[must_use]
    pub fn build(self, dialect: Dialect) -> CompiledQuery {
        let mut allocator = ParamAllocator::new();
        let mut w = Writer::new(&mut allocator, dialect);

        w.push("SELECT ");
        if self.distinct {
            w.push("DISTINCT ");
        }
        if self.columns.is_empty() {
            w.push("*");
        }
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.expr(column);
        }

        if let Some(ref table) = self.from {
            w.push(" FROM ");
            w.identifier(table);
        }
        for join in &self.joins {
            w.push(" ");
            w.push(join.kind.as_str());
            w.push(" ");
            w.identifier(&join.table);
            w.push(" ON ");
            w.column(&join.left);
            w.push(" = ");
            w.column(&join.right);
        }

        if let Some(ref filter) = self.filter {
            w.push(" WHERE ");
            w.expr(filter);
        }
        if !self.group_by.is_empty() {
            w.push(" GROUP BY ");
            for (i, column) in self.group_by.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.column(column);
            }
        }
        if let Some(ref having) = self.having {
            w.push(" HAVING ");
            w.expr(having);
        }
        if !self.order_by.is_empty() {
            w.push(" ORDER BY ");
            for (i, (expr, order)) in self.order_by.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.expr(expr);
                w.push(match order {
                    Order::Asc => " ASC",
                    Order::Desc => " DESC",
                });
            }
        }
        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            w.push(&format!(" OFFSET {offset}"));
        }

        w.finish().into()
    }
}
