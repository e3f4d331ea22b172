//! Expression compilation to parameterized SQL.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::expr::{ColumnRef, CompareOp, Expr};
use super::value::SqlValue;
use crate::dialect::{Dialect, SchemaDialect};

/// A `:pN` placeholder, or a quoted identifier or literal to step over.
static NAMED_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"]|"")*"|`(?:[^`]|``)*`|'(?:[^']|'')*'|:(p\d+)\b"#)
        .expect("valid placeholder regex")
});

/// Hands out placeholder names `p1, p2, …` for one statement.
///
/// Share one allocator across every clause of a statement so that names
/// never collide; never share it across statements built concurrently.
#[derive(Debug, Default)]
pub struct ParamAllocator {
    issued: usize,
}

impl ParamAllocator {
    /// Creates an allocator starting at `p1`.
    #[must_use]
    pub const fn new() -> Self {
        Self { issued: 0 }
    }

    /// Returns a fresh placeholder name.
    pub fn next_name(&mut self) -> String {
        self.issued += 1;
        format!("p{}", self.issued)
    }

    /// Returns how many names were handed out.
    #[must_use]
    pub const fn issued(&self) -> usize {
        self.issued
    }
}

/// A placeholder name with its bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Placeholder name without the leading colon.
    pub name: String,
    /// Bound value.
    pub value: SqlValue,
}

/// Compiled SQL text with its bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// SQL text with `:pN` placeholders.
    pub sql: String,
    /// Bindings, in allocation order.
    pub bindings: Vec<Binding>,
}

/// Compiles an expression.
///
/// Columns are quoted, constants become fresh `:pN` placeholders, `AND`/`OR`
/// children are parenthesized, and `IN` over an empty or single-element set
/// is simplified.
#[must_use]
pub fn compile(allocator: &mut ParamAllocator, expr: &Expr, dialect: Dialect) -> Fragment {
    let mut writer = Writer::new(allocator, dialect);
    writer.expr(expr);
    writer.finish()
}

pub struct Writer<'a> {
    allocator: &'a mut ParamAllocator,
    dialect: &'static dyn SchemaDialect,
    fragment: Fragment,
}

impl<'a> Writer<'a> {
    pub fn new(allocator: &'a mut ParamAllocator, dialect: Dialect) -> Self {
        Self {
            allocator,
            dialect: dialect.renderer(),
            fragment: Fragment::default(),
        }
    }

    pub fn push(&mut self, sql: &str) {
        self.fragment.sql.push_str(sql);
    }

    pub fn identifier(&mut self, name: &str) {
        let quoted = self.dialect.quote_identifier(name);
        self.push(&quoted);
    }

    pub fn column(&mut self, column: &ColumnRef) {
        if let Some(ref table) = column.table {
            self.identifier(table);
            self.push(".");
        }
        self.identifier(&column.name);
    }

    pub fn bind(&mut self, value: &SqlValue) {
        let name = self.allocator.next_name();
        self.push(":");
        self.push(&name);
        self.fragment.bindings.push(Binding {
            name,
            value: value.clone(),
        });
    }

    pub fn finish(self) -> Fragment {
        self.fragment
    }

    pub fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Column(column) => self.column(column),
            Expr::Constant(value) => self.bind(value),
            Expr::Aggregate { function, column } => {
                self.push(function.as_str());
                self.push("(");
                match column {
                    Some(column) => self.column(column),
                    None => self.push("*"),
                }
                self.push(")");
            }
            Expr::Math { left, op, right } => {
                self.operand(left);
                self.push(" ");
                self.push(op.as_str());
                self.push(" ");
                self.operand(right);
            }
            Expr::Compare { left, op, right } => self.comparison(left, *op, right),
            Expr::Between { value, low, high } => {
                self.operand(value);
                self.push(" BETWEEN ");
                self.operand(low);
                self.push(" AND ");
                self.operand(high);
            }
            Expr::In {
                value,
                set,
                negated,
            } => match set.as_slice() {
                [] => self.push(if *negated { "TRUE" } else { "FALSE" }),
                [single] => {
                    let op = if *negated {
                        CompareOp::NotEq
                    } else {
                        CompareOp::Eq
                    };
                    self.comparison(value, op, single);
                }
                many => {
                    self.operand(value);
                    self.push(if *negated { " NOT IN (" } else { " IN (" });
                    for (i, item) in many.iter().enumerate() {
                        if i > 0 {
                            self.push(", ");
                        }
                        self.operand(item);
                    }
                    self.push(")");
                }
            },
            Expr::And(children) => self.junction(children, " AND ", "TRUE"),
            Expr::Or(children) => self.junction(children, " OR ", "FALSE"),
            Expr::Not(inner) => {
                self.push("NOT (");
                self.expr(inner);
                self.push(")");
            }
        }
    }

    fn comparison(&mut self, left: &Expr, op: CompareOp, right: &Expr) {
        self.operand(left);
        self.push(" ");
        self.push(op.as_str());
        self.push(" ");
        self.operand(right);
    }

    /// Writes an operand, parenthesized unless it is atomic.
    fn operand(&mut self, expr: &Expr) {
        if expr.is_atomic() {
            self.expr(expr);
        } else {
            self.push("(");
            self.expr(expr);
            self.push(")");
        }
    }

    fn junction(&mut self, children: &[Expr], separator: &str, empty: &str) {
        if children.is_empty() {
            self.push(empty);
            return;
        }
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.push("(");
            self.expr(child);
            self.push(")");
        }
    }
}

/// A full statement ready for execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    /// SQL text with `:pN` placeholders.
    pub sql: String,
    /// Bindings, in allocation order.
    pub bindings: Vec<Binding>,
}

impl CompiledQuery {
    /// Returns the value bound to `name`.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&SqlValue> {
        self.bindings
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.value)
    }

    /// Rewrites named placeholders to the dialect's positional style and
    /// returns the values in placeholder order.
    #[must_use]
    pub fn to_positional(&self, dialect: Dialect) -> (String, Vec<SqlValue>) {
        let renderer = dialect.renderer();
        let mut values = Vec::with_capacity(self.bindings.len());
        let sql = NAMED_PLACEHOLDER.replace_all(&self.sql, |caps: &Captures<'_>| {
            caps.get(1)
                .and_then(|name| self.binding(name.as_str()))
                .map_or_else(
                    || caps[0].to_string(),
                    |value| {
                        values.push(value.clone());
                        renderer.placeholder(values.len())
                    },
                )
        });
        (sql.into_owned(), values)
    }
}

impl From<Fragment> for CompiledQuery {
    fn from(fragment: Fragment) -> Self {
        Self {
            sql: fragment.sql,
            bindings: fragment.bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expr::{col, column, count_all, sum};

    fn sql(expr: &Expr) -> Fragment {
        compile(&mut ParamAllocator::new(), expr, Dialect::Postgres)
    }

    #[test]
    fn test_equality_binds_one_placeholder() {
        let fragment = sql(&column("c").eq(5));
        assert_eq!(fragment.sql, "\"c\" = :p1");
        assert_eq!(
            fragment.bindings,
            vec![Binding {
                name: "p1".into(),
                value: SqlValue::Int(5)
            }]
        );
    }

    #[test]
    fn test_qualified_column_quoting() {
        let fragment = compile(
            &mut ParamAllocator::new(),
            &col("users", "id").gt(3),
            Dialect::MySql,
        );
        assert_eq!(fragment.sql, "`users`.`id` > :p1");
    }

    #[test]
    fn test_in_simplifications() {
        assert_eq!(sql(&column("c").in_set(Vec::<i32>::new())).sql, "FALSE");
        assert_eq!(sql(&column("c").not_in(Vec::<i32>::new())).sql, "TRUE");
        assert_eq!(sql(&column("c").in_set([7])).sql, "\"c\" = :p1");
        assert_eq!(sql(&column("c").not_in([7])).sql, "\"c\" <> :p1");
        assert_eq!(
            sql(&column("c").in_set([1, 2])).sql,
            "\"c\" IN (:p1, :p2)"
        );
    }

    #[test]
    fn test_junction_children_are_parenthesized() {
        let expr = column("a")
            .eq(1)
            .or(column("b").eq(2))
            .and(!column("c").like("x%"));
        assert_eq!(
            sql(&expr).sql,
            "((\"a\" = :p1) OR (\"b\" = :p2)) AND (NOT (\"c\" LIKE :p3))"
        );
        assert_eq!(sql(&Expr::And(vec![])).sql, "TRUE");
        assert_eq!(sql(&Expr::Or(vec![])).sql, "FALSE");
    }

    #[test]
    fn test_nested_math_is_parenthesized() {
        let expr = (column("a") + 1) * column("b");
        assert_eq!(sql(&expr).sql, "(\"a\" + :p1) * \"b\"");
    }

    #[test]
    fn test_aggregates_and_between() {
        assert_eq!(sql(&count_all().gt(1)).sql, "COUNT(*) > :p1");
        assert_eq!(
            sql(&sum(col("o", "total")).between(10, 20)).sql,
            "SUM(\"o\".\"total\") BETWEEN :p1 AND :p2"
        );
    }

    #[test]
    fn test_allocator_is_shared() {
        let mut allocator = ParamAllocator::new();
        let first = compile(&mut allocator, &column("a").eq(1), Dialect::Sqlite);
        let second = compile(&mut allocator, &column("b").eq(2), Dialect::Sqlite);
        assert_eq!(first.sql, "\"a\" = :p1");
        assert_eq!(second.sql, "\"b\" = :p2");
        assert_eq!(allocator.issued(), 2);
    }

    #[test]
    fn test_to_positional() {
        let fragment = sql(&column("a").eq("x").and(column("b").gt(2)));
        let query = CompiledQuery::from(fragment);

        let (pg, values) = query.to_positional(Dialect::Postgres);
        assert_eq!(pg, "(\"a\" = $1) AND (\"b\" > $2)");
        assert_eq!(values, vec![SqlValue::Text("x".into()), SqlValue::Int(2)]);

        let (lite, _) = query.to_positional(Dialect::Sqlite);
        assert_eq!(lite, "(\"a\" = ?) AND (\"b\" > ?)");
    }

    #[test]
    fn test_to_positional_leaves_quoted_text_alone() {
        let query = CompiledQuery::from(sql(&column(":p1").eq(5).and(column("it's").eq(6))));
        assert_eq!(query.sql, "(\":p1\" = :p1) AND (\"it's\" = :p2)");

        let (pg, values) = query.to_positional(Dialect::Postgres);
        assert_eq!(pg, "(\":p1\" = $1) AND (\"it's\" = $2)");
        assert_eq!(values, vec![SqlValue::Int(5), SqlValue::Int(6)]);

        let query = CompiledQuery::from(compile(
            &mut ParamAllocator::new(),
            &column(":p1").eq(5),
            Dialect::MySql,
        ));
        assert_eq!(query.to_positional(Dialect::MySql).0, "`:p1` = ?");
    }
}
