use crate::catalog::types::Value;
use crate::query::plan::Order;
use std::fmt;

/// A rendered statement: CQL text with `?` markers and the values bound to
/// them, in marker order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlStatement {
    pub text: String,
    pub values: Vec<Value>,
}

impl fmt::Display for CqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A native predicate. Token bounds are raw CQL and are never bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Eq(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    ContainsKey(String, Value),
    TokenGte { columns: Vec<String>, token: String },
    TokenLt { columns: Vec<String>, token: String },
    And(Box<Clause>, Box<Clause>),
}

impl Clause {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Clause {
        Clause::Eq(column.into(), value.into())
    }

    pub fn and(self, rhs: Clause) -> Clause {
        Clause::And(Box::new(self), Box::new(rhs))
    }

    /// Predicates the store only evaluates with `ALLOW FILTERING`.
    pub fn needs_allow_filtering(&self) -> bool {
        match self {
            Clause::ContainsKey(_, _) => true,
            Clause::And(left, right) => left.needs_allow_filtering() || right.needs_allow_filtering(),
            _ => false,
        }
    }

    /// The conjunction flattened into its leaf predicates.
    pub fn leaves(&self) -> Vec<&Clause> {
        match self {
            Clause::And(left, right) => {
                let mut out = left.leaves();
                out.extend(right.leaves());
                out
            }
            leaf => vec![leaf],
        }
    }

    fn render(&self, out: &mut String, values: &mut Vec<Value>) {
        fn binary(column: &str, op: &str, value: &Value, out: &mut String, values: &mut Vec<Value>) {
            out.push_str(column);
            out.push(' ');
            out.push_str(op);
            out.push_str(" ?");
            values.push(value.clone());
        }
        match self {
            Clause::Eq(c, v) => binary(c, "=", v, out, values),
            Clause::Gt(c, v) => binary(c, ">", v, out, values),
            Clause::Gte(c, v) => binary(c, ">=", v, out, values),
            Clause::Lt(c, v) => binary(c, "<", v, out, values),
            Clause::Lte(c, v) => binary(c, "<=", v, out, values),
            Clause::ContainsKey(c, v) => binary(c, "CONTAINS KEY", v, out, values),
            Clause::In(c, list) => {
                out.push_str(c);
                out.push_str(" IN (");
                out.push_str(&vec!["?"; list.len()].join(", "));
                out.push(')');
                values.extend(list.iter().cloned());
            }
            Clause::TokenGte { columns, token } => {
                out.push_str(&format!("token({}) >= {token}", columns.join(", ")));
            }
            Clause::TokenLt { columns, token } => {
                out.push_str(&format!("token({}) < {token}", columns.join(", ")));
            }
            Clause::And(left, right) => {
                left.render(out, values);
                out.push_str(" AND ");
                right.render(out, values);
            }
        }
    }
}

fn render_where(clauses: &[Clause], out: &mut String, values: &mut Vec<Value>) {
    for (i, clause) in clauses.iter().enumerate() {
        out.push_str(if i == 0 { " WHERE " } else { " AND " });
        clause.render(out, values);
    }
}

/// Parameters shared by every select generated for one query. Each branch
/// gets its own [`Select`] from [`SelectBase::statement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectBase {
    table: String,
    limit: Option<u64>,
    orders: Vec<(String, Order)>,
}

impl SelectBase {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            limit: None,
            orders: Vec::new(),
        }
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.orders.push((column.into(), order));
        self
    }

    pub fn statement(&self) -> Select {
        Select {
            table: self.table.clone(),
            clauses: Vec::new(),
            orders: self.orders.clone(),
            limit: self.limit,
            allow_filtering: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub table: String,
    pub clauses: Vec<Clause>,
    pub orders: Vec<(String, Order)>,
    pub limit: Option<u64>,
    pub allow_filtering: bool,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        SelectBase::new(table).statement()
    }

    pub fn where_(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn allow_filtering(mut self) -> Self {
        self.allow_filtering = true;
        self
    }

    pub fn to_cql(&self) -> CqlStatement {
        let mut text = format!("SELECT * FROM {}", self.table);
        let mut values = Vec::new();
        render_where(&self.clauses, &mut text, &mut values);
        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|(c, o)| format!("{c} {}", o.as_cql()))
                .collect();
            text.push_str(" ORDER BY ");
            text.push_str(&orders.join(", "));
        }
        if let Some(limit) = self.limit {
            text.push_str(&format!(" LIMIT {limit}"));
        }
        if self.allow_filtering {
            text.push_str(" ALLOW FILTERING");
        }
        text.push(';');
        CqlStatement { text, values }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insert {
    pub table: String,
    pub values: Vec<(String, Value)>,
}

impl Insert {
    pub fn to_cql(&self) -> CqlStatement {
        let columns: Vec<&str> = self.values.iter().map(|(c, _)| c.as_str()).collect();
        let text = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.table,
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        CqlStatement {
            text,
            values: self.values.iter().map(|(_, v)| v.clone()).collect(),
        }
    }
}

/// Collection assignments of an `UPDATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// `c = c + value` for a set or map value.
    Append { column: String, value: Value },
    /// `c = c - value` where value is a set (of elements or of map keys).
    RemoveAll { column: String, value: Value },
    /// `c = c - {value}` for a single element.
    Remove { column: String, value: Value },
}

impl Assignment {
    pub fn column(&self) -> &str {
        match self {
            Assignment::Append { column, .. }
            | Assignment::RemoveAll { column, .. }
            | Assignment::Remove { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub clauses: Vec<Clause>,
}

impl Update {
    pub fn to_cql(&self) -> CqlStatement {
        let mut values = Vec::new();
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|a| match a {
                Assignment::Append { column, value } => {
                    values.push(value.clone());
                    format!("{column} = {column} + ?")
                }
                Assignment::RemoveAll { column, value } => {
                    values.push(value.clone());
                    format!("{column} = {column} - ?")
                }
                Assignment::Remove { column, value } => {
                    values.push(value.clone());
                    format!("{column} = {column} - {{?}}")
                }
            })
            .collect();
        let mut text = format!("UPDATE {} SET {}", self.table, sets.join(", "));
        render_where(&self.clauses, &mut text, &mut values);
        text.push(';');
        CqlStatement { text, values }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    pub table: String,
    pub clauses: Vec<Clause>,
}

impl Delete {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            clauses: Vec::new(),
        }
    }

    pub fn where_(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn to_cql(&self) -> CqlStatement {
        let mut text = format!("DELETE FROM {}", self.table);
        let mut values = Vec::new();
        render_where(&self.clauses, &mut text, &mut values);
        text.push(';');
        CqlStatement { text, values }
    }
}

/// A mutation staged on a session batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Statement {
    pub fn table(&self) -> &str {
        match self {
            Statement::Insert(s) => &s.table,
            Statement::Update(s) => &s.table,
            Statement::Delete(s) => &s.table,
        }
    }

    pub fn to_cql(&self) -> CqlStatement {
        match self {
            Statement::Insert(s) => s.to_cql(),
            Statement::Update(s) => s.to_cql(),
            Statement::Delete(s) => s.to_cql(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Assignment, Clause, Delete, Insert, Select, SelectBase, Update};
    use crate::catalog::types::Value;
    use crate::query::plan::Order;

    #[test]
    fn select_renders_every_part_in_order() {
        let stmt = SelectBase::new("edges")
            .limit(10)
            .order_by("LABEL", Order::Desc)
            .statement()
            .where_(Clause::In(
                "OWNER_VERTEX".into(),
                vec![Value::text("a"), Value::text("b")],
            ))
            .where_(Clause::ContainsKey("PROPERTIES".into(), Value::text("age")))
            .allow_filtering()
            .to_cql();
        assert_eq!(
            stmt.text,
            "SELECT * FROM edges WHERE OWNER_VERTEX IN (?, ?) AND PROPERTIES CONTAINS KEY ? \
             ORDER BY LABEL DESC LIMIT 10 ALLOW FILTERING;"
        );
        assert_eq!(
            stmt.values,
            vec![Value::text("a"), Value::text("b"), Value::text("age")]
        );
    }

    #[test]
    fn token_bounds_are_inlined() {
        let clause = Clause::TokenGte {
            columns: vec!["ID".into()],
            token: "-9223372036854775808".into(),
        }
        .and(Clause::TokenLt {
            columns: vec!["ID".into()],
            token: "0".into(),
        });
        let stmt = Select::from("vertices").where_(clause).to_cql();
        assert_eq!(
            stmt.text,
            "SELECT * FROM vertices WHERE token(ID) >= -9223372036854775808 AND token(ID) < 0;"
        );
        assert!(stmt.values.is_empty());
    }

    #[test]
    fn contains_key_inside_conjunction_needs_filtering() {
        let clause = Clause::eq("LABEL", "person")
            .and(Clause::ContainsKey("PROPERTIES".into(), Value::text("age")));
        assert!(clause.needs_allow_filtering());
        assert!(!Clause::eq("LABEL", "person").needs_allow_filtering());
        assert_eq!(clause.leaves().len(), 2);
    }

    #[test]
    fn mutation_statements_render() {
        let insert = Insert {
            table: "vertices".into(),
            values: vec![
                ("ID".into(), Value::text("1")),
                ("LABEL".into(), Value::text("person")),
            ],
        };
        assert_eq!(
            insert.to_cql().text,
            "INSERT INTO vertices (ID, LABEL) VALUES (?, ?);"
        );

        let update = Update {
            table: "secondary_indexes".into(),
            assignments: vec![
                Assignment::Append {
                    column: "ELEMENT_IDS".into(),
                    value: Value::set(["1"]),
                },
                Assignment::Remove {
                    column: "ELEMENT_IDS".into(),
                    value: Value::text("2"),
                },
            ],
            clauses: vec![Clause::eq("FIELD_VALUES", "marko")],
        };
        assert_eq!(
            update.to_cql().text,
            "UPDATE secondary_indexes SET ELEMENT_IDS = ELEMENT_IDS + ?, \
             ELEMENT_IDS = ELEMENT_IDS - {?} WHERE FIELD_VALUES = ?;"
        );

        let delete = Delete::from("edges").where_(Clause::eq("OWNER_VERTEX", "1"));
        assert_eq!(
            delete.to_cql().text,
            "DELETE FROM edges WHERE OWNER_VERTEX = ?;"
        );
    }
}
