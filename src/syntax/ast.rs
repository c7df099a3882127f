// VTL syntax tree definitions

use crate::model::Role;
use crate::syntax::operator::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Line and column of a node in the source script (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Integer(i64),
    Number(f64),
    Boolean(bool),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Constant(Literal),
    VarId(String),
    Boolean {
        op: BooleanOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Arithmetic {
        op: ArithmeticOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    ArithmeticOrConcat {
        op: AdditiveOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    Parenthesis(Box<Node>),
    Comparison {
        op: ComparisonOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    InNotIn {
        negated: bool,
        operand: Box<Node>,
        list: Vec<Literal>,
    },
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },
    Function {
        category: FunctionCategory,
        name: String,
        args: Vec<Node>,
    },
    Join {
        kind: JoinKind,
        operands: Vec<JoinOperand>,
        #[serde(default)]
        using: Vec<String>,
    },
    Clause {
        dataset: Box<Node>,
        clause: Clause,
    },
}

/// A dataset taking part in a join, optionally aliased
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinOperand {
    pub dataset: Node,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Dataset clauses, written `ds[clause]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Clause {
    Calc(Vec<CalcItem>),
    Filter(Box<Node>),
    Rename(Vec<RenameItem>),
    Keep(Vec<String>),
    Drop(Vec<String>),
    Aggregate {
        items: Vec<AggregateItem>,
        #[serde(default)]
        group_by: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcItem {
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
    pub expression: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameItem {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateItem {
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
    pub function: AggregateOperator,
    #[serde(default)]
    pub operand: Option<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `name := expression`
    Assignment { name: String, expression: Node },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Single-assignment program
    pub fn assign(name: impl Into<String>, expression: Node) -> Self {
        Self::new(vec![Statement::Assignment {
            name: name.into(),
            expression,
        }])
    }
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.position = Some(Position::new(line, column));
        self
    }

    pub fn constant(literal: Literal) -> Self {
        Self::new(NodeKind::Constant(literal))
    }

    pub fn null() -> Self {
        Self::constant(Literal::Null)
    }

    pub fn integer(value: i64) -> Self {
        Self::constant(Literal::Integer(value))
    }

    pub fn number(value: f64) -> Self {
        Self::constant(Literal::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::constant(Literal::Boolean(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::constant(Literal::String(value.into()))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::new(NodeKind::VarId(name.into()))
    }

    pub fn logical(op: BooleanOperator, left: Node, right: Node) -> Self {
        Self::new(NodeKind::Boolean {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::logical(BooleanOperator::And, left, right)
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::logical(BooleanOperator::Or, left, right)
    }

    pub fn xor(left: Node, right: Node) -> Self {
        Self::logical(BooleanOperator::Xor, left, right)
    }

    pub fn mul(left: Node, right: Node) -> Self {
        Self::new(NodeKind::Arithmetic {
            op: ArithmeticOperator::Mul,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn div(left: Node, right: Node) -> Self {
        Self::new(NodeKind::Arithmetic {
            op: ArithmeticOperator::Div,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn additive(op: AdditiveOperator, left: Node, right: Node) -> Self {
        Self::new(NodeKind::ArithmeticOrConcat {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOperator, operand: Node) -> Self {
        Self::new(NodeKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn parenthesis(inner: Node) -> Self {
        Self::new(NodeKind::Parenthesis(Box::new(inner)))
    }

    pub fn compare(op: ComparisonOperator, left: Node, right: Node) -> Self {
        Self::new(NodeKind::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn in_list(operand: Node, list: Vec<Literal>, negated: bool) -> Self {
        Self::new(NodeKind::InNotIn {
            negated,
            operand: Box::new(operand),
            list,
        })
    }

    pub fn if_then_else(condition: Node, then_branch: Node, else_branch: Node) -> Self {
        Self::new(NodeKind::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    pub fn function(category: FunctionCategory, name: impl Into<String>, args: Vec<Node>) -> Self {
        Self::new(NodeKind::Function {
            category,
            name: name.into(),
            args,
        })
    }

    pub fn join(kind: JoinKind, operands: Vec<JoinOperand>, using: Vec<String>) -> Self {
        Self::new(NodeKind::Join {
            kind,
            operands,
            using,
        })
    }

    pub fn clause(dataset: Node, clause: Clause) -> Self {
        Self::new(NodeKind::Clause {
            dataset: Box::new(dataset),
            clause,
        })
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Number(n) => write!(f, "{:?}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Constant(literal) => write!(f, "{}", literal),
            NodeKind::VarId(name) => f.write_str(name),
            NodeKind::Boolean { op, left, right } => write!(f, "{} {} {}", left, op, right),
            NodeKind::Arithmetic { op, left, right } => write!(f, "{} {} {}", left, op, right),
            NodeKind::ArithmeticOrConcat { op, left, right } => {
                write!(f, "{} {} {}", left, op, right)
            }
            NodeKind::Unary { op, operand } => write!(f, "{}{}", op, operand),
            NodeKind::Parenthesis(inner) => write!(f, "({})", inner),
            NodeKind::Comparison { op, left, right } => write!(f, "{} {} {}", left, op, right),
            NodeKind::InNotIn {
                negated,
                operand,
                list,
            } => {
                write!(f, "{} {} {{", operand, if *negated { "not_in" } else { "in" })?;
                write_list(f, list)?;
                f.write_str("}")
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => write!(
                f,
                "if {} then {} else {}",
                condition, then_branch, else_branch
            ),
            NodeKind::Function { name, args, .. } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            NodeKind::Join {
                kind,
                operands,
                using,
            } => {
                write!(f, "{}(", kind)?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", operand.dataset)?;
                    if let Some(alias) = &operand.alias {
                        write!(f, " as {}", alias)?;
                    }
                }
                if !using.is_empty() {
                    f.write_str(" using ")?;
                    write_list(f, using)?;
                }
                f.write_str(")")
            }
            NodeKind::Clause { dataset, clause } => write!(f, "{}[{}]", dataset, clause),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Calc(items) => {
                f.write_str("calc ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} := {}", item.name, item.expression)?;
                }
                Ok(())
            }
            Clause::Filter(predicate) => write!(f, "filter {}", predicate),
            Clause::Rename(items) => {
                f.write_str("rename ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} to {}", item.from, item.to)?;
                }
                Ok(())
            }
            Clause::Keep(names) => {
                f.write_str("keep ")?;
                write_list(f, names)
            }
            Clause::Drop(names) => {
                f.write_str("drop ")?;
                write_list(f, names)
            }
            Clause::Aggregate { items, group_by } => {
                f.write_str("aggr ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} := {}(", item.name, item.function)?;
                    if let Some(operand) = &item.operand {
                        write!(f, "{}", operand)?;
                    }
                    f.write_str(")")?;
                }
                if !group_by.is_empty() {
                    f.write_str(" group by ")?;
                    write_list(f, group_by)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_display() {
        let node = Node::if_then_else(
            Node::and(Node::var("a"), Node::boolean(true)),
            Node::mul(Node::integer(3), Node::number(2.5)),
            Node::null(),
        );
        assert_eq!(node.to_string(), "if a and true then 3 * 2.5 else null");

        let node = Node::clause(
            Node::var("ds"),
            Clause::Rename(vec![RenameItem {
                from: "a".to_string(),
                to: "b".to_string(),
            }]),
        );
        assert_eq!(node.to_string(), "ds[rename a to b]");
    }

    #[test]
    fn test_node_json_round_trip() {
        let node = Node::function(
            FunctionCategory::Set,
            "union",
            vec![Node::var("ds1"), Node::var("ds2").at(1, 14)],
        );
        let json = serde_json::to_string(&node).unwrap();
        let parsed: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, node);
        assert!(!json.contains("\"position\":null"));
    }
}
