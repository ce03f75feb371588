//! A small algebraic data type for Desmos LaTeX expressions.
//!
//! Building an AST and rendering it in one place (`Expr::to_latex`) is
//! deliberate: the source material builds LaTeX by direct `printf`/string
//! concatenation and is littered with backslash-count bugs as a result.
//! Going through tagged variants means every piece of syntax (piecewise
//! braces, action arrows, list brackets) is rendered exactly once.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CmpOp {
    fn latex(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "\\ne ",
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Le => "\\le ",
            CmpOp::Ge => "\\ge ",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Num(i64),
    /// An already-rendered symbol, e.g. `"a"` or `"m_{0}"`.
    Ident(String),
    Bin(BinOp, Box<Expr>, Box<Expr>),
    Frac(Box<Expr>, Box<Expr>),
    /// `\operatorname{name}\left(args\right)` — a built-in Desmos function.
    Builtin(String, Vec<Expr>),
    /// `name\left(args\right)` — a call to one of our own helper functions.
    Call(String, Vec<Expr>),
    List(Vec<Expr>),
    /// `list\left[index\right]`.
    Index(Box<Expr>, Box<Expr>),
    /// `\left[body\operatorname{for}var=\left[1,...,to\right]\right]` — a
    /// Desmos list comprehension, used to build `append`/`pop`/`store`.
    Map {
        var: String,
        to: Box<Expr>,
        body: Box<Expr>,
    },
    /// `\left\{c_1,c_2,\ldots:v_1,c_3:v_2,\ldots,else\right\}`. Each branch's
    /// conditions are comma-joined, which Desmos reads as their conjunction
    /// (logical AND), so `check(p,i)` is one branch with two conditions
    /// rather than a hand-rolled boolean-AND expression. `else` is omitted
    /// (the branch falls through to Desmos's native undefined) when `None`.
    Piecewise(Vec<(Vec<Expr>, Expr)>, Option<Box<Expr>>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    Sum {
        var: String,
        from: Box<Expr>,
        to: Box<Expr>,
        body: Box<Expr>,
    },
    /// A bundle of `var \to expr` assignments, comma-joined and parenthesised —
    /// a Desmos "action". Each variable may appear at most once (enforced by
    /// the lowerer, not here).
    Action(Vec<(String, Expr)>),
}

impl Expr {
    #[must_use]
    pub fn num(v: i64) -> Expr {
        Expr::Num(v)
    }

    #[must_use]
    pub fn ident(s: impl Into<String>) -> Expr {
        Expr::Ident(s.into())
    }

    #[must_use]
    pub fn add(self, rhs: Expr) -> Expr {
        Expr::Bin(BinOp::Add, Box::new(self), Box::new(rhs))
    }

    #[must_use]
    pub fn sub(self, rhs: Expr) -> Expr {
        Expr::Bin(BinOp::Sub, Box::new(self), Box::new(rhs))
    }

    #[must_use]
    pub fn mul(self, rhs: Expr) -> Expr {
        Expr::Bin(BinOp::Mul, Box::new(self), Box::new(rhs))
    }

    #[must_use]
    pub fn eq(self, rhs: Expr) -> Expr {
        Expr::Cmp(CmpOp::Eq, Box::new(self), Box::new(rhs))
    }

    #[must_use]
    pub fn lt(self, rhs: Expr) -> Expr {
        Expr::Cmp(CmpOp::Lt, Box::new(self), Box::new(rhs))
    }

    #[must_use]
    pub fn index(self, idx: Expr) -> Expr {
        Expr::Index(Box::new(self), Box::new(idx))
    }

    /// Render this expression as a Desmos LaTeX string.
    #[must_use]
    pub fn to_latex(&self) -> String {
        match self {
            Expr::Num(v) => v.to_string(),
            Expr::Ident(s) => s.clone(),
            Expr::Bin(op, lhs, rhs) => {
                let op_str = match op {
                    BinOp::Add => "+",
                    BinOp::Sub => "-",
                    BinOp::Mul => "\\cdot ",
                };
                format!(
                    "\\left({}{op_str}{}\\right)",
                    lhs.to_latex(),
                    rhs.to_latex()
                )
            }
            Expr::Frac(num, den) => {
                format!("\\frac{{{}}}{{{}}}", num.to_latex(), den.to_latex())
            }
            Expr::Builtin(name, args) => {
                format!(
                    "\\operatorname{{{name}}}\\left({}\\right)",
                    join_latex(args, ",")
                )
            }
            Expr::Call(name, args) => {
                format!("{name}\\left({}\\right)", join_latex(args, ","))
            }
            Expr::List(items) => format!("\\left[{}\\right]", join_latex(items, ",")),
            Expr::Index(list, idx) => {
                format!("{}\\left[{}\\right]", list.to_latex(), idx.to_latex())
            }
            Expr::Map { var, to, body } => {
                format!(
                    "\\left[{}\\operatorname{{for}}{var}=\\left[1,...,{}\\right]\\right]",
                    body.to_latex(),
                    to.to_latex()
                )
            }
            Expr::Piecewise(branches, else_) => {
                let mut parts: Vec<String> = branches
                    .iter()
                    .map(|(conds, val)| format!("{}:{}", join_latex(conds, ","), val.to_latex()))
                    .collect();
                if let Some(else_) = else_ {
                    parts.push(else_.to_latex());
                }
                format!("\\left\\{{{}\\right\\}}", parts.join(","))
            }
            Expr::Cmp(op, lhs, rhs) => {
                format!("{}{}{}", lhs.to_latex(), op.latex(), rhs.to_latex())
            }
            Expr::Sum {
                var,
                from,
                to,
                body,
            } => {
                format!(
                    "\\sum_{{{var}={}}}^{{{}}}\\left({}\\right)",
                    from.to_latex(),
                    to.to_latex(),
                    body.to_latex()
                )
            }
            Expr::Action(assignments) => {
                let parts: Vec<String> = assignments
                    .iter()
                    .map(|(var, expr)| format!("{var}\\to {}", expr.to_latex()))
                    .collect();
                format!("\\left({}\\right)", parts.join(","))
            }
        }
    }
}

fn join_latex(exprs: &[Expr], sep: &str) -> String {
    exprs
        .iter()
        .map(Expr::to_latex)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Render a top-level function definition, e.g. `append\left(l,i\right)=...`.
#[must_use]
pub fn render_definition(name: &str, params: &[&str], body: &Expr) -> String {
    if params.is_empty() {
        format!("{name}\\left(\\right)={}", body.to_latex())
    } else {
        format!(
            "{name}\\left({}\\right)={}",
            params.join(","),
            body.to_latex()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_piecewise_with_else() {
        let e = Expr::Piecewise(
            vec![(vec![Expr::ident("x").eq(Expr::num(1))], Expr::num(10))],
            Some(Box::new(Expr::num(0))),
        );
        assert_eq!(e.to_latex(), "\\left\\{x=1:10,0\\right\\}");
    }

    #[test]
    fn renders_multi_condition_branch_as_comma_join() {
        let e = Expr::Piecewise(
            vec![(
                vec![
                    Expr::ident("p").eq(Expr::num(3)),
                    Expr::ident("i").eq(Expr::num(0)),
                ],
                Expr::num(1),
            )],
            None,
        );
        assert_eq!(e.to_latex(), "\\left\\{p=3,i=0:1\\right\\}");
    }

    #[test]
    fn renders_action_bundle() {
        let e = Expr::Action(vec![
            ("a".to_string(), Expr::num(1)),
            ("b".to_string(), Expr::num(2)),
        ]);
        assert_eq!(e.to_latex(), "\\left(a\\to 1,b\\to 2\\right)");
    }

    #[test]
    fn renders_function_definition() {
        let body = Expr::ident("l").index(Expr::ident("n"));
        assert_eq!(
            render_definition("a_{ppend}", &["l", "i"], &body),
            "a_{ppend}\\left(l,i\\right)=l\\left[n\\right]"
        );
    }
}
