//! The internal math AST shared by the OMML and MTEF translators.
//!
//! Both translators produce trees over this algebra; rendering to LaTeX
//! text is a single pure function of the tree ([`crate::render::render`]),
//! so the balance invariant only needs to be
//! proven once, at the renderer, rather than once per translator.

/// Environment a [`MathNode::Matrix`] renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixEnv {
    Plain,
    Paren,
    Bracket,
    Brace,
    Bar,
    DoubleBar,
}

/// Kind of accent mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccentKind {
    Hat,
    Tilde,
    Grave,
    Acute,
    Dot,
    DDot,
    Bar,
    Vec,
    Breve,
    Check,
}

/// Overline/underline/cancel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    Over,
    Under,
    Cancel,
}

/// One node of the math expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MathNode {
    /// A run of literal text/characters, already mapped through whatever
    /// Unicode table applies (the translator owns that decision).
    Char(String),
    Sup(Box<MathNode>, Box<MathNode>),
    Sub(Box<MathNode>, Box<MathNode>),
    SubSup(Box<MathNode>, Box<MathNode>, Box<MathNode>),
    Frac(Box<MathNode>, Box<MathNode>),
    Root(Option<Box<MathNode>>, Box<MathNode>),
    Delim(char, char, Box<MathNode>),
    /// n-ary big operator: `\op_{lower}^{upper} body`. `op` is already the
    /// resolved LaTeX command (e.g. `"\\sum"`).
    Nary {
        op: String,
        lower: Option<Box<MathNode>>,
        upper: Option<Box<MathNode>>,
        body: Box<MathNode>,
    },
    /// Named function applied to an argument, e.g. `\sin(x)`.
    Func(String, Box<MathNode>),
    Accent(AccentKind, Box<MathNode>),
    Bar(BarKind, Box<MathNode>),
    Matrix {
        env: MatrixEnv,
        rows: usize,
        cols: usize,
        cells: Vec<MathNode>,
    },
    /// An unordered/ordered sequence of sibling nodes with no additional
    /// structure, e.g. the top-level body of an expression.
    Group(Vec<MathNode>),
}

impl MathNode {
    #[must_use]
    pub fn char(s: impl Into<String>) -> Self {
        Self::Char(s.into())
    }

    #[must_use]
    pub fn group(children: Vec<MathNode>) -> Self {
        if children.len() == 1 {
            children.into_iter().next().unwrap()
        } else {
            Self::Group(children)
        }
    }

    /// True if this subtree (recursively) carries no content at all —
    /// used by the OMML fallback chain to decide that a strategy produced
    /// an "empty" result and the next strategy should run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Char(s) => s.trim().is_empty(),
            Self::Group(children) => children.is_empty() || children.iter().all(Self::is_empty),
            _ => false,
        }
    }
}
