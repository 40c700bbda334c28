//! Render a [`MathNode`] tree into a LaTeX math string.
//!
//! Both translators build the same AST; this is the single pure
//! function that turns it into text, so the "math balance" invariant
//! only needs proving here.

use crate::ast::{AccentKind, BarKind, MathNode, MatrixEnv};

#[must_use]
pub fn render(node: &MathNode) -> String {
    match node {
        MathNode::Char(s) => s.clone(),
        MathNode::Group(children) => children.iter().map(render).collect::<Vec<_>>().join(" "),
        MathNode::Sup(base, exp) => format!("{}^{{{}}}", render(base), render(exp)),
        MathNode::Sub(base, sub) => format!("{}_{{{}}}", render(base), render(sub)),
        MathNode::SubSup(base, sub, sup) => {
            format!("{}_{{{}}}^{{{}}}", render(base), render(sub), render(sup))
        }
        MathNode::Frac(num, den) => format!("\\frac{{{}}}{{{}}}", render(num), render(den)),
        MathNode::Root(index, radicand) => index.as_ref().map_or_else(
            || format!("\\sqrt{{{}}}", render(radicand)),
            |idx| format!("\\sqrt[{}]{{{}}}", render(idx), render(radicand)),
        ),
        MathNode::Delim(open, close, inner) => {
            format!(
                "\\left{} {} \\right{}",
                crate::tables::delimiter_text(*open),
                render(inner),
                crate::tables::delimiter_text(*close)
            )
        }
        MathNode::Nary {
            op,
            lower,
            upper,
            body,
        } => {
            let mut out = op.clone();
            if let Some(lower) = lower {
                out.push_str(&format!("_{{{}}}", render(lower)));
            }
            if let Some(upper) = upper {
                out.push_str(&format!("^{{{}}}", render(upper)));
            }
            out.push_str(&render(body));
            out
        }
        MathNode::Func(name, arg) => format!("{}({})", crate::tables::func_command(name), render(arg)),
        MathNode::Accent(kind, base) => format!("{}{{{}}}", accent_command(*kind), render(base)),
        MathNode::Bar(kind, base) => {
            let cmd = match kind {
                BarKind::Over => "\\overline",
                BarKind::Under => "\\underline",
                BarKind::Cancel => "\\cancel",
            };
            format!("{cmd}{{{}}}", render(base))
        }
        MathNode::Matrix {
            env,
            rows,
            cols,
            cells,
        } => render_matrix(*env, *rows, *cols, cells),
    }
}

const fn accent_command(kind: AccentKind) -> &'static str {
    match kind {
        AccentKind::Hat => "\\hat",
        AccentKind::Tilde => "\\tilde",
        AccentKind::Grave => "\\grave",
        AccentKind::Acute => "\\acute",
        AccentKind::Dot => "\\dot",
        AccentKind::DDot => "\\ddot",
        AccentKind::Bar => "\\bar",
        AccentKind::Vec => "\\vec",
        AccentKind::Breve => "\\breve",
        AccentKind::Check => "\\check",
    }
}

const fn matrix_env_name(env: MatrixEnv) -> &'static str {
    match env {
        MatrixEnv::Plain => "matrix",
        MatrixEnv::Paren => "pmatrix",
        MatrixEnv::Bracket => "bmatrix",
        MatrixEnv::Brace => "Bmatrix",
        MatrixEnv::Bar => "vmatrix",
        MatrixEnv::DoubleBar => "Vmatrix",
    }
}

fn render_matrix(env: MatrixEnv, rows: usize, cols: usize, cells: &[MathNode]) -> String {
    let name = matrix_env_name(env);
    let mut body = String::new();
    for r in 0..rows {
        let row_cells: Vec<String> = (0..cols)
            .map(|c| cells.get(r * cols + c).map(render).unwrap_or_default())
            .collect();
        body.push_str(&row_cells.join(" & "));
        if r + 1 < rows {
            body.push_str(" \\\\ ");
        }
    }
    format!("\\begin{{{name}}}{body}\\end{{{name}}}")
}

/// True iff `s`'s braces are balanced and every `\left` has a matching
/// `\right`, the invariant both translators must uphold for non-empty
/// output.
#[must_use]
pub fn is_balanced(s: &str) -> bool {
    let mut depth: i32 = 0;
    for c in s.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return false;
    }
    let lefts = s.matches("\\left").count();
    let rights = s.matches("\\right").count();
    lefts == rights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MathNode;

    #[test]
    fn renders_simple_fraction() {
        let tree = MathNode::Frac(
            Box::new(MathNode::char("a")),
            Box::new(MathNode::char("b")),
        );
        assert_eq!(render(&tree), "\\frac{a}{b}");
        assert!(is_balanced(&render(&tree)));
    }

    #[test]
    fn renders_delimited_group_balanced() {
        let tree = MathNode::Delim('(', ')', Box::new(MathNode::char("x+y")));
        let out = render(&tree);
        assert!(out.contains("\\left("));
        assert!(out.contains("\\right)"));
        assert!(is_balanced(&out));
    }

    #[test]
    fn renders_matrix_environment() {
        let tree = MathNode::Matrix {
            env: MatrixEnv::Bracket,
            rows: 2,
            cols: 2,
            cells: vec![
                MathNode::char("1"),
                MathNode::char("0"),
                MathNode::char("0"),
                MathNode::char("1"),
            ],
        };
        let out = render(&tree);
        assert_eq!(out, "\\begin{bmatrix}1 & 0 \\\\ 0 & 1\\end{bmatrix}");
        assert!(is_balanced(&out));
    }

    #[test]
    fn detects_unbalanced_braces() {
        assert!(!is_balanced("\\frac{a}{b"));
    }

    #[test]
    fn detects_mismatched_left_right() {
        assert!(!is_balanced("\\left(x"));
    }

    proptest::proptest! {
        /// Math balance: any tree built from the AST constructors renders
        /// to balanced output. We can't generate arbitrary trees cheaply
        /// in a property test without a recursive strategy, so this
        /// exercises a representative shallow/deep mix via the `depth`
        /// parameter instead of a full `Arbitrary` impl.
        #[test]
        fn nested_fracs_stay_balanced(depth in 0usize..8) {
            let mut node = MathNode::char("x");
            for _ in 0..depth {
                node = MathNode::Frac(Box::new(node.clone()), Box::new(MathNode::char("y")));
            }
            proptest::prop_assert!(is_balanced(&render(&node)));
        }
    }
}
