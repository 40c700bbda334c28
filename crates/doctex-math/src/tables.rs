//! Fixed lookup tables shared by both translators: Unicode symbol names,
//! n-ary operator glyphs, delimiter fences, accent marks, and function
//! names, each expressed as a `once_cell::sync::Lazy` `HashMap` the way
//! `docling-backend` precomputes its format-specific constant data.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Unicode character → LaTeX command, used by the OMML last-resort
/// strategy and the MTEF character renderer.
pub static UNICODE_TO_LATEX: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ('√', "\\sqrt"),
        ('∑', "\\sum"),
        ('∏', "\\prod"),
        ('∫', "\\int"),
        ('∞', "\\infty"),
        ('≤', "\\leq"),
        ('≥', "\\geq"),
        ('≠', "\\neq"),
        ('±', "\\pm"),
        ('∓', "\\mp"),
        ('×', "\\times"),
        ('÷', "\\div"),
        ('·', "\\cdot"),
        ('∂', "\\partial"),
        ('∇', "\\nabla"),
        ('∀', "\\forall"),
        ('∃', "\\exists"),
        ('∈', "\\in"),
        ('∉', "\\notin"),
        ('⊂', "\\subset"),
        ('⊃', "\\supset"),
        ('⊆', "\\subseteq"),
        ('⊇', "\\supseteq"),
        ('∪', "\\cup"),
        ('∩', "\\cap"),
        ('∅', "\\emptyset"),
        ('≈', "\\approx"),
        ('≡', "\\equiv"),
        ('≅', "\\cong"),
        ('∝', "\\propto"),
        ('←', "\\leftarrow"),
        ('→', "\\rightarrow"),
        ('↔', "\\leftrightarrow"),
        ('⇐', "\\Leftarrow"),
        ('⇒', "\\Rightarrow"),
        ('⇔', "\\Leftrightarrow"),
        ('…', "\\ldots"),
        ('⋯', "\\cdots"),
        ('⋮', "\\vdots"),
        ('⋱', "\\ddots"),
        // Greek, lower-case.
        ('α', "\\alpha"),
        ('β', "\\beta"),
        ('γ', "\\gamma"),
        ('δ', "\\delta"),
        ('ε', "\\epsilon"),
        ('ζ', "\\zeta"),
        ('η', "\\eta"),
        ('θ', "\\theta"),
        ('ι', "\\iota"),
        ('κ', "\\kappa"),
        ('λ', "\\lambda"),
        ('μ', "\\mu"),
        ('ν', "\\nu"),
        ('ξ', "\\xi"),
        ('π', "\\pi"),
        ('ρ', "\\rho"),
        ('σ', "\\sigma"),
        ('τ', "\\tau"),
        ('υ', "\\upsilon"),
        ('φ', "\\phi"),
        ('χ', "\\chi"),
        ('ψ', "\\psi"),
        ('ω', "\\omega"),
        // Greek, upper-case.
        ('Γ', "\\Gamma"),
        ('Δ', "\\Delta"),
        ('Θ', "\\Theta"),
        ('Λ', "\\Lambda"),
        ('Ξ', "\\Xi"),
        ('Π', "\\Pi"),
        ('Σ', "\\Sigma"),
        ('Υ', "\\Upsilon"),
        ('Φ', "\\Phi"),
        ('Ψ', "\\Psi"),
        ('Ω', "\\Omega"),
    ])
});

/// Run `text` through [`UNICODE_TO_LATEX`], leaving unmapped characters
/// untouched, and padding each substituted command with a surrounding
/// space so it doesn't fuse with neighbouring characters.
#[must_use]
pub fn unicode_to_latex_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if let Some(cmd) = UNICODE_TO_LATEX.get(&c) {
            out.push(' ');
            out.push_str(cmd);
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

/// n-ary operator symbol → LaTeX command.
/// Unknown symbols fall back to `\sum`
pub static NARY_SYMBOL_MAP: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ('∫', "\\int"),
        ('∬', "\\iint"),
        ('∭', "\\iiint"),
        ('∮', "\\oint"),
        ('∏', "\\prod"),
        ('∐', "\\coprod"),
        ('∑', "\\sum"),
        ('⋀', "\\bigwedge"),
        ('⋁', "\\bigvee"),
        ('⋂', "\\bigcap"),
        ('⋃', "\\bigcup"),
    ])
});

#[must_use]
pub fn nary_symbol_for(c: char) -> &'static str {
    NARY_SYMBOL_MAP.get(&c).copied().unwrap_or("\\sum")
}

/// Fence character → (open, close) LaTeX delimiter text. Escapes braces
/// and the double-pipe the way raw LaTeX requires.
pub static DELIMITER_MAP: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ('(', "("),
        (')', ")"),
        ('[', "["),
        (']', "]"),
        ('{', "\\{"),
        ('}', "\\}"),
        ('|', "|"),
        ('‖', "\\|"),
        ('⌊', "\\lfloor"),
        ('⌋', "\\rfloor"),
        ('⌈', "\\lceil"),
        ('⌉', "\\rceil"),
        ('⟨', "\\langle"),
        ('⟩', "\\rangle"),
    ])
});

#[must_use]
pub fn delimiter_text(c: char) -> String {
    DELIMITER_MAP
        .get(&c)
        .map(|s| (*s).to_string())
        .unwrap_or_else(|| c.to_string())
}

/// Combining-diacritic codepoint → accent kind (OMML `acc` element). This
/// is the modern-math twin of the MTEF accent selectors 31-34.
pub static ACCENT_CHAR_MAP: Lazy<HashMap<char, crate::ast::AccentKind>> = Lazy::new(|| {
    use crate::ast::AccentKind::{Acute, Bar, Breve, Check, DDot, Dot, Grave, Hat, Tilde, Vec};
    HashMap::from([
        ('\u{0302}', Hat),
        ('\u{0303}', Tilde),
        ('\u{0300}', Grave),
        ('\u{0301}', Acute),
        ('\u{0307}', Dot),
        ('\u{0308}', DDot),
        ('\u{0305}', Bar),
        ('\u{20d7}', Vec),
        ('\u{0306}', Breve),
        ('\u{030c}', Check),
    ])
});

/// Math function names that get a backslash command in LaTeX (OMML `func`
/// element strategy 1; also used by the MTEF function-style
/// font wrapping in step 4).
pub static FUNC_NAME_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("sin", "\\sin"),
        ("cos", "\\cos"),
        ("tan", "\\tan"),
        ("sec", "\\sec"),
        ("csc", "\\csc"),
        ("cot", "\\cot"),
        ("sinh", "\\sinh"),
        ("cosh", "\\cosh"),
        ("tanh", "\\tanh"),
        ("ln", "\\ln"),
        ("log", "\\log"),
        ("exp", "\\exp"),
        ("lim", "\\lim"),
        ("max", "\\max"),
        ("min", "\\min"),
        ("sup", "\\sup"),
        ("inf", "\\inf"),
        ("det", "\\det"),
        ("dim", "\\dim"),
        ("ker", "\\ker"),
        ("deg", "\\deg"),
        ("gcd", "\\gcd"),
        ("arg", "\\arg"),
        ("mod", "\\bmod"),
    ])
});

#[must_use]
pub fn func_command(name: &str) -> String {
    FUNC_NAME_MAP
        .get(name)
        .map(|s| (*s).to_string())
        .unwrap_or_else(|| format!("\\operatorname{{{name}}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_nary_symbol_falls_back_to_sum() {
        assert_eq!(nary_symbol_for('?'), "\\sum");
    }

    #[test]
    fn known_nary_symbols_map_correctly() {
        assert_eq!(nary_symbol_for('∑'), "\\sum");
        assert_eq!(nary_symbol_for('∫'), "\\int");
        assert_eq!(nary_symbol_for('∏'), "\\prod");
        assert_eq!(nary_symbol_for('⋃'), "\\bigcup");
    }

    #[test]
    fn brace_delimiters_are_escaped() {
        assert_eq!(delimiter_text('{'), "\\{");
        assert_eq!(delimiter_text('}'), "\\}");
    }

    #[test]
    fn plain_delimiters_pass_through() {
        assert_eq!(delimiter_text('('), "(");
        assert_eq!(delimiter_text(')'), ")");
    }

    #[test]
    fn known_functions_get_backslash_commands() {
        assert_eq!(func_command("sin"), "\\sin");
        assert_eq!(func_command("mod"), "\\bmod");
    }

    #[test]
    fn unknown_function_falls_back_to_operatorname() {
        assert_eq!(func_command("foo"), "\\operatorname{foo}");
    }

    #[test]
    fn greek_letters_translate() {
        let out = unicode_to_latex_text("πr²");
        assert!(out.contains("\\pi"));
    }
}
