//! Second-pass structural handlers for complex LaTeX shapes.
//!
//! Runs after the main rule table: one level of brace nesting in fractions,
//! matrix/equation/piecewise environments, binomials, leftover scripts, and
//! spacing cleanup. Long results get `[PAUSE]` markers after connective
//! words so narration can breathe.

use once_cell::sync::Lazy;
use regex::Regex;

/// Spoken results longer than this many words get pause markers.
const PAUSE_WORD_THRESHOLD: usize = 10;

static STRUCTURE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // Fractions whose numerator or denominator nests one brace level
        (
            r"\\frac\{([^{}]+(?:\{[^{}]*\}[^{}]*)*)\}\{([^{}]+(?:\{[^{}]*\}[^{}]*)*)\}",
            "the fraction ${1} over ${2}",
        ),
        // Matrix and vector environments
        (
            r"\\begin\{pmatrix\}([^\\]+)\\end\{pmatrix\}",
            "the matrix ${1}",
        ),
        (
            r"\\begin\{bmatrix\}([^\\]+)\\end\{bmatrix\}",
            "the matrix ${1}",
        ),
        (
            r"\\begin\{vmatrix\}([^\\]+)\\end\{vmatrix\}",
            "the determinant of ${1}",
        ),
        // Equation environments
        (
            r"\\begin\{equation\}([^\\]+)\\end\{equation\}",
            "the equation ${1}",
        ),
        (
            r"\\begin\{align\}([^\\]+)\\end\{align\}",
            "the aligned equations ${1}",
        ),
        // Piecewise functions
        (
            r"\\begin\{cases\}([^\\]+)\\end\{cases\}",
            "the piecewise function ${1}",
        ),
        // Binomial coefficients
        (r"\\binom\{([^}]+)\}\{([^}]+)\}", "${1} choose ${2}"),
        // Combined scripts the table did not reach
        (
            r"([a-zA-Z])\^\{([^}]+)\}_\{([^}]+)\}",
            "${1} to the power of ${2} subscript ${3}",
        ),
        (
            r"([a-zA-Z])_\{([^}]+)\}\^\{([^}]+)\}",
            "${1} subscript ${2} to the power of ${3}",
        ),
        // Simple braced scripts
        (r"\^\{([^}]+)\}", " to the power of ${1}"),
        (r"_\{([^}]+)\}", " subscript ${1}"),
        // Unbraced scripts
        (r"\^(\w+)", " to the power of ${1}"),
        (r"_(\w+)", " subscript ${1}"),
        // Function-name wrappers
        (r"\\operatorname\{([^}]+)\}", "${1}"),
        (r"\\text\{([^}]+)\}", "${1}"),
        (r"\\mathrm\{([^}]+)\}", "${1}"),
        // Norms and absolute values
        (r"\\left\|([^\\]+)\\right\|", "the norm of ${1}"),
        (r"\|([^|]+)\|", "the absolute value of ${1}"),
        // Floor and ceiling
        (r"\\lfloor([^\\]+)\\rfloor", "the floor of ${1}"),
        (r"\\lceil([^\\]+)\\rceil", "the ceiling of ${1}"),
        // Number sets and script letters
        (r"\\mathbb\{([^}]+)\}", "the ${1} numbers"),
        (r"\\mathcal\{([^}]+)\}", "script ${1}"),
        // Line breaks and spacing
        (r"\\\\", " and "),
        (r"\\quad", " "),
        (r"\\qquad", " "),
        (r"\\,", " "),
        (r"\\;", " "),
        (r"\\:", " "),
        (r"\\!", ""),
    ]
    .iter()
    .map(|(pattern, template)| {
        (
            Regex::new(pattern)
                .unwrap_or_else(|e| panic!("invalid structure rule '{}': {}", pattern, e)),
            *template,
        )
    })
    .collect()
});

static PAUSE_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(equals?|is|are)\s+",
        r"\b(therefore|thus|hence)\s+",
        r"\b(where|such that|given that)\s+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("pause pattern"))
    .collect()
});

/// Apply the structural handlers and normalize whitespace.
pub fn handle_structures(latex: &str) -> String {
    let mut spoken = latex.to_string();
    for (pattern, template) in STRUCTURE_RULES.iter() {
        spoken = pattern.replace_all(&spoken, *template).into_owned();
    }

    let mut spoken = collapse_whitespace(&spoken);

    // Long expressions read better with breathing room after connectives
    if spoken.split_whitespace().count() > PAUSE_WORD_THRESHOLD {
        for pattern in PAUSE_RULES.iter() {
            spoken = pattern.replace_all(&spoken, "${1} [PAUSE] ").into_owned();
        }
    }

    spoken
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_fraction() {
        let spoken = handle_structures("\\frac{x^{2} + 1}{y}");
        assert!(spoken.contains("the fraction"), "got: {}", spoken);
        assert!(spoken.contains("over y"), "got: {}", spoken);
    }

    #[test]
    fn test_binomial() {
        assert_eq!(handle_structures("\\binom{n}{k}"), "n choose k");
    }

    #[test]
    fn test_piecewise() {
        let spoken = handle_structures("\\begin{cases}x, x > 0 and 0, x = 0\\end{cases}");
        assert!(spoken.contains("the piecewise function"), "got: {}", spoken);
    }

    #[test]
    fn test_unbraced_scripts() {
        assert_eq!(handle_structures("x^2"), "x to the power of 2");
        assert_eq!(handle_structures("x_i"), "x subscript i");
    }

    #[test]
    fn test_spacing_commands_removed() {
        let spoken = handle_structures("a\\quad b\\, c");
        assert_eq!(spoken, "a b c");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(collapse_whitespace("  a   b \n c  "), "a b c");
    }

    #[test]
    fn test_pause_markers_only_for_long_results() {
        let short = handle_structures("x is y");
        assert!(!short.contains("[PAUSE]"));

        let long = handle_structures(
            "the quantity alpha is beta plus gamma where delta approaches zero from above",
        );
        assert!(long.contains("is [PAUSE]"), "got: {}", long);
        assert!(long.contains("where [PAUSE]"), "got: {}", long);
    }
}
