//! Ordered LaTeX-to-speech rule table.
//!
//! The table is configuration data, not logic: an ordered list of
//! (matcher, template) pairs applied top to bottom. Order is load-bearing:
//!
//! 1. Statistics/probability notation before the generic single-letter
//!    function-application rule, or `P(A)` collapses into "P of A".
//! 2. Inner-product and bra-ket notation before generic absolute-value and
//!    angle-bracket handling, or the `|` is read as absolute value.
//! 3. Combined subscript-superscript forms before the single-token
//!    subscript/superscript rules.
//! 4. Greek letters and operator symbols after the structural families,
//!    since they are context-free single-token substitutions.
//!
//! Nested braces are only handled to the single level the patterns cover;
//! a fraction inside a fraction numerator may come out partially converted.

use once_cell::sync::Lazy;
use regex::Regex;

/// One ordered rewrite step.
pub struct SpeechRule {
    pub pattern: Regex,
    pub template: &'static str,
}

const RULE_TABLE: &[(&str, &str)] = &[
    // Text wrappers, unwrapped first so wrapped names reach the rules below
    (r"\\operatorname\{([^}]+)\}", "${1}"),
    (r"\\text\{([^}]+)\}", "${1}"),
    (r"\\mathrm\{([^}]+)\}", "${1}"),
    // Probability and statistics notation
    (r"\bP\(([^)]+)\)", "probability of ${1}"),
    (r"\bE\[([^\]]+)\]", "expected value of ${1}"),
    (r"\bVar\(([^)]+)\)", "variance of ${1}"),
    (r"\bSD\(([^)]+)\)", "standard deviation of ${1}"),
    (r"\bCov\(([^,]+),\s*([^)]+)\)", "covariance of ${1} and ${2}"),
    (r"\bCorr\(([^,]+),\s*([^)]+)\)", "correlation of ${1} and ${2}"),
    // Generic single-letter function application
    (r"\b([a-zA-Z])\(([^)]+)\)", "${1} of ${2}"),
    // Derivatives and differentials
    (
        r"\\frac\{d\}\{d([^}]+)\}",
        "the derivative with respect to ${1} of",
    ),
    (
        r"\\frac\{\\partial\}\{\\partial\s*([^}]+)\}",
        "the partial derivative with respect to ${1} of",
    ),
    // Fractions
    (r"\\frac\{([^{}]+)\}\{([^{}]+)\}", "${1} over ${2}"),
    // Roots
    (r"\\sqrt\[([^\]]+)\]\{([^{}]+)\}", "the ${1}-th root of ${2}"),
    (r"\\sqrt\{([^{}]+)\}", "the square root of ${1}"),
    // Summation and integration with bounds
    (
        r"\\sum_\{([^}]+)\}\^\{([^}]+)\}",
        "the sum from ${1} to ${2} of",
    ),
    (r"\\sum", " the sum of "),
    (
        r"\\int_\{([^}]+)\}\^\{([^}]+)\}",
        "the integral from ${1} to ${2} of",
    ),
    (r"\\int", " the integral of "),
    (r"\\oint", " the contour integral of "),
    // Limits
    (
        r"\\lim_\{([^}]+)\\to\s*([^}]+)\}",
        "the limit as ${1} approaches ${2} of",
    ),
    (r"\\lim_\{([^}]+)\}", "the limit as ${1} of"),
    // Products
    (
        r"\\prod_\{([^}]+)\}\^\{([^}]+)\}",
        "the product from ${1} to ${2} of",
    ),
    (r"\\prod", " the product of "),
    // Partial derivatives and del
    (r"\\partial\^\{([^}]+)\}", "partial to the power of ${1}"),
    (r"\\partial", " partial "),
    (r"\\nabla\^\{([^}]+)\}", "del operator to the power of ${1}"),
    (r"\\nabla", " del operator "),
    // Combined subscript-superscript, before the single-token rules
    (
        r"([a-zA-Z])_\{([^}]+)\}\^\{([^}]+)\}",
        "${1} subscript ${2} to the power of ${3}",
    ),
    (
        r"([a-zA-Z])\^\{([^}]+)\}_\{([^}]+)\}",
        "${1} to the power of ${2} subscript ${3}",
    ),
    // Superscripts and subscripts with context
    (r"([a-zA-Z])\^\{([^}]+)\}", "${1} to the power of ${2}"),
    (r"([a-zA-Z])_\{([^}]+)\}", "${1} subscript ${2}"),
    (r"\^\{([^}]+)\}", " to the power of ${1}"),
    (r"_\{([^}]+)\}", " subscript ${1}"),
    // Quantum mechanics notation, before Greek letters and absolute values.
    // Inner products first (most specific), then individual bras and kets.
    (
        r"\\langle\s*(.+?)\s*\|\s*(.+?)\s*\\rangle",
        "the inner product of ${1} and ${2}",
    ),
    (
        r"\\braket\{([^}]+)\}\{([^}]+)\}",
        "the inner product of ${1} and ${2}",
    ),
    (r"\|([^|]+?)\\rangle", "ket ${1}"),
    (r"\\langle([^|]+?)\|", "bra ${1}"),
    (r"\\bra\{([^}]+)\}", "bra ${1}"),
    (r"\\ket\{([^}]+)\}", "ket ${1}"),
    (
        r"⟨\s*([^|⟨⟩]+?)\s*\|\s*([^|⟨⟩]+?)\s*⟩",
        "the inner product of ${1} and ${2}",
    ),
    (r"\|\s*([^|⟨⟩]+?)\s*⟩", "ket ${1}"),
    (r"⟨\s*([^|⟨⟩]+?)\s*\|", "bra ${1}"),
    // Greek letters (lowercase)
    (r"\\alpha", " alpha "),
    (r"\\beta", " beta "),
    (r"\\gamma", " gamma "),
    (r"\\delta", " delta "),
    (r"\\epsilon", " epsilon "),
    (r"\\varepsilon", " epsilon "),
    (r"\\zeta", " zeta "),
    (r"\\eta", " eta "),
    (r"\\theta", " theta "),
    (r"\\vartheta", " theta "),
    (r"\\iota", " iota "),
    (r"\\kappa", " kappa "),
    (r"\\lambda", " lambda "),
    (r"\\mu", " mu "),
    (r"\\nu", " nu "),
    (r"\\xi", " xi "),
    (r"\\pi", " pi "),
    (r"\\varpi", " pi "),
    (r"\\rho", " rho "),
    (r"\\varrho", " rho "),
    (r"\\sigma", " sigma "),
    (r"\\varsigma", " sigma "),
    (r"\\tau", " tau "),
    (r"\\upsilon", " upsilon "),
    (r"\\phi", " phi "),
    (r"\\varphi", " phi "),
    (r"\\chi", " chi "),
    (r"\\psi", " psi "),
    (r"\\omega", " omega "),
    // Greek letters (uppercase)
    (r"\\Gamma", " capital gamma "),
    (r"\\Delta", " capital delta "),
    (r"\\Theta", " capital theta "),
    (r"\\Lambda", " capital lambda "),
    (r"\\Xi", " capital xi "),
    (r"\\Pi", " capital pi "),
    (r"\\Sigma", " capital sigma "),
    (r"\\Upsilon", " capital upsilon "),
    (r"\\Phi", " capital phi "),
    (r"\\Psi", " capital psi "),
    (r"\\Omega", " capital omega "),
    // Mathematical operators
    (r"\\cdots", " dot dot dot "),
    (r"\\cdot", " times "),
    (r"\\times", " cross product "),
    (r"\\div", " divided by "),
    (r"\\pm", " plus or minus "),
    (r"\\mp", " minus or plus "),
    (r"\\leq", " is less than or equal to "),
    (r"\\le\b", " is less than or equal to "),
    (r"\\geq", " is greater than or equal to "),
    (r"\\ge", " is greater than or equal to "),
    (r"\\neq", " is not equal to "),
    (r"\\approx", " is approximately equal to "),
    (r"\\equiv", " is equivalent to "),
    (r"\\sim", " is similar to "),
    (r"\\propto", " is proportional to "),
    // Set theory and logic
    (r"\\in\b", " is an element of "),
    (r"\\notin\b", " is not an element of "),
    (r"\\subseteq", " is a subset of or equal to "),
    (r"\\subset", " is a subset of "),
    (r"\\supseteq", " is a superset of or equal to "),
    (r"\\supset", " is a superset of "),
    (r"\\cup", " union "),
    (r"\\cap", " intersection "),
    (r"\\emptyset", " the empty set "),
    (r"\\varnothing", " the empty set "),
    (r"\\forall", " for all "),
    (r"\\nexists", " there does not exist "),
    (r"\\exists", " there exists "),
    // Functions; inverse and hyperbolic forms first so prefixes stay intact
    (r"\\arcsin", " arcsine of "),
    (r"\\arccos", " arccosine of "),
    (r"\\arctan", " arctangent of "),
    (r"\\sinh", " hyperbolic sine of "),
    (r"\\cosh", " hyperbolic cosine of "),
    (r"\\tanh", " hyperbolic tangent of "),
    (r"\\sin", " sine of "),
    (r"\\cos", " cosine of "),
    (r"\\tan", " tangent of "),
    (r"\\sec", " secant of "),
    (r"\\csc", " cosecant of "),
    (r"\\cot", " cotangent of "),
    (r"\\ln", " natural log of "),
    (r"\\log", " log of "),
    (r"\\exp", " exponential of "),
    // Vectors and accents
    (r"\\mathbf\{([^}]+)\}", "bold ${1}"),
    (r"\\vec\{([^}]+)\}", "vector ${1}"),
    (r"\\hat\{([^}]+)\}", "${1} hat"),
    (r"\\bar\{([^}]+)\}", "${1} bar"),
    (r"\\tilde\{([^}]+)\}", "${1} tilde"),
    (r"\\ddot\{([^}]+)\}", "${1} double dot"),
    (r"\\dot\{([^}]+)\}", "${1} dot"),
    // Matrix environments
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
    (r"\\\\", " and "), // matrix row separator
    (r"&", " "),        // matrix column separator
    // Special symbols and constants
    (r"\\infty", " infinity "),
    (r"\\ldots", " dot dot dot "),
    (r"\\vdots", " vertical dots "),
    (r"\\ddots", " diagonal dots "),
    (r"\\hbar", " h-bar "),
    (r"\\ell", " script l "),
    // Brackets and delimiters
    (r"\\langle", " left angle bracket "),
    (r"\\rangle", " right angle bracket "),
    (r"⟨", " left angle bracket "),
    (r"⟩", " right angle bracket "),
    (r"\\lfloor", " floor of "),
    (r"\\rfloor", ""),
    (r"\\lceil", " ceiling of "),
    (r"\\rceil", ""),
    (r"\\left\(", " "),
    (r"\\right\)", " "),
    (r"\\left\[", " open bracket "),
    (r"\\right\]", " close bracket "),
    (r"\\left\\?\{", " open brace "),
    (r"\\right\\?\}", " close brace "),
    // Absolute value and norms, double bars first
    (r"\|\|([^|]+)\|\|", "the norm of ${1}"),
    (r"\|([^|]+)\|", "the absolute value of ${1}"),
    // Arrows and relations
    (r"\\rightarrow", " implies "),
    (r"\\leftarrow", " is implied by "),
    (r"\\leftrightarrow", " if and only if "),
    (r"\\Rightarrow", " implies "),
    (r"\\Leftarrow", " is implied by "),
    (r"\\Leftrightarrow", " if and only if "),
    (r"\\uparrow", " up arrow "),
    (r"\\downarrow", " down arrow "),
    (r"\\mapsto", " maps to "),
];

/// The compiled table, built once.
pub static RULES: Lazy<Vec<SpeechRule>> = Lazy::new(|| {
    RULE_TABLE
        .iter()
        .map(|&(pattern, template)| SpeechRule {
            pattern: Regex::new(pattern)
                .unwrap_or_else(|e| panic!("invalid speech rule '{}': {}", pattern, e)),
            template,
        })
        .collect()
});

/// Apply the full rule table, in order, to a LaTeX fragment.
pub fn apply_rules(latex: &str) -> String {
    let mut spoken = latex.to_string();
    for rule in RULES.iter() {
        spoken = rule.pattern.replace_all(&spoken, rule.template).into_owned();
    }
    spoken
}
