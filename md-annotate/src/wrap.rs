//! Bare-math detection and wrapping.
//!
//! Prose often carries unmarked notation like `P(A)` or `E[X]`. Wrapping it
//! in math delimiters here lets the transducer handle it in the same pass as
//! authored math. Existing math spans are copied through byte-for-byte.

use once_cell::sync::Lazy;
use regex::Regex;

// Block spans are recognized before inline spans so a `$` inside a `$$...$$`
// fence is never taken for an inline boundary.
static MATH_SPANS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$.*?\$\$|\$[^$\n]*?\$").expect("math span pattern"));

static WRAP_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // Function notation: P(A), f(x), g(t)
        (r"\b([A-Za-z])\(([^)]+)\)", "$$${1}(${2})$$"),
        // Expected value: E[X]
        (r"\bE\[([^\]]+)\]", "$$E[${1}]$$"),
        // Variance and standard deviation
        (r"\bVar\(([^)]+)\)", r"$$\text{Var}(${1})$$"),
        (r"\bSD\(([^)]+)\)", r"$$\text{SD}(${1})$$"),
        // Infix set operations between event letters
        (r"([A-Z])\s*∩\s*([A-Z])", r"$$${1} \cap ${2}$$"),
        (r"([A-Z])\s*∪\s*([A-Z])", r"$$${1} \cup ${2}$$"),
    ]
    .iter()
    .map(|(pattern, template)| {
        (
            Regex::new(pattern)
                .unwrap_or_else(|e| panic!("invalid wrap rule '{}': {}", pattern, e)),
            *template,
        )
    })
    .collect()
});

/// Wrap bare math notation found outside existing math spans.
pub fn auto_wrap_math(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut last_end = 0;

    for m in MATH_SPANS.find_iter(content) {
        result.push_str(&wrap_bare_math(&content[last_end..m.start()]));
        result.push_str(m.as_str());
        last_end = m.end();
    }
    result.push_str(&wrap_bare_math(&content[last_end..]));

    result
}

/// Apply the wrapping rules to one literal span.
///
/// A span with a stray, unmatched delimiter is returned unmodified rather
/// than partially wrapped; emitting mismatched delimiters would corrupt the
/// math pass downstream.
fn wrap_bare_math(text: &str) -> String {
    if text.contains('$') {
        return text.to_string();
    }

    let mut wrapped = text.to_string();
    for (pattern, template) in WRAP_RULES.iter() {
        wrapped = pattern.replace_all(&wrapped, *template).into_owned();
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_function_notation() {
        let wrapped = auto_wrap_math("The probability P(A) is high.");
        assert!(wrapped.contains("$P(A)$"), "got: {}", wrapped);
    }

    #[test]
    fn test_wraps_expected_value() {
        let wrapped = auto_wrap_math("We compute E[X] first.");
        assert!(wrapped.contains("$E[X]$"), "got: {}", wrapped);
    }

    #[test]
    fn test_wraps_variance_with_text_guard() {
        let wrapped = auto_wrap_math("Here Var(X) matters.");
        assert!(wrapped.contains("$\\text{Var}(X)$"), "got: {}", wrapped);
    }

    #[test]
    fn test_wraps_set_operations() {
        let wrapped = auto_wrap_math("Consider A ∩ B now.");
        assert!(wrapped.contains("$A \\cap B$"), "got: {}", wrapped);

        let wrapped = auto_wrap_math("Consider A ∪ B now.");
        assert!(wrapped.contains("$A \\cup B$"), "got: {}", wrapped);
    }

    #[test]
    fn test_existing_math_copied_verbatim() {
        let input = "Known $f(x) = 2$ stays.";
        let wrapped = auto_wrap_math(input);
        assert_eq!(wrapped, input);
    }

    #[test]
    fn test_block_span_recognized_before_inline() {
        let input = "$$a $ b$$ and then g(y)";
        let wrapped = auto_wrap_math(input);
        assert!(wrapped.starts_with("$$a $ b$$"), "got: {}", wrapped);
        assert!(wrapped.contains("$g(y)$"), "got: {}", wrapped);
    }

    #[test]
    fn test_stray_delimiter_leaves_span_unmodified() {
        let input = "price is 5$ for f(x) today";
        assert_eq!(auto_wrap_math(input), input);
    }

    #[test]
    fn test_plain_prose_untouched() {
        let input = "Nothing mathematical here at all.";
        assert_eq!(auto_wrap_math(input), input);
    }
}
