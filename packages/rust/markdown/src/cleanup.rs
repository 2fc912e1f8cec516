//! Post-conversion cleanup passes for Markdown output.
//!
//! Each pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;

/// Run the cleanup pipeline on raw Markdown text.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = md.to_string();

    result = collapse_blank_lines(&result);
    result = fix_fence_languages(&result);
    result = strip_stray_tags(&result);
    result = trim_line_ends(&result);
    result = single_trailing_newline(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Collapse excessive blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of 3+ blank lines into exactly 2.
fn collapse_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Fix code fence language hints
// ---------------------------------------------------------------------------

/// Rewrite class-style fence info strings (`language-js`, `lang-py`,
/// `highlight-rust`) to the bare language name.
fn fix_fence_languages(md: &str) -> String {
    static LANG_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^```(?:language-|lang-|highlight-)(\w+)").expect("valid regex")
    });

    LANG_PREFIX_RE.replace_all(md, "```$1").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Strip stray HTML tags
// ---------------------------------------------------------------------------

/// Remove container tags that survived conversion, preserving their inner
/// text. Lines inside code fences are left untouched.
fn strip_stray_tags(md: &str) -> String {
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"</?(?:div|span|section|aside|header|footer|figure|figcaption|details|summary)(?:\s[^>]*)?>",
        )
        .expect("valid regex")
    });

    let mut out = Vec::new();
    let mut in_fence = false;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            out.push(line.to_string());
        } else if in_fence {
            out.push(line.to_string());
        } else {
            out.push(TAG_RE.replace_all(line, "").to_string());
        }
    }

    out.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 4 & 5: Whitespace normalization
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on every line.
fn trim_line_ends(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Ensure the text ends with exactly one newline.
fn single_trailing_newline(md: &str) -> String {
    format!("{}\n", md.trim_end_matches('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_blank_lines_limits_runs() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn fence_language_prefixes_rewritten() {
        let input = "```language-python\nprint('hi')\n```";
        assert!(fix_fence_languages(input).starts_with("```python"));

        let plain = "```rust\nfn main() {}\n```";
        assert_eq!(fix_fence_languages(plain), plain);
    }

    #[test]
    fn stray_tags_removed_outside_fences() {
        let input = "# T\n\n<div class=\"note\">kept text</div>";
        let result = strip_stray_tags(input);
        assert!(result.contains("kept text"));
        assert!(!result.contains("<div"));
    }

    #[test]
    fn stray_tags_kept_inside_fences() {
        let input = "```html\n<div>markup sample</div>\n```";
        let result = strip_stray_tags(input);
        assert!(result.contains("<div>markup sample</div>"));
    }

    #[test]
    fn trailing_whitespace_trimmed() {
        assert_eq!(trim_line_ends("a   \nb\t"), "a\nb");
    }

    #[test]
    fn trailing_newline_normalized() {
        assert_eq!(single_trailing_newline("x"), "x\n");
        assert_eq!(single_trailing_newline("x\n\n\n"), "x\n");
    }

    #[test]
    fn full_pipeline() {
        let input =
            "# Title\n\n\n\n\n\n<span>note</span>\n\n```language-js\nconsole.log(1)\n```\n\nEnd   ";
        let result = run_pipeline(input);

        assert!(!result.contains("\n\n\n\n"));
        assert!(result.contains("```js"));
        assert!(!result.contains("<span>"));
        assert!(result.contains("note"));
        assert!(result.ends_with("End\n"));
    }
}
