use similar::TextDiff;

/// Unified line diff of `old` against `new`, empty when they are equal
pub fn unified_diff(old: &str, new: &str, old_name: &str, new_name: &str) -> String {
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(old_name, new_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_marks_changed_lines() {
        let diff = unified_diff("a\nb\nc\n", "a\nx\nc\n", "expected", "actual");
        assert!(diff.starts_with("--- expected\n+++ actual\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+x\n"));
    }

    #[test]
    fn test_equal_inputs_have_no_diff() {
        assert_eq!(unified_diff("a\n", "a\n", "l", "r"), "");
    }
}
