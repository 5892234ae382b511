/// Re-indents `text` by brace depth.
///
/// A line ending in `}` is dedented before it is written, a line ending in
/// `{` indents everything after it. Lines are trimmed first, so the input's
/// own indentation is ignored, and blank lines stay empty.
pub fn format_multiline(text: &str, indent: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for line in text.lines() {
        let line = line.trim();
        if line.ends_with('}') {
            depth = depth.saturating_sub(1);
        }
        if !line.is_empty() {
            out.extend(std::iter::repeat(' ').take(depth * indent));
            out.push_str(line);
        }
        out.push('\n');
        if line.ends_with('{') {
            depth += 1;
        }
    }
    out
}

pub fn emit(lines: Vec<String>, indent: usize) -> String {
    format_multiline(&lines.join("\n"), indent)
}

#[cfg(test)]
mod test {
    use super::*;

    fn leading_spaces(line: &str) -> usize {
        line.len() - line.trim_start_matches(' ').len()
    }

    #[test]
    fn nests_blocks() {
        let text = "message A {\nmessage B {\nint32 x = 1;\n}\nstring y = 2;\n}";
        assert_eq!(
            format_multiline(text, 4),
            "message A {\n    message B {\n        int32 x = 1;\n    }\n    string y = 2;\n}\n"
        );
    }

    #[test]
    fn ignores_existing_indentation() {
        assert_eq!(
            format_multiline("  enum E {\n\t\tA = 0;\n   }", 2),
            "enum E {\n  A = 0;\n}\n"
        );
    }

    #[test]
    fn blank_lines_stay_empty() {
        assert_eq!(format_multiline("service S {\n\n}", 4), "service S {\n\n}\n");
    }

    #[test]
    fn unbalanced_close_does_not_underflow() {
        assert_eq!(format_multiline("}\nA = 1;", 4), "}\nA = 1;\n");
    }

    #[test]
    fn indentation_follows_open_braces() {
        let lines: Vec<String> = [
            "service S {",
            "rpc A(B) returns (C) {",
            r#"option (google.api.http) = {get: "/a/{id}"};"#,
            "}",
            "}",
            "message B {",
            "oneof o {",
            "int32 x = 1;",
            "}",
            "}",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let mut open = 0usize;
        for line in emit(lines, 4).lines() {
            if line.ends_with('}') {
                open -= 1;
            }
            assert_eq!(leading_spaces(line), 4 * open, "{:?}", line);
            if line.ends_with('{') {
                open += 1;
            }
        }
        assert_eq!(open, 0);
    }
}
