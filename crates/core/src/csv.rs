//! Minimal RFC 4180 CSV writing.

/// Escape a CSV field per RFC 4180.
///
/// If the field contains a comma, double quote, or line break, wrap it in
/// double quotes and double any internal quotes.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Append one escaped, newline-terminated row to `out`.
pub fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_csv_field(field.as_ref()));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_csv_field_simple() {
        assert_eq!(escape_csv_field("hello"), "hello");
        assert_eq!(escape_csv_field("Duration (min)"), "Duration (min)");
    }

    #[test]
    fn test_escape_csv_field_with_comma() {
        assert_eq!(escape_csv_field("jab, cross"), "\"jab, cross\"");
    }

    #[test]
    fn test_escape_csv_field_with_quote() {
        assert_eq!(escape_csv_field("say \"time\""), "\"say \"\"time\"\"\"");
    }

    #[test]
    fn test_escape_csv_field_with_newline() {
        assert_eq!(escape_csv_field("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn test_push_row() {
        let mut out = String::new();
        push_row(&mut out, &["1", "a,b", ""]);
        assert_eq!(out, "1,\"a,b\",\n");
    }
}
