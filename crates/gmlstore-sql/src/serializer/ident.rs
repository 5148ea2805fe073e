use super::{Formatter, Params, ToSql};

/// An identifier, quoted only when it would not survive unquoted.
pub(super) struct Ident<S>(pub(super) S);

const RESERVED: &[&str] = &[
    "all", "and", "any", "array", "as", "asc", "both", "case", "cast", "check", "collate",
    "column", "constraint", "create", "default", "desc", "distinct", "do", "else", "end",
    "except", "false", "for", "foreign", "from", "grant", "group", "having", "in", "into",
    "is", "join", "leading", "limit", "not", "null", "offset", "on", "only", "or", "order",
    "primary", "references", "select", "table", "then", "to", "trailing", "true", "union",
    "unique", "user", "using", "when", "where", "with",
];

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let name = self.0.as_ref();

        if is_plain(name) {
            f.dst.push_str(name);
        } else {
            f.dst.push('"');
            f.dst.push_str(&name.replace('"', "\"\""));
            f.dst.push('"');
        }
    }
}

fn is_plain(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    (first.is_ascii_lowercase() || first == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !RESERVED.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::is_plain;

    #[test]
    fn quoting() {
        assert!(is_plain("building_name"));
        assert!(is_plain("_2d"));
        assert!(!is_plain("Building"));
        assert!(!is_plain("order"));
        assert!(!is_plain("2d"));
        assert!(!is_plain(""));
    }
}
