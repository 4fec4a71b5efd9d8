#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// ANSI `"name"`, embedded `"` doubled.
    DoubleQuote,
    /// MySQL `` `name` ``, embedded `` ` `` doubled.
    Backtick,
    /// SQL Server `[name]`, embedded `]` doubled.
    Bracket,
}

impl QuoteStyle {
    #[must_use]
    pub fn quote(self, identifier: &str) -> String {
        match self {
            Self::DoubleQuote => wrap(identifier, '"', '"'),
            Self::Backtick => wrap(identifier, '`', '`'),
            Self::Bracket => wrap(identifier, '[', ']'),
        }
    }

    /// Reads a quoted identifier back into its raw form. Returns `None` when
    /// `quoted` is not a single well-formed identifier in this style.
    #[must_use]
    pub fn unquote(self, quoted: &str) -> Option<String> {
        let (open, close) = match self {
            Self::DoubleQuote => ('"', '"'),
            Self::Backtick => ('`', '`'),
            Self::Bracket => ('[', ']'),
        };
        let inner = quoted.strip_prefix(open)?.strip_suffix(close)?;

        let mut raw = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch == close {
                // A lone closing character would have terminated the identifier.
                if chars.next() != Some(close) {
                    return None;
                }
            }
            raw.push(ch);
        }
        Some(raw)
    }
}

fn wrap(identifier: &str, open: char, close: char) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push(open);
    for ch in identifier.chars() {
        if ch == close {
            quoted.push(close);
        }
        quoted.push(ch);
    }
    quoted.push(close);
    quoted
}

/// Renders `value` as a single-quoted SQL string literal.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Joins the present parts with `.` after quoting each one.
#[must_use]
pub fn qualified_name(style: QuoteStyle, parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|part| style.quote(part))
        .collect::<Vec<_>>()
        .join(".")
}
