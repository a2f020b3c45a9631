//! Identifier casing and quoting.
//!
//! [`Caser`] converts caller-facing names into the database naming convention
//! (and back for returned rows), optionally quoting each segment.
//!
//! - Dotted paths are cased segment by segment: `userAccounts.createdAt` ->
//!   `user_accounts.created_at`.
//! - A leading `!` on a segment is stripped and keeps that segment unquoted.
//! - Spans inside `"..."` or `'...'` are copied through verbatim.
//! - Segments that are not plain words (`*`, `count(*)`) are left as written.
//!
//! # Example
//! ```ignore
//! use pgqb::{Caser, QbConfig};
//!
//! let caser = Caser::new(&QbConfig::default());
//! assert_eq!(caser.cased("createdAt", true), r#""created_at""#);
//! assert_eq!(caser.cased("public.!userId", true), r#""public".user_id"#);
//! ```

use crate::config::{NamingConvention, QbConfig};

/// Converts identifiers between the caller and database naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caser {
    db: NamingConvention,
    external: NamingConvention,
}

impl Caser {
    /// Caser for the conventions of `config`.
    pub fn new(config: &QbConfig) -> Self {
        Self {
            db: config.db_case,
            external: config.external_case,
        }
    }

    /// Convert `name` to the database convention, quoting word segments when
    /// `quote` is set.
    pub fn cased(&self, name: &str, quote: bool) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        let mut rest = name;

        while !rest.is_empty() {
            match rest.find(['"', '\'']) {
                Some(start) => {
                    self.write_path(&rest[..start], quote, &mut out);
                    let delim = rest[start..].chars().next().unwrap_or('"');
                    let body = &rest[start + 1..];
                    match body.find(delim) {
                        Some(end) => {
                            let stop = start + 1 + end + 1;
                            out.push_str(&rest[start..stop]);
                            rest = &rest[stop..];
                        }
                        None => {
                            // Unterminated quote: keep the remainder as written.
                            out.push_str(&rest[start..]);
                            rest = "";
                        }
                    }
                }
                None => {
                    self.write_path(rest, quote, &mut out);
                    rest = "";
                }
            }
        }

        out
    }

    /// Convert a database column name to the caller convention.
    pub fn external(&self, name: &str) -> String {
        if is_word(name) {
            self.external.apply(name)
        } else {
            name.to_string()
        }
    }

    fn write_path(&self, path: &str, quote: bool, out: &mut String) {
        for (i, segment) in path.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            let (segment, raw) = match segment.strip_prefix('!') {
                Some(stripped) => (stripped, true),
                None => (segment, false),
            };
            if !is_word(segment) {
                out.push_str(segment);
                continue;
            }
            let cased = self.db.apply(segment);
            if quote && !raw {
                write_quoted(&cased, out);
            } else {
                out.push_str(&cased);
            }
        }
    }
}

/// Quote a single identifier, escaping embedded `"` as `""`.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_quoted(name, &mut out);
    out
}

fn write_quoted(name: &str, out: &mut String) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}

fn is_word(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c == '_' || c.is_alphanumeric())
}
