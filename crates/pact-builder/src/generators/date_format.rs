//! Java-style date patterns (`yyyy-MM-dd'T'HH:mm:ss`) rendered with chrono.
//!
//! Contracts carry the pattern verbatim; the example value is produced by
//! translating the pattern into strftime items.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

/// Translate a Java-style pattern into a strftime string.
///
/// Quoted text (`'T'`) is kept literally and `''` is a single quote.
/// Unsupported pattern letters are an error.
pub fn to_strftime(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            loop {
                match (chars.get(i), chars.get(i + 1)) {
                    (None, _) => return Err(format!("unterminated quote in \"{pattern}\"")),
                    (Some('\''), Some('\'')) => {
                        out.push('\'');
                        i += 2;
                    }
                    (Some('\''), _) => {
                        i += 1;
                        break;
                    }
                    (Some(&literal), _) => {
                        push_literal(&mut out, literal);
                        i += 1;
                    }
                }
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&r| r == c).count();
        out.push_str(specifier(c, run).ok_or_else(|| {
            format!("unsupported pattern letter '{c}' in \"{pattern}\"")
        })?);
        i += run;
    }

    if StrftimeItems::new(&out).any(|item| matches!(item, Item::Error)) {
        return Err(format!("pattern \"{pattern}\" can not be rendered"));
    }
    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn specifier(letter: char, run: usize) -> Option<&'static str> {
    let spec = match (letter, run) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M' | 'L', 1) => "%-m",
        ('M' | 'L', 2) => "%m",
        ('M' | 'L', 3) => "%b",
        ('M' | 'L', _) => "%B",
        ('d', 1) => "%-d",
        ('d', _) => "%d",
        ('D', _) => "%j",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('a', _) => "%p",
        ('H', 1) => "%-H",
        ('H', _) => "%H",
        ('h', 1) => "%-I",
        ('h', _) => "%I",
        ('m', 1) => "%-M",
        ('m', _) => "%M",
        ('s', 1) => "%-S",
        ('s', _) => "%S",
        ('S', 1..=3) => "%3f",
        ('S', 4..=6) => "%6f",
        ('S', _) => "%9f",
        ('Z', _) => "%z",
        ('X' | 'x', 1 | 2) => "%z",
        ('X' | 'x', _) => "%:z",
        ('z', _) => "%Z",
        _ => return None,
    };
    Some(spec)
}

/// Render `moment` with a Java-style pattern.
pub fn render(moment: &DateTime<Utc>, pattern: &str) -> Result<String, String> {
    let strftime = to_strftime(pattern)?;
    let mut rendered = String::new();
    write!(
        rendered,
        "{}",
        moment.format_with_items(StrftimeItems::new(&strftime))
    )
    .map_err(|_| format!("pattern \"{pattern}\" can not be rendered"))?;
    Ok(rendered)
}
