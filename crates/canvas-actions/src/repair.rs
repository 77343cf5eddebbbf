//! Best-effort repair of almost-JSON lines.
//!
//! Generated lines are frequently JS literals rather than JSON: single quotes, bare keys,
//! trailing commas, `//` comments, a trailing `,` after the tuple, or a missing closer.
//! [`repair_line`] rewrites those into strict JSON text; it does not validate the result.

/// Returns a JSON candidate for `line`, or `None` if the line holds no array at all.
pub fn repair_line(line: &str) -> Option<String> {
    let body = line.trim().trim_end_matches([',', ';']).trim_end();
    let start = body.find('[')?;
    let body = &body[start..];

    let chars = body.chars().collect::<Vec<_>>();
    let mut out = String::with_capacity(body.len() + 8);
    let mut closers = Vec::<char>::new();
    let mut idx = 0usize;

    while idx < chars.len() {
        let ch = chars[idx];
        match ch {
            '"' | '\'' => {
                idx = copy_string(&chars, idx, &mut out);
                continue;
            }
            '/' if chars.get(idx + 1) == Some(&'/') => break,
            '[' => {
                closers.push(']');
                out.push(ch);
            }
            '{' => {
                closers.push('}');
                out.push(ch);
            }
            ']' | '}' => {
                drop_trailing_comma(&mut out);
                if closers.last() == Some(&ch) {
                    closers.pop();
                }
                out.push(ch);
                if closers.is_empty() {
                    break;
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let begin = idx;
                while idx < chars.len()
                    && (chars[idx].is_ascii_alphanumeric() || chars[idx] == '_' || chars[idx] == '$')
                {
                    idx += 1;
                }
                let word = chars[begin..idx].iter().collect::<String>();
                let is_key = closers.last() == Some(&'}') && next_significant(&chars, idx) == Some(':');
                if is_key {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                } else if word == "undefined" {
                    out.push_str("null");
                } else {
                    out.push_str(&word);
                }
                continue;
            }
            _ => out.push(ch),
        }
        idx += 1;
    }

    drop_trailing_comma(&mut out);
    while let Some(closer) = closers.pop() {
        out.push(closer);
    }
    Some(out)
}

/// Copies a quoted string starting at `start` as a double-quoted JSON string and returns the
/// index after its closing quote. An unterminated string is closed at end of input.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut idx = start + 1;
    out.push('"');
    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '\\' {
            match chars.get(idx + 1) {
                Some('\'') => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(*next);
                }
                None => {}
            }
            idx += 2;
            continue;
        }
        if ch == quote {
            out.push('"');
            return idx + 1;
        }
        if ch == '"' {
            out.push_str("\\\"");
        } else {
            out.push(ch);
        }
        idx += 1;
    }
    out.push('"');
    idx
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from..].iter().copied().find(|c| !c.is_whitespace())
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed = out.trim_end().len();
    if out[..trimmed].ends_with(',') {
        out.truncate(trimmed - 1);
    }
}
