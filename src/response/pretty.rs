// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Indented rendering of raw responses.

const INDENT: &str = "  ";

/// Re-indents a raw response for display.
///
/// Works on the text, not a parsed document, so it also renders responses
/// that are not strictly valid JSON. Breaks after `{`, `[` and `,`, and
/// before `}` and `]`, indenting two spaces per level.
///
/// # Examples
///
/// ```
/// use kasa_lan::response::pretty;
///
/// assert_eq!(pretty(r#"{"a":1,"b":[2]}"#), "{\n  \"a\":1,\n  \"b\":[\n    2\n  ]\n}");
/// ```
#[must_use]
pub fn pretty(response: &str) -> String {
    let mut out = String::with_capacity(response.len() * 2);
    let mut depth = 0usize;

    for c in response.chars() {
        match c {
            '{' | '[' => {
                depth += 1;
                out.push(c);
                newline(&mut out, depth);
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                newline(&mut out, depth);
                out.push(c);
            }
            ',' => {
                out.push(c);
                newline(&mut out, depth);
            }
            _ => out.push(c),
        }
    }
    out
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    out.push_str(&INDENT.repeat(depth));
}
