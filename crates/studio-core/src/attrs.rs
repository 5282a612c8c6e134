//! Attribute resolution over raw tag attribute text.
//!
//! Pulls geometry, style and join values out of either explicit attributes
//! (`key="literal"`, `key='literal'`, `key={expression}`, bare `key`) or an
//! inline style declaration block (`style={{ left: 120 }}` or the CSS string
//! form `style="left: 120px"`).
//!
//! Everything here is a pure lookup: a value that cannot be read resolves to
//! `None` (or the caller's fallback), never to an error.

use std::borrow::Cow;
use winnow::combinator::{alt, delimited, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

// ─── Attribute values ────────────────────────────────────────────────────

/// A raw attribute value as written in the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrValue<'a> {
    /// `key="..."`, `key='...'` or `key=bare`. Still entity-encoded.
    Literal(&'a str),
    /// `key={...}`, without the outer braces.
    Expr(&'a str),
    /// A bare `key` with no value.
    Flag,
}

/// The attribute list of one tag, tokenized once for repeated lookups.
#[derive(Debug, Clone, Default)]
pub struct Attributes<'a> {
    raw: &'a str,
    pairs: Vec<(&'a str, AttrValue<'a>)>,
}

impl<'a> Attributes<'a> {
    /// Tokenize a complete attribute fragment.
    pub fn parse(raw: &'a str) -> Self {
        let mut input = raw;
        Self::scan(&mut input)
    }

    /// Tokenize attributes up to (not including) the tag's closing `>` or `/>`.
    pub(crate) fn scan(input: &mut &'a str) -> Self {
        let start = *input;
        let mut pairs = Vec::new();
        loop {
            skip_ws(input);
            if input.is_empty() || input.starts_with('>') || input.starts_with("/>") {
                break;
            }
            let before = *input;
            match attribute.parse_next(input) {
                Ok(pair) => pairs.push(pair),
                Err(_) => {
                    *input = before;
                    // JSX spread `{...props}` or a stray character.
                    if braced.parse_next(input).is_err() {
                        advance_char(input);
                    }
                }
            }
        }
        let raw = &start[..start.len() - input.len()];
        Self { raw, pairs }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Whether the attribute is present in any form, flags included.
    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| *k == key)
    }

    /// First raw value for `key`, in document order.
    pub fn value(&self, key: &str) -> Option<AttrValue<'a>> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Resolve `key`: the quoted literal form wins over the expression form,
    /// regardless of which appears first. Flags have no value.
    pub fn get(&self, key: &str) -> Option<String> {
        let literal = self.pairs.iter().find_map(|(k, v)| match v {
            AttrValue::Literal(s) if *k == key => Some(decode_entities(s).into_owned()),
            _ => None,
        });
        literal.or_else(|| {
            self.pairs.iter().find_map(|(k, v)| match v {
                AttrValue::Expr(e) if *k == key => Some(unquote_expr(e)),
                _ => None,
            })
        })
    }

    /// The first of `keys` that resolves to a value.
    pub fn get_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Like [`get_any`](Self::get_any) but skips blank values.
    pub fn get_non_empty(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    pub fn number(&self, key: &str) -> Option<f32> {
        self.get(key).as_deref().and_then(parse_number)
    }

    /// Full-precision variant of [`number`](Self::number), for join ids.
    pub fn number_f64(&self, key: &str) -> Option<f64> {
        self.get(key).as_deref().and_then(parse_number_f64)
    }

    /// The first of `keys` whose value is numeric.
    pub fn number_any(&self, keys: &[&str]) -> Option<f32> {
        keys.iter().find_map(|key| self.number(key))
    }

    /// Present and not explicitly disabled (`key`, `key="true"`, `key={true}`).
    pub fn flag(&self, key: &str) -> bool {
        match self.value(key) {
            Some(AttrValue::Flag) => true,
            Some(_) => self
                .get(key)
                .is_none_or(|v| !matches!(v.trim(), "false" | "0" | "no")),
            None => false,
        }
    }

    /// The inline style declarations of this tag, if any.
    pub fn style(&self) -> StyleBlock {
        match self.value("style") {
            Some(AttrValue::Expr(expr)) => match object_body(expr) {
                Some(body) => StyleBlock::parse_object(body),
                None => StyleBlock::default(),
            },
            Some(AttrValue::Literal(css)) => StyleBlock::parse_css(&decode_entities(css)),
            _ => StyleBlock::default(),
        }
    }
}

/// Resolve a single attribute from a raw attribute fragment.
pub fn attr(raw: &str, key: &str) -> Option<String> {
    Attributes::parse(raw).get(key)
}

/// Isolate the content between a double-brace style wrapper
/// (`style={{ ... }}`), without the braces.
pub fn style_block(raw: &str) -> Option<&str> {
    match Attributes::parse(raw).value("style")? {
        AttrValue::Expr(expr) => object_body(expr),
        _ => None,
    }
}

/// Look up a string value in a style block's content.
pub fn style_value(block: &str, key: &str) -> Option<String> {
    StyleBlock::parse_object(block).value(key).map(str::to_string)
}

/// Look up a numeric (or `Npx`) value in a style block's content.
pub fn style_number(block: &str, key: &str) -> Option<f32> {
    StyleBlock::parse_object(block).number(key)
}

// ─── Style blocks ────────────────────────────────────────────────────────

/// Parsed `key: value` style declarations with camelCase keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBlock {
    entries: Vec<(String, String)>,
}

impl StyleBlock {
    /// Parse the body of a JS object literal: `left: 120, color: '#fff'`.
    pub fn parse_object(content: &str) -> Self {
        let mut input = content;
        let mut entries = Vec::new();
        loop {
            input = input.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            if input.is_empty() {
                break;
            }
            let before = input;
            match style_entry.parse_next(&mut input) {
                Ok(entry) => entries.push(entry),
                Err(_) => {
                    input = before;
                    if bare_value.parse_next(&mut input).is_err() {
                        advance_char(&mut input);
                    }
                }
            }
        }
        Self { entries }
    }

    /// Parse a CSS declaration string: `left: 120px; background-color: #222`.
    pub fn parse_css(content: &str) -> Self {
        let entries = content
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .map(|(k, v)| (kebab_to_camel(k.trim()), unquote(v.trim()).to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// A non-empty value for `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.value(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Numeric value: plain numbers and pixel strings; percentages are not pixels.
    pub fn number(&self, key: &str) -> Option<f32> {
        self.value(key).and_then(parse_number)
    }
}

// ─── Numbers ─────────────────────────────────────────────────────────────

/// Parse a number with optional sign, decimal point and `px` suffix.
/// Anything else (`50%`, `auto`, `12abc`) is rejected.
pub fn parse_number(s: &str) -> Option<f32> {
    parse_number_f64(s)
        .map(|v| v as f32)
        .filter(|v| v.is_finite())
}

/// [`parse_number`] without the narrowing to `f32`.
pub fn parse_number_f64(s: &str) -> Option<f64> {
    let mut input = s.trim();
    let literal = number_literal.parse_next(&mut input).ok()?;
    let rest = input.trim();
    if !(rest.is_empty() || rest.eq_ignore_ascii_case("px")) {
        return None;
    }
    literal.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// [`parse_number`] with a caller-supplied fallback.
pub fn number_or(s: &str, fallback: f32) -> f32 {
    parse_number(s).unwrap_or(fallback)
}

fn number_literal<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        opt(one_of(['+', '-'])),
        take_while(0.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(0.., |c: char| c.is_ascii_digit()))),
    )
        .take()
        .verify(|s: &str| s.bytes().any(|b| b.is_ascii_digit()))
        .parse_next(input)
}

// ─── Text helpers ────────────────────────────────────────────────────────

/// Decode the handful of entities the emitter produces.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&apos;", "'")
            .replace("&amp;", "&"),
    )
}

/// Inverse of [`decode_entities`] for attribute values and text runs.
pub fn encode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;"),
    )
}

/// `{'text'}` → `text`; `{1201}` → `1201`; other expressions are kept trimmed.
fn unquote_expr(expr: &str) -> String {
    unquote(expr.trim()).to_string()
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\'', '`'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// `{ ... }` → `...` for an expression that is itself an object literal.
fn object_body(expr: &str) -> Option<&str> {
    expr.trim().strip_prefix('{')?.strip_suffix('}')
}

fn kebab_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ─── Low-level scanners ──────────────────────────────────────────────────

fn skip_ws(input: &mut &str) {
    *input = input.trim_start();
}

fn advance_char(input: &mut &str) {
    let mut chars = input.chars();
    chars.next();
    *input = chars.as_str();
}

fn attr_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.' | '@' | '$')
    })
    .parse_next(input)
}

fn quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

fn bare_attr_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '>' && c != '/').parse_next(input)
}

fn attribute<'a>(input: &mut &'a str) -> ModalResult<(&'a str, AttrValue<'a>)> {
    let name = attr_name.parse_next(input)?;
    let after_name = *input;
    skip_ws(input);
    if !input.starts_with('=') {
        *input = after_name;
        return Ok((name, AttrValue::Flag));
    }
    let _ = '='.parse_next(input)?;
    skip_ws(input);
    let value = alt((
        quoted.map(AttrValue::Literal),
        braced.map(AttrValue::Expr),
        bare_attr_value.map(AttrValue::Literal),
    ))
    .parse_next(input)?;
    Ok((name, value))
}

/// A balanced `{ ... }` group, quote-aware. Returns the inner text.
pub(crate) fn braced<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let s = *input;
    if !s.starts_with('{') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    *input = &s[i + 1..];
                    return Ok(&s[1..i]);
                }
            }
            _ => {}
        }
    }
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn style_key<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        quoted,
        take_while(1.., |c: char| c.is_alphanumeric() || matches!(c, '_' | '$' | '-')),
    ))
    .parse_next(input)
}

/// An unquoted object value: everything up to a top-level `,` or `}`.
fn bare_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let s = *input;
    let mut depth = 0usize;
    let mut end = s.len();
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' if depth > 0 => depth -= 1,
            '}' if depth > 0 => depth -= 1,
            ',' | '}' if depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    if end == 0 {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    *input = &s[end..];
    Ok(&s[..end])
}

fn style_entry(input: &mut &str) -> ModalResult<(String, String)> {
    let key = style_key.parse_next(input)?;
    skip_ws(input);
    let _ = ':'.parse_next(input)?;
    skip_ws(input);
    let value = alt((
        quoted.map(|s: &str| decode_entities(s).into_owned()),
        bare_value.map(|s: &str| s.trim().to_string()),
    ))
    .parse_next(input)?;
    Ok((key.to_string(), value))
}
