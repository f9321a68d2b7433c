//! Position-carrying node model for a YAML subset.
//!
//! The parser supports mappings, sequences, basic scalars, quoted strings,
//! and inline `{...}` / `[...]` collections. It is intentionally limited and
//! tailored for predictable configuration decoding. Two properties matter to
//! the decoder and distinguish this from a general-purpose YAML parser:
//! every node records its 1-based line and column, and duplicate mapping
//! keys are preserved in document order (duplicate keys are a decode error,
//! not a parse error).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

const MAX_DOCUMENT_LINES: usize = 100_000;
const MAX_CONTAINER_DEPTH: usize = 64;
const MAX_COLLECTION_ITEMS: usize = 50_000;
const MAX_INLINE_VALUE_LEN: usize = 64 * 1024;

/// Document-level classification of a parsed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Scalar,
    Sequence,
    Mapping,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Scalar => "scalar",
            Kind::Sequence => "sequence",
            Kind::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

/// One parsed document element with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// 1-based source line of the first character of this value.
    pub line: usize,
    /// 1-based source column of the first character of this value.
    pub column: usize,
    content: NodeContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeContent {
    Scalar { text: String, quoted: bool },
    Sequence(Vec<Node>),
    Mapping(Vec<MapEntry>),
}

/// Single `key: value` pair of a mapping node.
///
/// Entries are kept as a list rather than a map so that duplicate keys
/// survive parsing and can be reported by the decoder with the position of
/// the offending occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub key: String,
    pub key_line: usize,
    pub key_column: usize,
    pub value: Node,
}

impl Node {
    fn scalar(text: String, quoted: bool, line: usize, column: usize) -> Self {
        Node {
            line,
            column,
            content: NodeContent::Scalar { text, quoted },
        }
    }

    fn sequence(items: Vec<Node>, line: usize, column: usize) -> Self {
        Node {
            line,
            column,
            content: NodeContent::Sequence(items),
        }
    }

    fn mapping(entries: Vec<MapEntry>, line: usize, column: usize) -> Self {
        Node {
            line,
            column,
            content: NodeContent::Mapping(entries),
        }
    }

    pub fn kind(&self) -> Kind {
        match &self.content {
            NodeContent::Scalar { .. } => Kind::Scalar,
            NodeContent::Sequence(_) => Kind::Sequence,
            NodeContent::Mapping(_) => Kind::Mapping,
        }
    }

    /// Literal scalar text, if this node is a scalar.
    pub fn scalar_text(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Scalar { text, .. } => Some(text),
            _ => None,
        }
    }

    /// True for an unquoted empty, `null`, or `~` scalar. Quoting defeats
    /// null detection: `"null"` is the four-character string.
    pub fn is_null(&self) -> bool {
        match &self.content {
            NodeContent::Scalar { text, quoted } => {
                !quoted && (text.is_empty() || text == "null" || text == "~")
            }
            _ => false,
        }
    }

    pub fn items(&self) -> Option<&[Node]> {
        match &self.content {
            NodeContent::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn entries(&self) -> Option<&[MapEntry]> {
        match &self.content {
            NodeContent::Mapping(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Parses a YAML-subset document into a node tree.
///
/// An empty (or comment-only) document parses as an empty mapping.
pub fn parse(input: &str) -> Result<Node, ParseError> {
    let lines: Vec<Line<'_>> = input
        .lines()
        .enumerate()
        .map(|(i, raw)| Line { number: i + 1, raw })
        .collect();

    if lines.len() > MAX_DOCUMENT_LINES {
        return Err(ParseError::new(
            lines.len(),
            format!("document exceeds max supported line count ({MAX_DOCUMENT_LINES})"),
        ));
    }

    let mut idx = 0usize;
    while idx < lines.len() && is_ignorable(lines[idx].raw) {
        idx += 1;
    }

    if idx >= lines.len() {
        return Ok(Node::mapping(Vec::new(), 1, 1));
    }

    let indent = leading_spaces(lines[idx].raw);
    parse_block(&lines, &mut idx, indent, 0)
}

#[derive(Clone, Copy)]
struct Line<'a> {
    number: usize,
    raw: &'a str,
}

fn parse_block(
    lines: &[Line<'_>],
    idx: &mut usize,
    indent: usize,
    depth: usize,
) -> Result<Node, ParseError> {
    if depth > MAX_CONTAINER_DEPTH {
        return Err(ParseError::new(
            lines.get(*idx).map(|l| l.number).unwrap_or(0),
            format!("maximum nesting depth exceeded ({MAX_CONTAINER_DEPTH})"),
        ));
    }

    while *idx < lines.len() && is_ignorable(lines[*idx].raw) {
        *idx += 1;
    }

    if *idx >= lines.len() {
        return Ok(Node::mapping(Vec::new(), 1, 1));
    }

    let line = lines[*idx];
    let current_indent = leading_spaces(line.raw);
    if current_indent != indent {
        return Err(ParseError::new(
            line.number,
            format!("unexpected indentation: expected {indent}, found {current_indent}"),
        ));
    }

    let trimmed = &line.raw[indent..];
    if trimmed.starts_with("- ") || trimmed == "-" {
        parse_sequence(lines, idx, indent, depth)
    } else if find_unquoted_colon(trimmed).is_some() {
        parse_mapping(lines, idx, indent, depth)
    } else {
        let node = parse_inline_value(trimmed, line.number, indent + 1, depth + 1)?;
        *idx += 1;
        Ok(node)
    }
}

fn parse_mapping(
    lines: &[Line<'_>],
    idx: &mut usize,
    indent: usize,
    depth: usize,
) -> Result<Node, ParseError> {
    let start = lines[*idx];
    let mut entries: Vec<MapEntry> = Vec::new();

    while *idx < lines.len() {
        if is_ignorable(lines[*idx].raw) {
            *idx += 1;
            continue;
        }

        let line = lines[*idx];
        let current_indent = leading_spaces(line.raw);
        if current_indent < indent {
            break;
        }
        if current_indent > indent {
            return Err(ParseError::new(
                line.number,
                format!("unexpected indentation in mapping: expected {indent}"),
            ));
        }

        let trimmed = &line.raw[indent..];
        if trimmed.starts_with("- ") || trimmed == "-" {
            return Err(ParseError::new(
                line.number,
                "mixed sequence/mapping block".to_string(),
            ));
        }

        *idx += 1;
        let entry = parse_entry(lines, idx, trimmed, line.number, indent, depth)?;
        entries.push(entry);
        if entries.len() > MAX_COLLECTION_ITEMS {
            return Err(ParseError::new(
                line.number,
                format!("mapping exceeds max entry count ({MAX_COLLECTION_ITEMS})"),
            ));
        }
    }

    Ok(Node::mapping(entries, start.number, indent + 1))
}

/// Parses one `key: value` mapping entry whose content starts at `indent`
/// on the line numbered `line_number`; `idx` must already sit past that
/// line so nested blocks can be consumed.
fn parse_entry(
    lines: &[Line<'_>],
    idx: &mut usize,
    trimmed: &str,
    line_number: usize,
    indent: usize,
    depth: usize,
) -> Result<MapEntry, ParseError> {
    let colon = find_unquoted_colon(trimmed)
        .ok_or_else(|| ParseError::new(line_number, "expected key:value".to_string()))?;

    let key = parse_key(trimmed[..colon].trim_end(), line_number)?;
    let key_column = indent + 1;

    let after_colon = &trimmed[colon + 1..];
    let value_raw = after_colon.trim_start();
    let pad = after_colon.len() - value_raw.len();
    let value_column = indent + colon + 1 + pad + 1;

    let value = if strip_inline_comment(value_raw).trim().is_empty() {
        parse_nested_or_null(lines, idx, indent, depth, line_number, value_column)?
    } else {
        parse_inline_value(value_raw, line_number, value_column, depth + 1)?
    };

    Ok(MapEntry {
        key,
        key_line: line_number,
        key_column,
        value,
    })
}

fn parse_sequence(
    lines: &[Line<'_>],
    idx: &mut usize,
    indent: usize,
    depth: usize,
) -> Result<Node, ParseError> {
    let start = lines[*idx];
    let mut items: Vec<Node> = Vec::new();

    while *idx < lines.len() {
        if is_ignorable(lines[*idx].raw) {
            *idx += 1;
            continue;
        }

        let line = lines[*idx];
        let current_indent = leading_spaces(line.raw);
        if current_indent < indent {
            break;
        }
        if current_indent > indent {
            return Err(ParseError::new(
                line.number,
                format!("unexpected indentation in sequence: expected {indent}"),
            ));
        }

        let trimmed = &line.raw[indent..];
        if !(trimmed.starts_with("- ") || trimmed == "-") {
            break;
        }

        let after_dash = if trimmed == "-" { "" } else { &trimmed[2..] };
        let rest = after_dash.trim_start();
        let pad = after_dash.len() - rest.len();
        let item_column = indent + 2 + pad + 1;
        *idx += 1;

        let content = strip_inline_comment(rest);
        let item = if content.trim().is_empty() {
            parse_nested_or_null(lines, idx, indent, depth, line.number, item_column)?
        } else if find_unquoted_colon(content).is_some() {
            // `- key: value`: the item is a block mapping anchored at the
            // dash-content indent, continuing on the following lines.
            parse_dash_mapping(lines, idx, rest, line.number, item_column - 1, depth)?
        } else {
            parse_inline_value(rest, line.number, item_column, depth + 1)?
        };

        items.push(item);
        if items.len() > MAX_COLLECTION_ITEMS {
            return Err(ParseError::new(
                line.number,
                format!("sequence exceeds max item count ({MAX_COLLECTION_ITEMS})"),
            ));
        }
    }

    Ok(Node::sequence(items, start.number, indent + 1))
}

/// Parses a sequence item that is itself a block mapping. The first entry
/// sits on the dash line; further entries continue on following lines at
/// the dash-content indent.
fn parse_dash_mapping(
    lines: &[Line<'_>],
    idx: &mut usize,
    first: &str,
    first_line: usize,
    content_indent: usize,
    depth: usize,
) -> Result<Node, ParseError> {
    if depth > MAX_CONTAINER_DEPTH {
        return Err(ParseError::new(
            first_line,
            format!("maximum nesting depth exceeded ({MAX_CONTAINER_DEPTH})"),
        ));
    }

    let mut entries: Vec<MapEntry> = Vec::new();
    entries.push(parse_entry(
        lines,
        idx,
        first,
        first_line,
        content_indent,
        depth,
    )?);

    while *idx < lines.len() {
        if is_ignorable(lines[*idx].raw) {
            *idx += 1;
            continue;
        }

        let line = lines[*idx];
        let current_indent = leading_spaces(line.raw);
        if current_indent < content_indent {
            break;
        }
        if current_indent > content_indent {
            return Err(ParseError::new(
                line.number,
                format!("unexpected indentation in mapping: expected {content_indent}"),
            ));
        }

        let trimmed = &line.raw[content_indent..];
        if trimmed.starts_with("- ") || trimmed == "-" {
            return Err(ParseError::new(
                line.number,
                "mixed sequence/mapping block".to_string(),
            ));
        }

        *idx += 1;
        let entry = parse_entry(lines, idx, trimmed, line.number, content_indent, depth)?;
        entries.push(entry);
        if entries.len() > MAX_COLLECTION_ITEMS {
            return Err(ParseError::new(
                line.number,
                format!("mapping exceeds max entry count ({MAX_COLLECTION_ITEMS})"),
            ));
        }
    }

    Ok(Node::mapping(entries, first_line, content_indent + 1))
}

/// Parses the block nested under a `key:` or `-` with nothing after it,
/// or yields a null scalar when nothing deeper follows.
fn parse_nested_or_null(
    lines: &[Line<'_>],
    idx: &mut usize,
    indent: usize,
    depth: usize,
    line_number: usize,
    column: usize,
) -> Result<Node, ParseError> {
    let mut lookahead = *idx;
    while lookahead < lines.len() && is_ignorable(lines[lookahead].raw) {
        lookahead += 1;
    }

    if lookahead >= lines.len() {
        return Ok(Node::scalar(String::new(), false, line_number, column));
    }

    let next_indent = leading_spaces(lines[lookahead].raw);
    if next_indent <= indent {
        Ok(Node::scalar(String::new(), false, line_number, column))
    } else {
        parse_block(lines, idx, next_indent, depth + 1)
    }
}

fn parse_inline_value(
    raw: &str,
    line: usize,
    column: usize,
    depth: usize,
) -> Result<Node, ParseError> {
    if depth > MAX_CONTAINER_DEPTH {
        return Err(ParseError::new(
            line,
            format!("maximum nesting depth exceeded ({MAX_CONTAINER_DEPTH})"),
        ));
    }

    if raw.len() > MAX_INLINE_VALUE_LEN {
        return Err(ParseError::new(
            line,
            format!("inline value exceeds max length ({MAX_INLINE_VALUE_LEN})"),
        ));
    }

    let s = raw.trim_end();
    if s.starts_with('"') || s.starts_with('\'') {
        let text = parse_quoted_string(s, line)?;
        return Ok(Node::scalar(text, true, line, column));
    }

    if s.starts_with('{') {
        return parse_inline_mapping(s, line, column, depth + 1);
    }
    if s.starts_with('[') {
        return parse_inline_sequence(s, line, column, depth + 1);
    }

    let text = strip_inline_comment(s).trim_end().to_string();
    Ok(Node::scalar(text, false, line, column))
}

fn parse_inline_mapping(
    raw: &str,
    line: usize,
    column: usize,
    depth: usize,
) -> Result<Node, ParseError> {
    let stripped = strip_inline_comment(raw).trim_end();
    let Some(inner) = stripped.strip_prefix('{').and_then(|v| v.strip_suffix('}')) else {
        return Err(ParseError::new(
            line,
            format!("invalid inline mapping '{raw}': missing braces"),
        ));
    };

    let mut entries: Vec<MapEntry> = Vec::new();
    for (offset, part) in split_top_level(inner, ',') {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        let pad = part.len() - part.trim_start().len();
        // offset is relative to `inner`, which starts one byte past `{`.
        let part_column = column + 1 + offset + pad;

        let colon = find_unquoted_colon(p).ok_or_else(|| {
            ParseError::new(line, format!("invalid inline mapping entry '{p}': expected ':'"))
        })?;

        let key = parse_key(p[..colon].trim_end(), line)?;
        let after_colon = &p[colon + 1..];
        let value_raw = after_colon.trim_start();
        let value_pad = after_colon.len() - value_raw.len();
        let value_column = part_column + colon + 1 + value_pad;

        let value = if value_raw.is_empty() {
            Node::scalar(String::new(), false, line, value_column)
        } else {
            parse_inline_value(value_raw, line, value_column, depth + 1)?
        };

        entries.push(MapEntry {
            key,
            key_line: line,
            key_column: part_column,
            value,
        });
        if entries.len() > MAX_COLLECTION_ITEMS {
            return Err(ParseError::new(
                line,
                format!("inline mapping exceeds max entry count ({MAX_COLLECTION_ITEMS})"),
            ));
        }
    }

    Ok(Node::mapping(entries, line, column))
}

fn parse_inline_sequence(
    raw: &str,
    line: usize,
    column: usize,
    depth: usize,
) -> Result<Node, ParseError> {
    let stripped = strip_inline_comment(raw).trim_end();
    let Some(inner) = stripped.strip_prefix('[').and_then(|v| v.strip_suffix(']')) else {
        return Err(ParseError::new(
            line,
            format!("invalid inline sequence '{raw}': missing brackets"),
        ));
    };

    let mut items = Vec::new();
    for (offset, part) in split_top_level(inner, ',') {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        let pad = part.len() - part.trim_start().len();
        let item_column = column + 1 + offset + pad;
        items.push(parse_inline_value(p, line, item_column, depth + 1)?);
        if items.len() > MAX_COLLECTION_ITEMS {
            return Err(ParseError::new(
                line,
                format!("inline sequence exceeds max item count ({MAX_COLLECTION_ITEMS})"),
            ));
        }
    }

    Ok(Node::sequence(items, line, column))
}

/// Splits on a delimiter at bracket/brace depth zero outside quotes,
/// returning each part with its byte offset into `input`.
fn split_top_level(input: &str, delimiter: char) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut depth_brace = 0i32;
    let mut depth_bracket = 0i32;
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;

    for (i, ch) in input.char_indices() {
        if in_double && escape {
            escape = false;
            continue;
        }
        if in_double && ch == '\\' {
            escape = true;
            continue;
        }

        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '{' if !in_single && !in_double => depth_brace += 1,
            '}' if !in_single && !in_double => depth_brace -= 1,
            '[' if !in_single && !in_double => depth_bracket += 1,
            ']' if !in_single && !in_double => depth_bracket -= 1,
            c if c == delimiter
                && !in_single
                && !in_double
                && depth_brace == 0
                && depth_bracket == 0 =>
            {
                out.push((start, &input[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    out.push((start, &input[start..]));
    out
}

fn parse_key(raw: &str, line: usize) -> Result<String, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(line, "empty mapping key".to_string()));
    }

    if trimmed.starts_with('"') || trimmed.starts_with('\'') {
        return parse_quoted_string(trimmed, line);
    }

    Ok(trimmed.to_string())
}

fn parse_quoted_string(raw: &str, line: usize) -> Result<String, ParseError> {
    let mut chars = raw.chars();
    let quote = chars
        .next()
        .ok_or_else(|| ParseError::new(line, "empty quoted string".to_string()))?;

    if quote != '"' && quote != '\'' {
        return Err(ParseError::new(
            line,
            format!("invalid quoted string '{raw}': missing quote"),
        ));
    }

    let mut out = String::new();
    let mut escaped = false;
    for ch in chars {
        if escaped {
            let actual = match ch {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            };
            out.push(actual);
            escaped = false;
            continue;
        }

        if quote == '"' && ch == '\\' {
            escaped = true;
            continue;
        }

        if ch == quote {
            return Ok(out);
        }

        out.push(ch);
    }

    Err(ParseError::new(
        line,
        format!("unterminated quoted string '{raw}'"),
    ))
}

fn find_unquoted_colon(input: &str) -> Option<usize> {
    let mut in_single = false;
    let mut in_double = false;
    let mut depth_brace = 0i32;
    let mut depth_bracket = 0i32;
    let mut escape = false;

    for (i, ch) in input.char_indices() {
        if in_double && escape {
            escape = false;
            continue;
        }
        if in_double && ch == '\\' {
            escape = true;
            continue;
        }

        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '{' if !in_single && !in_double => depth_brace += 1,
            '}' if !in_single && !in_double => depth_brace -= 1,
            '[' if !in_single && !in_double => depth_bracket += 1,
            ']' if !in_single && !in_double => depth_bracket -= 1,
            ':' if !in_single && !in_double && depth_brace == 0 && depth_bracket == 0 => {
                return Some(i)
            }
            _ => {}
        }
    }

    None
}

fn strip_inline_comment(input: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;

    for (i, ch) in input.char_indices() {
        if in_double && escape {
            escape = false;
            continue;
        }
        if in_double && ch == '\\' {
            escape = true;
            continue;
        }

        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => {
                if i == 0 {
                    return "";
                }
                let prev = input[..i].chars().last().unwrap_or(' ');
                if prev.is_whitespace() {
                    return input[..i].trim_end();
                }
            }
            _ => {}
        }
    }

    input
}

fn leading_spaces(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}
