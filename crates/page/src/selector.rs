//! Compound-selector subset used for write-target resolution.
//!
//! Only a single compound is supported: an optional type or universal part
//! followed by `#id`, `.class`, `[attr]`, and `[attr=value]` parts.
//! Combinators, pseudo-classes, and selector lists are parse errors; the
//! caller decides whether an error degrades to "no match".

use anyhow::{Result, bail};

use crate::{ElementKey, PageDom};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SimplePart {
    Universal,
    Type(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

/// A parsed compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    parts: Vec<SimplePart>,
}

impl CompoundSelector {
    /// Parse a compound selector, rejecting everything outside the subset.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        if text.is_empty() {
            bail!("empty selector");
        }
        if text.chars().any(char::is_whitespace) {
            bail!("combinators are not supported: {text:?}");
        }
        let mut parts = Vec::new();
        let mut rest = text;
        // Leading type or universal part.
        if let Some(stripped) = rest.strip_prefix('*') {
            parts.push(SimplePart::Universal);
            rest = stripped;
        } else if rest.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
            let end = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-'))
                .unwrap_or(rest.len());
            parts.push(SimplePart::Type(rest[..end].to_ascii_lowercase()));
            rest = &rest[end..];
        }
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix('#') {
                let (name, after) = take_name(tail)?;
                parts.push(SimplePart::Id(name));
                rest = after;
            } else if let Some(tail) = rest.strip_prefix('.') {
                let (name, after) = take_name(tail)?;
                parts.push(SimplePart::Class(name));
                rest = after;
            } else if let Some(tail) = rest.strip_prefix('[') {
                let Some(close) = tail.find(']') else {
                    bail!("unclosed attribute selector: {text:?}");
                };
                parts.push(parse_attribute(&tail[..close])?);
                rest = &tail[close + 1..];
            } else {
                bail!("unsupported selector syntax: {text:?}");
            }
        }
        Ok(Self { parts })
    }

    /// Whether `el` matches every part of this compound.
    pub fn matches<D: PageDom + ?Sized>(&self, dom: &D, el: ElementKey) -> bool {
        for part in &self.parts {
            match part {
                SimplePart::Universal => {}
                SimplePart::Type(tag) => {
                    if dom.tag_name(el).as_deref() != Some(tag.as_str()) {
                        return false;
                    }
                }
                SimplePart::Id(id) => {
                    if dom.element_id(el).as_deref() != Some(id.as_str()) {
                        return false;
                    }
                }
                SimplePart::Class(class) => {
                    let classes = dom.attribute(el, "class").unwrap_or_default();
                    if !classes.split_whitespace().any(|c| c == class) {
                        return false;
                    }
                }
                SimplePart::Attribute { name, value } => match dom.attribute(el, name) {
                    None => return false,
                    Some(actual) => {
                        if let Some(expected) = value
                            && &actual != expected
                        {
                            return false;
                        }
                    }
                },
            }
        }
        true
    }
}

/// Consume an identifier (for `#id` / `.class`), returning it and the rest.
fn take_name(input: &str) -> Result<(String, &str)> {
    let end = input
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'))
        .unwrap_or(input.len());
    if end == 0 {
        bail!("expected identifier in selector");
    }
    Ok((input[..end].to_owned(), &input[end..]))
}

/// Parse the inside of `[...]`: a bare name or `name=value` with optional
/// quotes around the value.
fn parse_attribute(body: &str) -> Result<SimplePart> {
    let body = body.trim();
    if body.is_empty() {
        bail!("empty attribute selector");
    }
    match body.split_once('=') {
        None => Ok(SimplePart::Attribute {
            name: body.to_ascii_lowercase(),
            value: None,
        }),
        Some((name, raw)) => {
            let name = name.trim();
            if name.is_empty() {
                bail!("attribute selector without a name");
            }
            let raw = raw.trim();
            let value = raw
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| raw.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(raw);
            Ok(SimplePart::Attribute {
                name: name.to_ascii_lowercase(),
                value: Some(value.to_owned()),
            })
        }
    }
}
