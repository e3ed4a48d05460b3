//! Field extraction rule chains.
//!
//! Each field of a posting has an ordered list of rules. The first rule that
//! yields a non-blank value wins, so a site redesign is handled by adding a
//! rule rather than rewriting the adapter.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::AppError;

/// A single extraction strategy over a document of type `D`.
pub trait Rule<D: ?Sized> {
    fn apply(&self, doc: &D) -> Option<String>;
}

/// Ordered rules for one field.
#[derive(Debug, Clone)]
pub struct FieldRules<R> {
    rules: Vec<R>,
}

impl<R> FieldRules<R> {
    pub fn new(rules: Vec<R>) -> Self {
        Self { rules }
    }

    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn first<D: ?Sized>(&self, doc: &D) -> Option<String>
    where
        R: Rule<D>,
    {
        self.rules
            .iter()
            .filter_map(|rule| rule.apply(doc))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }
}

pub fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::Selector(format!("{css}: {e:?}")))
}

/// Text nodes of `el`, trimmed, blank ones dropped, joined by `sep`.
pub fn element_text(el: ElementRef<'_>, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Rules over an HTML element (a listing row, or a page's root element).
#[derive(Debug, Clone)]
pub enum HtmlRule {
    /// Space-joined text of the first descendant matching the selector.
    Text(Selector),
    /// Newline-joined text of the first match, for multi-paragraph content.
    Block(Selector),
    /// Attribute of the first matching descendant.
    Attr(Selector, &'static str),
    /// Attribute of the element itself.
    OwnAttr(&'static str),
    /// First capture group of `Regex` applied to a descendant's attribute.
    AttrCapture(Selector, &'static str, Regex),
    /// Text under `inner` within the nearest ancestor matching the first
    /// selector, for values shared by a group of rows.
    AncestorText(Selector, Selector),
}

impl HtmlRule {
    pub fn text(css: &str) -> Result<Self, AppError> {
        Ok(Self::Text(selector(css)?))
    }

    pub fn block(css: &str) -> Result<Self, AppError> {
        Ok(Self::Block(selector(css)?))
    }

    pub fn attr(css: &str, attr: &'static str) -> Result<Self, AppError> {
        Ok(Self::Attr(selector(css)?, attr))
    }

    pub fn own_attr(attr: &'static str) -> Self {
        Self::OwnAttr(attr)
    }

    pub fn attr_capture(css: &str, attr: &'static str, pattern: &str) -> Result<Self, AppError> {
        let re = Regex::new(pattern)
            .map_err(|e| AppError::Config(format!("capture pattern {pattern}: {e}")))?;
        Ok(Self::AttrCapture(selector(css)?, attr, re))
    }

    pub fn ancestor_text(ancestor: &str, inner: &str) -> Result<Self, AppError> {
        Ok(Self::AncestorText(selector(ancestor)?, selector(inner)?))
    }
}

impl<'a> Rule<ElementRef<'a>> for HtmlRule {
    fn apply(&self, el: &ElementRef<'a>) -> Option<String> {
        match self {
            HtmlRule::Text(sel) => el.select(sel).next().map(|m| element_text(m, " ")),
            HtmlRule::Block(sel) => el.select(sel).next().map(|m| element_text(m, "\n")),
            HtmlRule::Attr(sel, attr) => el
                .select(sel)
                .find_map(|m| m.value().attr(attr))
                .map(String::from),
            HtmlRule::OwnAttr(attr) => el.value().attr(attr).map(String::from),
            HtmlRule::AttrCapture(sel, attr, re) => el
                .select(sel)
                .filter_map(|m| m.value().attr(attr))
                .find_map(|value| re.captures(value))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
            HtmlRule::AncestorText(ancestor, inner) => el
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| ancestor.matches(a))
                .and_then(|a| a.select(inner).next())
                .map(|m| element_text(m, " ")),
        }
    }
}

impl Rule<Html> for HtmlRule {
    fn apply(&self, doc: &Html) -> Option<String> {
        <Self as Rule<ElementRef<'_>>>::apply(self, &doc.root_element())
    }
}

/// Rules over a JSON value.
#[derive(Debug, Clone)]
pub enum JsonRule {
    /// RFC 6901 pointer to a string or number.
    Pointer(&'static str),
    /// `field` of every object in the array at the pointer, joined by `"; "`.
    Join(&'static str, &'static str),
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Rule<Value> for JsonRule {
    fn apply(&self, doc: &Value) -> Option<String> {
        match self {
            JsonRule::Pointer(pointer) => doc.pointer(pointer).and_then(scalar),
            JsonRule::Join(pointer, field) => {
                let joined = doc
                    .pointer(pointer)?
                    .as_array()?
                    .iter()
                    .filter_map(|item| item.get(*field).and_then(scalar))
                    .filter(|s| !s.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join("; ");
                Some(joined)
            }
        }
    }
}
