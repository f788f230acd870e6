//! Locator evaluation against the mock DOM.
//!
//! Supports the subset of CSS and XPath that page objects actually use:
//!
//! * CSS: `tag`, `#id`, `.class`, `[attr]`, `[attr=value]`, descendant and
//!   `>` child combinators.
//! * XPath: `/`, `//`, `./`, `.//` paths of name tests (or `*`) with
//!   `[@attr='v']`, `[@attr]`, `[text()='v']` and `[n]` predicates.

use std::collections::HashMap;

use super::dom::MockDom;
use crate::driver::{DriverError, DriverResult};
use crate::locator::{Locator, Strategy};

/// Evaluate `locator` in `scope` (`None` = whole document), document order
pub(crate) fn query(dom: &MockDom, scope: Option<usize>, locator: &Locator) -> DriverResult<Vec<usize>> {
    let value = locator.value();
    let candidates = || match scope {
        Some(idx) => dom.descendants(idx),
        None => dom.document_order(),
    };
    let matches = match locator.strategy() {
        Strategy::Id => filter(candidates(), |i| dom.attr_idx(i, "id") == Some(value)),
        Strategy::Name => filter(candidates(), |i| dom.attr_idx(i, "name") == Some(value)),
        Strategy::TagName => filter(candidates(), |i| {
            dom.tag(i).is_some_and(|t| t.eq_ignore_ascii_case(value))
        }),
        Strategy::ClassName => filter(candidates(), |i| has_class(dom, i, value)),
        Strategy::LinkText => filter(candidates(), |i| {
            dom.tag(i) == Some("a") && dom.text_of(i).trim() == value
        }),
        Strategy::PartialLinkText => filter(candidates(), |i| {
            dom.tag(i) == Some("a") && dom.text_of(i).contains(value)
        }),
        Strategy::Css => {
            let parts = parse_css(value)?;
            filter(candidates(), |i| css_matches(dom, i, &parts))
        }
        Strategy::XPath => {
            let path = parse_xpath(value)?;
            eval_xpath(dom, scope, &path)
        }
    };
    Ok(matches)
}

fn filter(candidates: Vec<usize>, pred: impl Fn(usize) -> bool) -> Vec<usize> {
    candidates.into_iter().filter(|&i| pred(i)).collect()
}

fn has_class(dom: &MockDom, idx: usize, class: &str) -> bool {
    dom.attr_idx(idx, "class")
        .is_some_and(|c| c.split_whitespace().any(|c| c == class))
}

fn invalid(kind: &str, selector: &str) -> DriverError {
    DriverError::other(format!("invalid selector: unsupported {kind} [{selector}]"))
}

fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = raw.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
            return inner;
        }
    }
    raw
}

// =============================================================================
// CSS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn parse_css(selector: &str) -> DriverResult<Vec<(Combinator, Compound)>> {
    let spaced = selector.replace('>', " > ");
    let mut parts = Vec::new();
    let mut combinator = Combinator::Descendant;
    for token in spaced.split_whitespace() {
        if token == ">" {
            combinator = Combinator::Child;
            continue;
        }
        parts.push((combinator, parse_compound(token).ok_or_else(|| invalid("css", selector))?));
        combinator = Combinator::Descendant;
    }
    if parts.is_empty() || combinator == Combinator::Child {
        return Err(invalid("css", selector));
    }
    Ok(parts)
}

fn parse_compound(token: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut chars = token.chars().peekable();
    let mut tag = String::new();
    while let Some(&c) = chars.peek() {
        if is_ident_char(c) || c == '*' {
            tag.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if !tag.is_empty() && tag != "*" {
        compound.tag = Some(tag.to_ascii_lowercase());
    }
    while let Some(c) = chars.next() {
        match c {
            '#' | '.' => {
                let mut ident = String::new();
                while let Some(&n) = chars.peek() {
                    if !is_ident_char(n) {
                        break;
                    }
                    ident.push(n);
                    chars.next();
                }
                if ident.is_empty() {
                    return None;
                }
                if c == '#' {
                    compound.id = Some(ident);
                } else {
                    compound.classes.push(ident);
                }
            }
            '[' => {
                let body: String = chars.by_ref().take_while(|&n| n != ']').collect();
                match body.split_once('=') {
                    Some((name, value)) => compound
                        .attrs
                        .push((name.trim().to_string(), Some(unquote(value).to_string()))),
                    None => compound.attrs.push((body.trim().to_string(), None)),
                }
            }
            _ => return None,
        }
    }
    Some(compound)
}

fn compound_matches(dom: &MockDom, idx: usize, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if dom.tag(idx) != Some(tag.as_str()) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if dom.attr_idx(idx, "id") != Some(id.as_str()) {
            return false;
        }
    }
    compound.classes.iter().all(|c| has_class(dom, idx, c))
        && compound.attrs.iter().all(|(name, value)| {
            match (dom.attr_idx(idx, name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
}

fn css_matches(dom: &MockDom, idx: usize, parts: &[(Combinator, Compound)]) -> bool {
    let Some(((combinator, last), rest)) = parts.split_last() else {
        return true;
    };
    if !compound_matches(dom, idx, last) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match combinator {
        Combinator::Child => dom
            .parent_of(idx)
            .is_some_and(|p| css_matches(dom, p, rest)),
        Combinator::Descendant => dom
            .ancestors(idx)
            .into_iter()
            .any(|a| css_matches(dom, a, rest)),
    }
}

// =============================================================================
// XPath
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug)]
enum Predicate {
    AttrEq(String, String),
    AttrExists(String),
    TextEq(String),
    Position(usize),
}

#[derive(Debug)]
struct Step {
    axis: Axis,
    name: String,
    predicates: Vec<Predicate>,
}

#[derive(Debug)]
struct Path {
    absolute: bool,
    steps: Vec<Step>,
}

fn parse_xpath(expr: &str) -> DriverResult<Path> {
    let trimmed = expr.trim();
    let (absolute, first_axis, rest) = if let Some(r) = trimmed.strip_prefix("//") {
        (true, Axis::Descendant, r)
    } else if let Some(r) = trimmed.strip_prefix('/') {
        (true, Axis::Child, r)
    } else if let Some(r) = trimmed.strip_prefix(".//") {
        (false, Axis::Descendant, r)
    } else if let Some(r) = trimmed.strip_prefix("./") {
        (false, Axis::Child, r)
    } else {
        (false, Axis::Child, trimmed)
    };

    let mut segments = Vec::new();
    let mut axis = first_axis;
    let mut current = String::new();
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quote) {
            ('\'' | '"', None) => quote = Some(c),
            (q, Some(open)) if q == open => quote = None,
            ('[', None) => depth += 1,
            (']', None) => depth = depth.saturating_sub(1),
            ('/', None) if depth == 0 => {
                segments.push((axis, std::mem::take(&mut current)));
                axis = if chars.peek() == Some(&'/') {
                    chars.next();
                    Axis::Descendant
                } else {
                    Axis::Child
                };
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    segments.push((axis, current));

    let steps = segments
        .into_iter()
        .map(|(axis, segment)| parse_step(axis, &segment).ok_or_else(|| invalid("xpath", expr)))
        .collect::<DriverResult<Vec<_>>>()?;
    Ok(Path { absolute, steps })
}

fn parse_step(axis: Axis, segment: &str) -> Option<Step> {
    let segment = segment.trim();
    let (name, mut rest) = match segment.find('[') {
        Some(pos) => (&segment[..pos], &segment[pos..]),
        None => (segment, ""),
    };
    if name.is_empty() || !name.chars().all(|c| is_ident_char(c) || c == '*') {
        return None;
    }
    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let body_end = rest.find(']')?;
        let body = rest.get(1..body_end)?.trim();
        predicates.push(parse_predicate(body)?);
        rest = rest[body_end + 1..].trim_start();
        if !rest.is_empty() && !rest.starts_with('[') {
            return None;
        }
    }
    Some(Step {
        axis,
        name: name.to_ascii_lowercase(),
        predicates,
    })
}

fn parse_predicate(body: &str) -> Option<Predicate> {
    if let Ok(position) = body.parse::<usize>() {
        return (position > 0).then_some(Predicate::Position(position));
    }
    if let Some(attr) = body.strip_prefix('@') {
        return Some(match attr.split_once('=') {
            Some((name, value)) => {
                Predicate::AttrEq(name.trim().to_string(), unquote(value).to_string())
            }
            None => Predicate::AttrExists(attr.trim().to_string()),
        });
    }
    let (lhs, rhs) = body.split_once('=')?;
    (lhs.trim() == "text()").then(|| Predicate::TextEq(unquote(rhs).to_string()))
}

fn step_candidates(dom: &MockDom, parent: Option<usize>) -> Vec<usize> {
    match parent {
        Some(idx) => dom.children_of(idx),
        None => dom.root().map(|r| vec![r.0]).unwrap_or_default(),
    }
}

fn descendant_or_self(dom: &MockDom, context: Option<usize>) -> Vec<Option<usize>> {
    let mut out = vec![context];
    let nodes = match context {
        Some(idx) => dom.descendants(idx),
        None => dom.document_order(),
    };
    out.extend(nodes.into_iter().map(Some));
    out
}

fn apply_step(dom: &MockDom, parent: Option<usize>, step: &Step) -> Vec<usize> {
    let mut matched: Vec<usize> = step_candidates(dom, parent)
        .into_iter()
        .filter(|&i| step.name == "*" || dom.tag(i) == Some(step.name.as_str()))
        .collect();
    for predicate in &step.predicates {
        matched = match predicate {
            Predicate::Position(n) => matched.get(n - 1).copied().into_iter().collect(),
            Predicate::AttrEq(name, value) => {
                filter(matched, |i| dom.attr_idx(i, name) == Some(value.as_str()))
            }
            Predicate::AttrExists(name) => filter(matched, |i| dom.attr_idx(i, name).is_some()),
            Predicate::TextEq(text) => filter(matched, |i| dom.text_of(i).trim() == text.trim()),
        };
    }
    matched
}

fn eval_xpath(dom: &MockDom, scope: Option<usize>, path: &Path) -> Vec<usize> {
    let order: HashMap<usize, usize> = dom
        .document_order()
        .into_iter()
        .enumerate()
        .map(|(pos, idx)| (idx, pos))
        .collect();
    let mut context: Vec<Option<usize>> = vec![if path.absolute { None } else { scope }];
    for step in &path.steps {
        let mut next = Vec::new();
        for ctx in context {
            let parents = match step.axis {
                Axis::Child => vec![ctx],
                Axis::Descendant => descendant_or_self(dom, ctx),
            };
            for parent in parents {
                next.extend(apply_step(dom, parent, step));
            }
        }
        next.sort_by_key(|idx| order.get(idx).copied().unwrap_or(usize::MAX));
        next.dedup();
        context = next.into_iter().map(Some).collect();
    }
    context.into_iter().flatten().collect()
}
