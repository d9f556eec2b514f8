//! Element paths in the accessibility tree, in System Events terms.
//!
//! A path is a list of segments from a process down to a control, e.g.
//! `process "LM Studio"` → `window 1` → `tab group 1` → `button "Local Server"`.
//! The macOS engine renders it as an AppleScript object reference; the
//! scripted engine walks it over an in-memory tree.

use crate::errors::AutomationError;
use crate::selector::Selector;
use std::fmt;

/// How a segment picks among the children of its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKey {
    Name(String),
    /// 0-based; negative counts from the end.
    Index(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Canonical role, see [`canonical_role`].
    pub role: String,
    pub key: SegmentKey,
}

impl Segment {
    /// The System Events class for this segment's role.
    pub fn applescript_class(&self) -> String {
        applescript_class(&self.role)
    }

    fn to_applescript(&self) -> String {
        let class = self.applescript_class();
        match &self.key {
            SegmentKey::Name(name) => format!("{class} {}", quote(name)),
            SegmentKey::Index(index) if *index >= 0 => format!("{class} {}", index + 1),
            SegmentKey::Index(index) => format!("{class} {index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AxPath {
    segments: Vec<Segment>,
}

impl AxPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Name of the process this path starts from, if any.
    pub fn process_name(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment {
                role,
                key: SegmentKey::Name(name),
            }) if role == "application" => Some(name),
            _ => None,
        }
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Extend this path with the steps of `selector`.
    pub fn join(&self, selector: &Selector) -> Result<AxPath, AutomationError> {
        let mut segments = self.segments.clone();
        // An unnamed role may still be refined by a following nth step.
        let mut refinable = false;

        for step in selector.steps() {
            match step {
                Selector::Role { role, name } => {
                    let role = canonical_role(role);
                    if role.is_empty() {
                        return Err(AutomationError::InvalidSelector(format!(
                            "Empty role in {selector}"
                        )));
                    }
                    let key = match name {
                        Some(name) => SegmentKey::Name(name.clone()),
                        None => SegmentKey::Index(0),
                    };
                    refinable = name.is_none();
                    segments.push(Segment { role, key });
                }
                Selector::Name(name) => {
                    segments.push(Segment {
                        role: "uielement".to_string(),
                        key: SegmentKey::Name(name.clone()),
                    });
                    refinable = false;
                }
                Selector::Nth(index) => {
                    let last = match segments.last_mut() {
                        Some(last) if refinable => last,
                        _ => {
                            return Err(AutomationError::InvalidSelector(format!(
                                "nth:{index} must follow an unnamed role in {selector}"
                            )))
                        }
                    };
                    last.key = SegmentKey::Index(*index);
                    refinable = false;
                }
                Selector::Invalid(reason) => {
                    return Err(AutomationError::InvalidSelector(reason.clone()))
                }
                Selector::Chain(_) => unreachable!("steps() flattens chains"),
            }
        }

        if segments.iter().skip(1).any(|s| s.role == "application") {
            return Err(AutomationError::InvalidSelector(format!(
                "An application can only start a path: {selector}"
            )));
        }

        Ok(AxPath { segments })
    }

    /// Render as an AppleScript object reference, innermost first.
    pub fn to_applescript(&self) -> String {
        self.segments
            .iter()
            .rev()
            .map(Segment::to_applescript)
            .collect::<Vec<_>>()
            .join(" of ")
    }
}

impl fmt::Display for AxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_applescript())
    }
}

/// Normalize a role so that `AXTabGroup`, `tab group` and `TabGroup` compare equal.
pub fn canonical_role(role: &str) -> String {
    let role = role.trim();
    let role = role.strip_prefix("AX").unwrap_or(role);
    let role: String = role
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();
    match role.as_str() {
        "app" | "process" => "application".to_string(),
        "textbox" | "input" | "edit" => "textfield".to_string(),
        "text" | "label" => "statictext".to_string(),
        _ => role,
    }
}

pub fn applescript_class(canonical: &str) -> String {
    match canonical {
        "application" => "process",
        "tabgroup" => "tab group",
        "textfield" => "text field",
        "statictext" => "static text",
        "radiobutton" => "radio button",
        "checkbox" => "checkbox",
        "popupbutton" => "pop up button",
        "menubutton" => "menu button",
        "scrollarea" => "scroll area",
        "splitgroup" => "split group",
        "menuitem" => "menu item",
        "menubar" => "menu bar",
        "uielement" => "UI element",
        other => other,
    }
    .to_string()
}

/// Quote a string as an AppleScript literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
