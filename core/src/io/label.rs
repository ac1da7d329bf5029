//! Attached PVL labels at the head of ISIS cubes.

use crate::prelude::{CnetError, CnetResult};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

/// Upper bound on label text scanned before giving up on an `End` marker.
const MAX_LABEL_BYTES: usize = 1 << 20;

/// An Object or Group block and its keywords.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelGroup {
    name: String,
    keywords: Vec<(String, String)>,
    children: Vec<LabelGroup>,
}

impl LabelGroup {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keyword value with quotes removed; PVL names are case-insensitive.
    pub fn keyword(&self, name: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&LabelGroup> {
        self.children
            .iter()
            .find(|child| child.name.eq_ignore_ascii_case(name))
    }

    pub fn children(&self) -> &[LabelGroup] {
        &self.children
    }
}

/// Parsed label tree rooted at an unnamed top-level block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Label {
    root: LabelGroup,
}

impl Label {
    pub fn parse(text: &str) -> CnetResult<Self> {
        let mut stack = vec![LabelGroup::default()];

        for statement in statements(text) {
            let (key, value) = match statement.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (statement.trim(), ""),
            };

            match key.to_ascii_uppercase().as_str() {
                "END" => break,
                "OBJECT" | "GROUP" => stack.push(LabelGroup::named(&unquote(value))),
                "END_OBJECT" | "END_GROUP" => {
                    if stack.len() < 2 {
                        return Err(CnetError::invalid_input(
                            format!("unbalanced '{}' in label", key),
                            &[],
                        ));
                    }
                    if let Some(closed) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(closed);
                        }
                    }
                }
                _ => {
                    if let Some(current) = stack.last_mut() {
                        current.keywords.push((key.to_string(), unquote(value)));
                    }
                }
            }
        }

        while stack.len() > 1 {
            if let Some(unclosed) = stack.pop() {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(unclosed);
                }
            }
        }

        Ok(Self {
            root: stack.pop().unwrap_or_default(),
        })
    }

    pub fn root(&self) -> &LabelGroup {
        &self.root
    }

    /// Follows nested block names from the root.
    pub fn group(&self, path: &[&str]) -> Option<&LabelGroup> {
        path.iter()
            .try_fold(&self.root, |group, name| group.child(name))
    }

    pub fn keyword(&self, path: &[&str], name: &str) -> Option<&str> {
        self.group(path)?.keyword(name)
    }
}

/// Joins physical lines into statements, following open parentheses and
/// quotes across line breaks and dropping `/* */` comments.
fn statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut pending = String::new();

    for raw in text.lines() {
        let line = strip_comment(raw).trim();
        if line.is_empty() && pending.is_empty() {
            continue;
        }
        if !pending.is_empty() {
            pending.push(' ');
        }
        pending.push_str(line);

        let open = pending.matches('(').count() > pending.matches(')').count();
        let quoted = pending.matches('"').count() % 2 == 1;
        if !open && !quoted {
            statements.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        statements.push(pending);
    }
    statements
}

fn strip_comment(line: &str) -> &str {
    match line.find("/*") {
        Some(start) => &line[..start],
        None => line,
    }
}

fn unquote(value: &str) -> String {
    value.trim().trim_matches('"').trim().to_string()
}

pub trait LabelReader {
    fn read_label(&self, path: &Path) -> CnetResult<Label>;
}

/// Reads the attached label from the start of a cube file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PvlLabelReader;

impl PvlLabelReader {
    pub fn new() -> Self {
        Self
    }
}

impl LabelReader for PvlLabelReader {
    fn read_label(&self, path: &Path) -> CnetResult<Label> {
        let file = File::open(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => CnetError::NotFound(path.to_path_buf()),
            _ => CnetError::Io(err),
        })?;

        let mut reader = BufReader::new(file);
        let mut text = String::new();
        let mut line = Vec::new();
        while text.len() < MAX_LABEL_BYTES {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            let decoded = String::from_utf8_lossy(&line);
            text.push_str(&decoded);
            if decoded.trim().eq_ignore_ascii_case("end") {
                break;
            }
        }

        Label::parse(&text)
    }
}
