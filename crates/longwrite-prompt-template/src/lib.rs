//! Prompt templates for the plan and write stages
//!
//! A template is plain text with `$NAME$` placeholders. Parsing splits the
//! text into literal and placeholder segments once; rendering concatenates
//! the segments with the supplied values in a single pass, so substituted
//! text is never rescanned for placeholders.

use std::fmt;
use std::path::Path;

use longwrite_utils::error::TemplateError;

/// Built-in plan template, used when no template file is given
pub const DEFAULT_PLAN_TEMPLATE: &str = include_str!("../templates/plan.txt");
/// Built-in write template, used when no template file is given
pub const DEFAULT_WRITE_TEMPLATE: &str = include_str!("../templates/write.txt");

/// Named substitution points recognised in templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// The work item's instruction
    Inst,
    /// The full plan text
    Plan,
    /// Text generated so far for this item
    Text,
    /// The current plan step
    Step,
}

impl Placeholder {
    pub const ALL: [Placeholder; 4] = [Self::Inst, Self::Plan, Self::Text, Self::Step];

    /// Token as it appears in template text
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Inst => "$INST$",
            Self::Plan => "$PLAN$",
            Self::Text => "$TEXT$",
            Self::Step => "$STEP$",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Which stage a template feeds; decides the required placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Plan,
    Write,
}

impl TemplateKind {
    #[must_use]
    pub const fn required(self) -> &'static [Placeholder] {
        match self {
            Self::Plan => &[Placeholder::Inst],
            Self::Write => &Placeholder::ALL,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Write => "write",
        }
    }

    #[must_use]
    pub const fn builtin(self) -> &'static str {
        match self {
            Self::Plan => DEFAULT_PLAN_TEMPLATE,
            Self::Write => DEFAULT_WRITE_TEMPLATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// Values for one render call. A `None` value leaves its token in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptValues<'a> {
    pub inst: Option<&'a str>,
    pub plan: Option<&'a str>,
    pub text: Option<&'a str>,
    pub step: Option<&'a str>,
}

impl<'a> PromptValues<'a> {
    fn get(&self, placeholder: Placeholder) -> Option<&'a str> {
        match placeholder {
            Placeholder::Inst => self.inst,
            Placeholder::Plan => self.plan,
            Placeholder::Text => self.text,
            Placeholder::Step => self.step,
        }
    }
}

/// A parsed, validated prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    kind: TemplateKind,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse template text and check that every placeholder `kind` needs is present.
    pub fn parse(
        name: impl Into<String>,
        kind: TemplateKind,
        text: &str,
    ) -> Result<Self, TemplateError> {
        let name = name.into();
        let segments = tokenize(text);

        for required in kind.required() {
            let present = segments
                .iter()
                .any(|s| matches!(s, Segment::Slot(p) if p == required));
            if !present {
                return Err(TemplateError::MissingPlaceholder {
                    name,
                    placeholder: required.token().to_string(),
                });
            }
        }

        Ok(Self {
            name,
            kind,
            segments,
        })
    }

    /// Load a template from disk
    pub fn from_file(path: &Path, kind: TemplateKind) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path.display().to_string(), kind, &text)
    }

    /// Load `path` when given, else the built-in template for `kind`.
    pub fn load_or_builtin(
        path: Option<&Path>,
        kind: TemplateKind,
    ) -> Result<Self, TemplateError> {
        match path {
            Some(path) => Self::from_file(path, kind),
            None => Self::parse(format!("builtin:{}", kind.as_str()), kind, kind.builtin()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Substitute values into the template.
    #[must_use]
    pub fn render(&self, values: &PromptValues<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(placeholder) => match values.get(*placeholder) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(placeholder.token()),
                },
            }
        }
        out
    }
}

fn tokenize(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        literal.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match Placeholder::ALL.iter().find(|p| tail.starts_with(p.token())) {
            Some(placeholder) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Slot(*placeholder));
                rest = &tail[placeholder.token().len()..];
            }
            None => {
                literal.push('$');
                rest = &tail[1..];
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
