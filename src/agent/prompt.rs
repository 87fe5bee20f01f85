//! ReAct instruction template and prompt rendering.

use thiserror::Error;

use crate::tools::ToolInfo;

/// Built-in instruction block. Tool names appear only in `{tools}`.
pub const DEFAULT_TEMPLATE: &str = r#"Answer the following question as best you can. You have access to the following tools:

{tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, exactly one of the tool names listed above
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!

Question: {question}
{transcript}Thought:"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Question must not be empty")]
    MissingQuestion,

    #[error("Template is missing required placeholder {{{0}}}")]
    MissingPlaceholder(&'static str),

    #[error("Template uses unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("Unterminated placeholder at byte {offset}")]
    Unterminated { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Tools,
    Question,
    Transcript,
}

impl Field {
    const ALL: [(Field, &'static str); 3] = [
        (Field::Tools, "tools"),
        (Field::Question, "question"),
        (Field::Transcript, "transcript"),
    ];

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|(_, n)| *n == name).map(|(f, _)| *f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A validated instruction template.
///
/// Placeholders are `{tools}`, `{question}` and `{transcript}`, each required.
/// `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn new(text: &str) -> Result<Self, TemplateError> {
        let segments = parse_segments(text)?;

        for (field, name) in Field::ALL {
            if !segments.contains(&Segment::Field(field)) {
                return Err(TemplateError::MissingPlaceholder(name));
            }
        }

        Ok(Self { segments })
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        match Self::new(DEFAULT_TEMPLATE) {
            Ok(template) => template,
            Err(e) => unreachable!("built-in template is invalid: {}", e),
        }
    }
}

fn parse_segments(text: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let rest = &text[offset + 1..];
                let end = rest
                    .find('}')
                    .ok_or(TemplateError::Unterminated { offset })?;
                let name = &rest[..end];
                let field = Field::from_name(name)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field(field));

                // Skip the name and the closing brace.
                for _ in 0..name.chars().count() + 1 {
                    chars.next();
                }
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Renders the prompt sent to the model on every iteration.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: PromptTemplate,
    catalog: String,
}

impl PromptBuilder {
    /// Build a renderer for `tools`, listed in the given order.
    pub fn new(template: PromptTemplate, tools: &[ToolInfo]) -> Self {
        Self {
            template,
            catalog: render_catalog(tools),
        }
    }

    /// Render the template for `question` with the transcript appended so far.
    pub fn render(&self, question: &str, transcript: &[String]) -> Result<String, TemplateError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TemplateError::MissingQuestion);
        }

        let transcript_text: String = transcript
            .iter()
            .map(|fragment| format!("{}\n", fragment.trim_end()))
            .collect();

        let mut prompt = String::new();
        for segment in &self.template.segments {
            match segment {
                Segment::Literal(text) => prompt.push_str(text),
                Segment::Field(Field::Tools) => prompt.push_str(&self.catalog),
                Segment::Field(Field::Question) => prompt.push_str(question),
                Segment::Field(Field::Transcript) => prompt.push_str(&transcript_text),
            }
        }
        Ok(prompt)
    }
}

/// One `- name: description` line per tool.
fn render_catalog(tools: &[ToolInfo]) -> String {
    tools
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}
