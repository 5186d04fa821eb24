//! Usage Engine
//!
//! Walks the graph collecting a usage document: description, usage-line
//! tokens, argument and flag sections, symbol legend, and branch
//! sub-usages. The renderer produces the text printed below usage errors.

use std::sync::Arc;

use crate::core::errors::CmdError;
use crate::core::node::GraphNode;
use crate::data::Data;
use crate::input::Input;

/// One argument row in the usage document.
#[derive(Debug, Clone)]
pub struct ArgUsage {
    pub name: String,
    pub desc: String,
    /// Validator descriptions, default-value notes.
    pub notes: Vec<String>,
}

/// One flag row in the usage document.
#[derive(Debug, Clone)]
pub struct FlagUsage {
    /// e.g. `[r] rating` or `    names`.
    pub display: String,
    pub desc: String,
}

/// The usage accumulator.
#[derive(Debug, Clone, Default)]
pub struct Usage {
    description: Option<String>,
    usage_line: Vec<String>,
    args: Vec<ArgUsage>,
    flags: Vec<FlagUsage>,
    symbols: Vec<(String, String)>,
    sub_usages: Vec<(String, Usage)>,
}

impl Usage {
    /// Set the command description. The first writer wins so the outermost
    /// node's description heads the document.
    pub fn set_description(&mut self, desc: impl Into<String>) {
        if self.description.is_none() {
            self.description = Some(desc.into());
        }
    }

    pub fn add_usage_token(&mut self, token: impl Into<String>) {
        self.usage_line.push(token.into());
    }

    pub fn add_arg(&mut self, name: impl Into<String>, desc: impl Into<String>, notes: Vec<String>) {
        self.args.push(ArgUsage {
            name: name.into(),
            desc: desc.into(),
            notes,
        });
    }

    pub fn add_flag(&mut self, display: impl Into<String>, desc: impl Into<String>) {
        self.flags.push(FlagUsage {
            display: display.into(),
            desc: desc.into(),
        });
    }

    pub fn add_symbol(&mut self, symbol: impl Into<String>, desc: impl Into<String>) {
        self.symbols.push((symbol.into(), desc.into()));
    }

    pub fn add_sub_usage(&mut self, key: impl Into<String>, usage: Usage) {
        self.sub_usages.push((key.into(), usage));
    }

    pub fn usage_line(&self) -> &[String] {
        &self.usage_line
    }

    /// Render the document. Sections appear only when non-empty.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        self.render_into(&mut lines, 0);
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn render_into(&self, lines: &mut Vec<String>, indent: usize) {
        let pad = "  ".repeat(indent);
        if let Some(desc) = &self.description {
            lines.push(format!("{}{}", pad, desc));
        }
        if !self.usage_line.is_empty() {
            lines.push(format!("{}{}", pad, self.usage_line.join(" ")));
        }

        for (key, sub) in &self.sub_usages {
            lines.push(String::new());
            lines.push(format!("{}{}:", pad, key));
            sub.render_into(lines, indent + 1);
        }

        if !self.args.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}Arguments:", pad));
            for arg in &self.args {
                lines.push(format!("{}  {}: {}", pad, arg.name, arg.desc));
                for note in &arg.notes {
                    lines.push(format!("{}    {}", pad, note));
                }
            }
        }

        if !self.flags.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}Flags:", pad));
            for flag in &self.flags {
                lines.push(format!("{}  {}: {}", pad, flag.display, flag.desc));
            }
        }

        if !self.symbols.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}Symbols:", pad));
            for (symbol, desc) in &self.symbols {
                lines.push(format!("{}  {}: {}", pad, symbol, desc));
            }
        }
    }
}

/// Drive the usage methods over a graph.
pub(crate) fn walk_usage(
    start: &Arc<dyn GraphNode>,
    input: &mut Input,
    data: &mut Data,
    usage: &mut Usage,
) -> Result<(), CmdError> {
    let mut node = Some(start.clone());
    while let Some(n) = node {
        n.usage(input, data, usage)?;
        node = n.usage_next();
    }
    Ok(())
}

/// Build the usage document for a graph.
pub fn usage(root: &Arc<dyn GraphNode>) -> Result<Usage, CmdError> {
    let mut input = Input::from_args(Vec::<String>::new());
    let mut data = Data::new();
    let mut u = Usage::default();
    walk_usage(root, &mut input, &mut data, &mut u)?;
    Ok(u)
}

/// Render a graph's usage document to text.
pub fn usage_text(root: &Arc<dyn GraphNode>) -> Result<String, CmdError> {
    Ok(usage(root)?.render())
}

// ============================================================================
// Tests
// ============================================================================
