use crate::config::Config;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::{ColoredString, Colorize};
use optclause_editor::RenderSession;
use optclause_evaluator::{RenderNode, RenderingMode};
use std::path::PathBuf;

use super::{load_document, load_states};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Option states file ({ "option": "state" })
    #[arg(short, long)]
    pub states: Option<PathBuf>,

    /// Option to render as focused
    #[arg(long)]
    pub focus: Option<String>,

    /// Read-only rendering (overrides config)
    #[arg(long)]
    pub preview: bool,

    /// Schedule tag for rendered text (overrides config)
    #[arg(long)]
    pub schedule: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn render(args: RenderArgs, config: &Config) -> Result<()> {
    let document = load_document(&args.document)?;
    let states = load_states(args.states.as_deref())?;

    let mut options = config.render_options();
    options.preview_only |= args.preview;
    if args.schedule.is_some() {
        options.schedule_num = args.schedule;
    }

    let mut session = RenderSession::new(document)
        .with_states(states)
        .with_options(options)
        .with_evaluator(config.evaluator());
    session.set_focus(args.focus.as_deref());
    let rendered = session.render();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rendered)?),
        OutputFormat::Text => {
            for node in &rendered.nodes {
                for line in paragraph_lines(node, 0) {
                    println!("{line}");
                }
            }
        }
    }

    Ok(())
}

/// One line per paragraph, children indented below their parent
pub(crate) fn paragraph_lines(node: &RenderNode, depth: usize) -> Vec<String> {
    let RenderNode::Paragraph {
        numbering,
        content,
        children,
        ..
    } = node
    else {
        return Vec::new();
    };

    let text: String = content.iter().map(|n| styled(n).to_string()).collect();
    let mut lines = vec![format!(
        "{}{} {}",
        "  ".repeat(depth),
        numbering.bold(),
        text
    )
    .trim_end()
    .to_string()];
    for child in children {
        lines.extend(paragraph_lines(child, depth + 1));
    }
    lines
}

fn styled(node: &RenderNode) -> ColoredString {
    match node {
        RenderNode::Leaf { text, mode, .. } => with_mode(text, *mode),
        RenderNode::Clause { children, .. } => {
            let inner: String = children.iter().map(|n| styled(n).to_string()).collect();
            inner.normal()
        }
        RenderNode::Marker { text } => text.cyan(),
        RenderNode::Spacing { text } => text.normal(),
        RenderNode::Bracket => "]".cyan(),
        RenderNode::Footer { text, .. } => text.cyan().dimmed(),
        RenderNode::Paragraph { .. } => "".normal(),
    }
}

fn with_mode(text: &str, mode: RenderingMode) -> ColoredString {
    match mode {
        RenderingMode::Plain => text.normal(),
        RenderingMode::Highlighted => text.yellow(),
        RenderingMode::Emphasized => text.yellow().bold(),
    }
}
