use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use optclause_editor::RenderSession;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use super::load_document;

#[derive(Debug, Args)]
pub struct NumberingArgs {
    /// Document JSON file
    pub document: PathBuf,
}

/// Print the numbering broadcast for every paragraph
pub fn numbering(args: NumberingArgs, config: &Config) -> Result<()> {
    let document = load_document(&args.document)?;

    let mut options = config.render_options();
    // Preview walks publish no numbering.
    options.preview_only = false;

    let published = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&published);

    let mut session = RenderSession::new(document)
        .with_options(options)
        .with_evaluator(config.evaluator());
    session.subscribe_all_numbering(move |node_id, numbering| {
        sink.borrow_mut()
            .push((node_id.to_string(), numbering.to_string()))
    });
    session.render();

    for (node_id, numbering) in published.borrow().iter() {
        let depth = numbering.matches('.').count();
        println!(
            "{}{:<8} {}",
            "  ".repeat(depth),
            numbering.bold(),
            node_id.dimmed()
        );
    }

    Ok(())
}
