use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use optclause_editor::RenderSession;
use optclause_evaluator::{OptionState, OptionStore};
use std::path::PathBuf;

use super::{load_document, load_states};

#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Option states file ({ "option": "state" })
    #[arg(short, long)]
    pub states: Option<PathBuf>,
}

/// List every option the document reads, with its state and readers
pub fn options(args: OptionsArgs, config: &Config) -> Result<()> {
    let document = load_document(&args.document)?;
    let states = load_states(args.states.as_deref())?;

    let mut render_options = config.render_options();
    // Subscriptions are only published by interactive walks.
    render_options.preview_only = false;

    let mut session = RenderSession::new(document)
        .with_states(states)
        .with_options(render_options)
        .with_evaluator(config.evaluator());
    session.render();

    let registry = session.registry();
    if registry.is_empty() {
        println!("{}", "No options found".yellow());
        return Ok(());
    }

    for option_id in registry.option_ids() {
        let name = registry
            .descriptor(option_id)
            .map_or(option_id, |d| d.display_name());
        let state = session.states().state_of(option_id);
        let readers = registry.notify(option_id);

        println!(
            "{} {} [{}] {}",
            "•".cyan(),
            option_id.bold(),
            paint_state(&state),
            name
        );
        println!("    {}", readers.join(", ").dimmed());
    }

    Ok(())
}

fn paint_state(state: &OptionState) -> colored::ColoredString {
    match state {
        OptionState::Default => state.as_str().green(),
        OptionState::Hidden => state.as_str().red(),
        OptionState::Choice(_) => state.as_str().yellow(),
    }
}
