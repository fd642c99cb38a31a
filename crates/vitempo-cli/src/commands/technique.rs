use clap::Subcommand;
use vitempo_core::time_format::{format_duration, to_seconds};
use vitempo_core::TechniqueId;

use super::{CliResult, Context};

#[derive(Subcommand)]
pub enum TechniqueAction {
    /// List available techniques
    List,
    /// Show a technique with its instructions
    Show {
        /// Technique ID (defaults to the active one)
        id: Option<TechniqueId>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Make a technique the active one
    Use {
        /// Technique ID
        id: TechniqueId,
    },
}

pub fn run(action: TechniqueAction) -> CliResult {
    let mut ctx = Context::load()?;
    match action {
        TechniqueAction::List => {
            for t in ctx.catalog.iter() {
                let marker = if t.id == ctx.config.active_technique { "*" } else { " " };
                println!("{marker} {:<10} {:<26} {}", t.id, t.name, t.description);
            }
        }
        TechniqueAction::Show { id, json } => {
            let technique = ctx.technique(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&technique)?);
                return Ok(());
            }
            let settings = ctx.settings(&technique);
            println!("{} ({})", technique.name, technique.id);
            println!("{}", technique.description);
            println!();
            if technique.is_flexible {
                println!("Work:        open-ended");
                println!("Break:       1 min per {} min of work", settings.break_ratio);
            } else {
                println!("Work:        {}", format_duration(to_seconds(settings.work_duration)));
                println!(
                    "Short break: {}",
                    format_duration(to_seconds(settings.short_break_duration))
                );
                if technique.has_long_break && settings.cycles_before_long_break > 0 {
                    println!(
                        "Long break:  {} every {} cycles",
                        format_duration(to_seconds(settings.long_break_duration)),
                        settings.cycles_before_long_break
                    );
                }
            }
            if !technique.instructions.is_empty() {
                println!();
                for (i, step) in technique.instructions.iter().enumerate() {
                    println!("{}. {step}", i + 1);
                }
            }
            if !technique.best_for.is_empty() {
                println!();
                println!("Best for: {}", technique.best_for.join("; "));
            }
        }
        TechniqueAction::Use { id } => {
            ctx.catalog.require(id)?;
            ctx.config.active_technique = id;
            ctx.config.save()?;
            println!("active technique: {id}");
        }
    }
    Ok(())
}
