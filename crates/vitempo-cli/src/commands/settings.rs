use clap::Subcommand;
use vitempo_core::storage::{save, settings_key};
use vitempo_core::{KeyValueStore, TechniqueId};

use super::{CliResult, Context};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print settings as JSON (durations in milliseconds)
    Show {
        #[arg(long)]
        technique: Option<TechniqueId>,
    },
    /// Set one setting; durations are given in minutes
    Set {
        /// Setting key, e.g. workDuration or auto_start_breaks
        key: String,
        value: String,
        #[arg(long)]
        technique: Option<TechniqueId>,
    },
    /// Restore the technique's default settings
    Reset {
        #[arg(long)]
        technique: Option<TechniqueId>,
    },
}

pub fn run(action: SettingsAction) -> CliResult {
    let ctx = Context::load()?;
    match action {
        SettingsAction::Show { technique } => {
            let technique = ctx.technique(technique)?;
            let settings = ctx.settings(&technique);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set {
            key,
            value,
            technique,
        } => {
            let technique = ctx.technique(technique)?;
            let mut settings = ctx.settings(&technique);
            settings.set_field(&key, &value)?;
            settings.validate(&technique)?;
            save(&ctx.db, &settings_key(technique.id), &settings)?;
            println!("ok");
        }
        SettingsAction::Reset { technique } => {
            let technique = ctx.technique(technique)?;
            ctx.db.remove(&settings_key(technique.id))?;
            println!("settings for {} reset to defaults", technique.id);
        }
    }
    Ok(())
}
