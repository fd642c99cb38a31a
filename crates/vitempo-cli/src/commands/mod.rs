pub mod config;
pub mod run;
pub mod settings;
pub mod task;
pub mod technique;

use vitempo_core::storage::{load_settings, load_tasks, save, tasks_key};
use vitempo_core::{
    Catalog, Config, Database, Result, Settings, TaskList, TechniqueDefinition, TechniqueId,
};

pub type CliResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Config, catalog and database, loaded once per command.
pub struct Context {
    pub config: Config,
    pub catalog: Catalog,
    pub db: Database,
}

impl Context {
    pub fn load() -> Result<Self> {
        let config = Config::load()?;
        let catalog = config.catalog()?;
        let db = Database::open()?;
        Ok(Self { config, catalog, db })
    }

    /// `id`, or the configured active technique.
    pub fn technique(&self, id: Option<TechniqueId>) -> Result<TechniqueDefinition> {
        let id = id.unwrap_or(self.config.active_technique);
        Ok(self.catalog.require(id)?.clone())
    }

    pub fn settings(&self, technique: &TechniqueDefinition) -> Settings {
        load_settings(&self.db, technique)
    }

    pub fn tasks_key(&self, id: TechniqueId) -> String {
        tasks_key(id, self.config.tasks.per_technique)
    }

    pub fn tasks(&self, id: TechniqueId) -> TaskList {
        load_tasks(&self.db, &self.tasks_key(id))
    }

    pub fn save_tasks(&self, id: TechniqueId, tasks: &TaskList) -> Result<()> {
        save(&self.db, &self.tasks_key(id), tasks)?;
        Ok(())
    }
}
