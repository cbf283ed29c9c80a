use super::error::{AutomationError, AutomationResult};
use crate::config::{AutomationConfig, TraversalMode};
use crate::template_matching::{MatchConfig, TemplateMatcher};
use crate::templates::{
    FILTER_ICON, GRID_CHECK, GRID_MENU_OPTION, NODE_CLOSED, TemplateStore,
};

/// Everything a run reads: built once and passed to every component.
pub struct AutomationContext {
    pub config: AutomationConfig,
    pub templates: TemplateStore,
    pub matcher: TemplateMatcher,
}

impl AutomationContext {
    pub fn new(config: AutomationConfig, templates: TemplateStore) -> Self {
        let matcher = TemplateMatcher::new(MatchConfig::from_automation(&config));
        Self {
            config,
            templates,
            matcher,
        }
    }

    /// Load the template directory named by the config
    pub fn load(config: AutomationConfig) -> AutomationResult<Self> {
        let templates = TemplateStore::load(&config)?;
        Ok(Self::new(config, templates))
    }

    /// Templates the configured traversal cannot run without
    pub fn required_templates(&self) -> Vec<&str> {
        let mut required = vec![FILTER_ICON, GRID_MENU_OPTION, NODE_CLOSED];
        match self.config.traversal_mode {
            TraversalMode::SinglePass => required.push(GRID_CHECK),
            TraversalMode::FullWalk | TraversalMode::PerChild => required.extend(
                self.config
                    .chain_steps
                    .iter()
                    .filter(|step| !step.optional)
                    .map(|step| step.template.as_str()),
            ),
        }
        required
    }

    /// Fail with the list of absent files before any input is sent
    pub fn check_required_templates(&self) -> AutomationResult<()> {
        let missing = self.templates.missing(self.required_templates());
        if missing.is_empty() {
            return Ok(());
        }
        for name in &missing {
            log::error!(
                "❌ Required template '{}' not found, expected at {:?}",
                name,
                self.templates.path_for(name)
            );
        }
        Err(AutomationError::MissingTemplates {
            names: missing,
            dir: self.templates.dir().to_path_buf(),
        })
    }
}
