use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use tracker_domain::{TrackerService, ValidationError};

type TitlesCallback = Box<dyn Fn(&[String]) + Send + Sync>;
type SelectionCallback = Box<dyn Fn(Option<&str>) + Send + Sync>;
type EmptyCallback = Box<dyn Fn(bool) + Send + Sync>;

/// Category picker shown from the create/edit tracker form.
pub struct CategoryViewModel {
    service: Arc<TrackerService>,
    selected: Option<String>,
    on_categories_changed: Option<TitlesCallback>,
    on_selection_changed: Option<SelectionCallback>,
    on_empty_changed: Option<EmptyCallback>,
}

impl CategoryViewModel {
    pub fn new(service: Arc<TrackerService>, selected: Option<String>) -> Self {
        Self {
            service,
            selected,
            on_categories_changed: None,
            on_selection_changed: None,
            on_empty_changed: None,
        }
    }

    pub fn on_categories_changed(&mut self, callback: impl Fn(&[String]) + Send + Sync + 'static) {
        self.on_categories_changed = Some(Box::new(callback));
    }

    pub fn on_selection_changed(
        &mut self,
        callback: impl Fn(Option<&str>) + Send + Sync + 'static,
    ) {
        self.on_selection_changed = Some(Box::new(callback));
    }

    pub fn on_empty_changed(&mut self, callback: impl Fn(bool) + Send + Sync + 'static) {
        self.on_empty_changed = Some(Box::new(callback));
    }

    pub fn titles(&self) -> Vec<String> {
        self.service.category_titles()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.titles().is_empty()
    }

    /// Pushes the current state through every bound callback.
    pub fn load(&self) {
        self.emit_titles();
        self.emit_selection();
    }

    pub fn select(&mut self, title: &str) -> Result<()> {
        if !self.titles().iter().any(|candidate| candidate == title) {
            return Err(ValidationError::UnknownCategory(title.to_string()).into());
        }
        self.selected = Some(title.to_string());
        self.emit_selection();
        Ok(())
    }

    pub fn create(&mut self, title: &str) -> Result<()> {
        self.service
            .create_category(title)
            .with_context(|| format!("failed to create category `{title}`"))?;
        self.emit_titles();
        Ok(())
    }

    /// The selection follows a renamed category.
    pub fn rename(&mut self, old_title: &str, new_title: &str) -> Result<()> {
        self.service
            .rename_category(old_title, new_title)
            .with_context(|| format!("failed to rename category `{old_title}`"))?;
        if self.selected.as_deref() == Some(old_title) {
            self.selected = Some(new_title.trim().to_string());
            self.emit_selection();
        }
        self.emit_titles();
        Ok(())
    }

    pub fn delete(&mut self, title: &str) -> Result<()> {
        self.service
            .delete_category(title)
            .with_context(|| format!("failed to delete category `{title}`"))?;
        if self.selected.as_deref() == Some(title) {
            self.selected = None;
            self.emit_selection();
        }
        self.emit_titles();
        Ok(())
    }

    fn emit_titles(&self) {
        let titles = self.titles();
        debug!(count = titles.len(), "categories changed");
        if let Some(callback) = &self.on_categories_changed {
            callback(&titles);
        }
        if let Some(callback) = &self.on_empty_changed {
            callback(titles.is_empty());
        }
    }

    fn emit_selection(&self) {
        if let Some(callback) = &self.on_selection_changed {
            callback(self.selected.as_deref());
        }
    }
}
