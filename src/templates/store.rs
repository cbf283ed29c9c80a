//! Template loading and lookup

use crate::config::AutomationConfig;
use image::RgbImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template directory not found: {path:?}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read template directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to load template {path:?}: {source}")]
    Load {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Template {path:?} has no pixels")]
    Empty { path: PathBuf },
}

/// What kind of UI element a template shows; drives the threshold correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum SemanticClass {
    Icon,
    MenuItem,
    TreeNode,
    ChildNode,
    Button,
    Element,
}

impl SemanticClass {
    /// Infer the class from a role name such as `img_filter_icon` or `grid_menu_option`
    pub fn from_name(name: &str) -> Self {
        let name_lower = name.to_lowercase();

        if name_lower.contains("icon") {
            SemanticClass::Icon
        } else if name_lower.contains("menu") {
            SemanticClass::MenuItem
        } else if name_lower.contains("node") {
            SemanticClass::TreeNode
        } else if ["button", "btn", "grid_", "draw_", "check", "sure"]
            .iter()
            .any(|k| name_lower.contains(k))
        {
            SemanticClass::Button
        } else {
            SemanticClass::Element
        }
    }
}

/// Immutable reference image.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub image: RgbImage,
    pub class: SemanticClass,
    pub base_confidence: f32,
    pub path: Option<PathBuf>,
}

impl Template {
    pub fn new(name: &str, image: RgbImage, class: SemanticClass, base_confidence: f32) -> Self {
        Self {
            name: name.to_string(),
            image,
            class,
            base_confidence,
            path: None,
        }
    }

    /// Load a template from an image file; the name is the file stem
    pub fn from_file(path: &Path, class: Option<SemanticClass>, base_confidence: f32) -> TemplateResult<Self> {
        let image = image::open(path)
            .map_err(|source| TemplateError::Load {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(TemplateError::Empty {
                path: path.to_path_buf(),
            });
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let class = class.unwrap_or_else(|| SemanticClass::from_name(&name));

        Ok(Self {
            name,
            image,
            class,
            base_confidence,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Named reference images loaded from one directory.
pub struct TemplateStore {
    dir: PathBuf,
    templates: BTreeMap<String, Template>,
}

impl TemplateStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            templates: BTreeMap::new(),
        }
    }

    /// Scan the configured directory for PNG templates and load them
    pub fn load(config: &AutomationConfig) -> TemplateResult<Self> {
        let mut store = Self::new(&config.templates_dir);
        store.load_from_directory(config)?;
        Ok(store)
    }

    /// Load every `*.png` in the store directory. Unreadable files are skipped with a
    /// warning so one bad asset does not hide the others.
    pub fn load_from_directory(&mut self, config: &AutomationConfig) -> TemplateResult<usize> {
        if !self.dir.is_dir() {
            return Err(TemplateError::DirectoryNotFound {
                path: self.dir.clone(),
            });
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|source| TemplateError::ReadDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut loaded_count = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_png = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("png"));
            if !path.is_file() || !is_png {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let class = config
                .child_templates
                .iter()
                .any(|c| c == stem)
                .then_some(SemanticClass::ChildNode);
            match Template::from_file(&path, class, config.base_confidence_for(stem)) {
                Ok(template) => {
                    log::debug!(
                        "🖼️ Loaded template '{}' {}x{} ({:?}, base {:.2})",
                        template.name,
                        template.width(),
                        template.height(),
                        template.class,
                        template.base_confidence
                    );
                    self.insert(template);
                    loaded_count += 1;
                }
                Err(e) => log::warn!("⚠️ Skipping template: {}", e),
            }
        }

        log::info!("🖼️ Loaded {} templates from {:?}", loaded_count, self.dir);
        Ok(loaded_count)
    }

    pub fn insert(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Names from `required` that are not loaded, in the given order
    pub fn missing<'a>(&self, required: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        required
            .into_iter()
            .filter(|name| !self.contains(name))
            .map(str::to_string)
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Expected file path of a template role
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.png"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn count(&self) -> usize {
        self.templates.len()
    }
}
