//! Section templates: reusable snapshots of one section's widgets.
//!
//! A template is immutable once saved. Inserting it clones the whole group
//! with fresh ids, translates it so the group's top-left lands on a fixed
//! origin, and assigns every clone to one target section.
//!
//! The library persists as a MessagePack blob so a host can stash it in
//! local storage or a file.

use serde::{Deserialize, Serialize};
use studio_core::model::Widget;
use thiserror::Error;

const ARCHIVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("section `{0}` has no widgets")]
    EmptySection(String),

    #[error("no template named `{0}`")]
    Unknown(String),

    #[error("template name must not be blank")]
    BlankName,

    #[error("could not encode template library: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("could not decode template library: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("unsupported template library version {0}")]
    Version(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTemplate {
    name: String,
    source_section: String,
    widgets: Vec<Widget>,
}

impl SectionTemplate {
    /// Capture `widgets` as they are now. Empty groups are rejected.
    pub fn capture<'a>(
        name: &str,
        section: &str,
        widgets: impl IntoIterator<Item = &'a Widget>,
    ) -> Result<Self, TemplateError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TemplateError::BlankName);
        }
        let widgets: Vec<Widget> = widgets.into_iter().cloned().collect();
        if widgets.is_empty() {
            return Err(TemplateError::EmptySection(section.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            source_section: section.to_string(),
            widgets,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_section(&self) -> &str {
        &self.source_section
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    /// Fresh clones of the group, translated so its minimum x/y sits at
    /// `origin`, all assigned to `section`.
    pub fn instantiate(&self, section: &str, origin: (f32, f32)) -> Vec<Widget> {
        let min_x = self.widgets.iter().map(|w| w.geometry.x).fold(f32::INFINITY, f32::min);
        let min_y = self.widgets.iter().map(|w| w.geometry.y).fold(f32::INFINITY, f32::min);
        let (dx, dy) = (origin.0 - min_x, origin.1 - min_y);
        self.widgets
            .iter()
            .map(|w| {
                let mut clone = w.duplicate();
                clone.geometry = clone.geometry.translated(dx, dy);
                clone.assign_section(section);
                clone
            })
            .collect()
    }
}

#[derive(Serialize, Deserialize)]
struct Archive {
    version: u32,
    templates: Vec<SectionTemplate>,
}

/// Named templates in save order. Saving under an existing name replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateLibrary {
    templates: Vec<SectionTemplate>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template, returning the one it replaced.
    pub fn insert(&mut self, template: SectionTemplate) -> Option<SectionTemplate> {
        match self.templates.iter_mut().find(|t| t.name == template.name) {
            Some(existing) => {
                log::warn!("template `{}` overwritten", template.name);
                Some(std::mem::replace(existing, template))
            }
            None => {
                self.templates.push(template);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<&SectionTemplate, TemplateError> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| TemplateError::Unknown(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Option<SectionTemplate> {
        let index = self.templates.iter().position(|t| t.name == name)?;
        Some(self.templates.remove(index))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.templates.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        let archive = Archive {
            version: ARCHIVE_VERSION,
            templates: self.templates.clone(),
        };
        Ok(rmp_serde::to_vec_named(&archive)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TemplateError> {
        let archive: Archive = rmp_serde::from_slice(bytes)?;
        if archive.version != ARCHIVE_VERSION {
            return Err(TemplateError::Version(archive.version));
        }
        Ok(Self {
            templates: archive.templates,
        })
    }
}
