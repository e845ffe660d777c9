//! Model templates
//!
//! A template describes the files a model writes into a solution's output
//! directory and how each one is presented. Tasks name their model by id;
//! [`TemplateRegistry::resolve`] maps that id to a template, falling back to
//! [`KANDINSKY2`] for models nobody registered.

use alloy_primitives::B256;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::Config;
use crate::error::HostError;

/// How a solution output file is presented
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Still image
    Image,
    /// Video clip
    Video,
}

/// One file in a solution's output directory
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateOutput {
    /// Path relative to the solution cid
    pub filename: &'static str,
    /// Presentation of the file
    pub kind: OutputKind,
}

/// Output layout of one model family
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Template {
    /// Display name, also the key used in configuration
    pub name: &'static str,
    /// Files the model produces
    pub outputs: &'static [TemplateOutput],
}

/// Default template for unregistered models
pub const KANDINSKY2: Template = Template {
    name: "Kandinsky2",
    outputs: &[TemplateOutput { filename: "out-1.png", kind: OutputKind::Image }],
};

/// Anything v3 image model
pub const ANYTHINGV3: Template = Template {
    name: "Anythingv3",
    outputs: &[TemplateOutput { filename: "out-1.png", kind: OutputKind::Image }],
};

/// Zeroscope v2 text-to-video model
pub const ZEROSCOPEV2: Template = Template {
    name: "Zeroscopev2",
    outputs: &[TemplateOutput { filename: "out-1.mp4", kind: OutputKind::Video }],
};

const BUILTIN: [&Template; 3] = [&KANDINSKY2, &ANYTHINGV3, &ZEROSCOPEV2];

/// Look up a built-in template by name, ignoring case
pub fn builtin(name: &str) -> Option<&'static Template> {
    BUILTIN.into_iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

/// Model id to template mapping
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateRegistry {
    models: HashMap<B256, &'static Template>,
}

impl TemplateRegistry {
    /// Build from `model_templates` (model id to template name)
    pub fn from_config(config: &Config) -> Result<Self, HostError> {
        let mut registry = Self::default();
        for (model, name) in &config.model_templates {
            let id: B256 = model
                .parse()
                .map_err(|e| HostError::Config(format!("model_templates key {model:?}: {e}")))?;
            let template = builtin(name)
                .ok_or_else(|| HostError::Config(format!("unknown model template {name:?}")))?;
            registry.register(id, template);
        }
        Ok(registry)
    }

    /// Map `model` to `template`, replacing any earlier entry
    pub fn register(&mut self, model: B256, template: &'static Template) {
        self.models.insert(model, template);
    }

    /// Template for `model`
    pub fn resolve(&self, model: &B256) -> &'static Template {
        self.models.get(model).copied().unwrap_or(&KANDINSKY2)
    }
}
