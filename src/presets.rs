//! Predefined templates offered in the template picker.

use crate::block::Template;
use crate::error::{MailError, MailResult};
use crate::storage::{SavedTemplate, TemplateCategory};

pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    json: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        id: "predefined-transactional",
        name: "Transactional Email",
        description: "Perfect for order confirmations, invoices, and important notifications.",
        json: include_str!("../presets/transactional.json"),
    },
    Preset {
        id: "predefined-welcome",
        name: "Welcome",
        description: "Ideal for welcoming new users or subscribers.",
        json: include_str!("../presets/welcome.json"),
    },
    Preset {
        id: "predefined-newsletter",
        name: "Newsletter",
        description: "Complete design for newsletters with multiple sections and columns.",
        json: include_str!("../presets/newsletter.json"),
    },
    Preset {
        id: "predefined-support",
        name: "Support",
        description: "Professional template for customer support communications.",
        json: include_str!("../presets/support.json"),
    },
];

impl Preset {
    pub fn template(&self) -> MailResult<Template> {
        Template::from_json(self.json)
    }

    pub fn to_saved(&self) -> MailResult<SavedTemplate> {
        Ok(SavedTemplate {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            category: TemplateCategory::Predefined,
            template: self.template()?,
            created_at: None,
            updated_at: None,
        })
    }
}

/// Look up a preset by id; the `predefined-` prefix may be omitted
pub fn find_preset(id: &str) -> MailResult<&'static Preset> {
    PRESETS
        .iter()
        .find(|p| p.id == id || p.id.strip_prefix("predefined-") == Some(id))
        .ok_or_else(|| MailError::UnknownPreset { id: id.to_string() })
}

/// All presets as saved-template entries
pub fn list_presets() -> MailResult<Vec<SavedTemplate>> {
    PRESETS.iter().map(Preset::to_saved).collect()
}
