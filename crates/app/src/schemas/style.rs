//! Style form schema.
//!
//! The styles page posts a single form whose `_action` field selects
//! create, update or delete.

use serde::Deserialize;

use poster_studio_core::{StyleId, ValidationError, Validator};

use crate::models::{NewStyle, StylePatch};

/// Maximum style name length.
pub const MAX_NAME_LENGTH: usize = 100;
/// Maximum prompt template length.
pub const MAX_PROMPT_LENGTH: usize = 4000;

const ACTIONS: &[&str] = &["create", "update", "delete"];

/// Raw style form as posted by the browser.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleForm {
    #[serde(rename = "_action")]
    pub action: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub prompt_template: Option<String>,
    pub example_image_url: Option<String>,
    pub is_active: Option<String>,
}

/// A validated style mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleCommand {
    Create(NewStyle),
    Update { id: StyleId, patch: StylePatch },
    Delete(StyleId),
}

impl StyleCommand {
    /// The `_action` tag this command came from.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
            Self::Delete(_) => "delete",
        }
    }
}

impl StyleForm {
    /// Validate the form into a [`StyleCommand`].
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming every failing field. An unknown or
    /// missing `_action` is reported on `_action` alone.
    pub fn validate(&self) -> Result<StyleCommand, ValidationError> {
        let mut v = Validator::new();
        let Some(action) = v.literal("_action", self.action.as_deref(), ACTIONS) else {
            return Err(v.into_error());
        };

        match action {
            "create" => self.validate_create(v).map(StyleCommand::Create),
            "update" => self.validate_update(v),
            _ => self.validate_delete(v),
        }
    }

    fn validate_create(&self, mut v: Validator) -> Result<NewStyle, ValidationError> {
        let name = v.text("name", self.name.as_deref(), MAX_NAME_LENGTH);
        let prompt_template = v.text(
            "promptTemplate",
            self.prompt_template.as_deref(),
            MAX_PROMPT_LENGTH,
        );
        let example_image_url = v.optional_url("exampleImageUrl", self.example_image_url.as_deref());
        let is_active = v.optional_bool("isActive", self.is_active.as_deref());

        match (name, prompt_template, example_image_url, is_active) {
            (Some(name), Some(prompt_template), Some(example_image_url), Some(is_active)) => {
                Ok(NewStyle {
                    name,
                    prompt_template,
                    example_image_url,
                    is_active: is_active.unwrap_or(true),
                })
            }
            _ => Err(v.into_error()),
        }
    }

    fn validate_update(&self, mut v: Validator) -> Result<StyleCommand, ValidationError> {
        let id = v.uuid("id", self.id.as_deref());
        let name = v.optional_text("name", self.name.as_deref(), MAX_NAME_LENGTH);
        let prompt_template = v.optional_text(
            "promptTemplate",
            self.prompt_template.as_deref(),
            MAX_PROMPT_LENGTH,
        );
        let example_image_url = v.url_patch("exampleImageUrl", self.example_image_url.as_deref());
        let is_active = v.optional_bool("isActive", self.is_active.as_deref());

        match (id, name, prompt_template, example_image_url, is_active) {
            (
                Some(id),
                Some(name),
                Some(prompt_template),
                Some(example_image_url),
                Some(is_active),
            ) => Ok(StyleCommand::Update {
                id: StyleId::new(id),
                patch: StylePatch {
                    name,
                    prompt_template,
                    example_image_url,
                    is_active,
                },
            }),
            _ => Err(v.into_error()),
        }
    }

    fn validate_delete(&self, mut v: Validator) -> Result<StyleCommand, ValidationError> {
        match v.uuid("id", self.id.as_deref()) {
            Some(id) => Ok(StyleCommand::Delete(StyleId::new(id))),
            None => Err(v.into_error()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use poster_studio_core::Patch;

    const ID: &str = "11111111-1111-1111-1111-111111111111";

    fn form(action: &str) -> StyleForm {
        StyleForm {
            action: Some(action.to_owned()),
            ..StyleForm::default()
        }
    }

    #[test]
    fn test_create_defaults_active() {
        let command = StyleForm {
            name: Some("Pop Art".to_owned()),
            prompt_template: Some("pop art portrait of {pet}".to_owned()),
            ..form("create")
        }
        .validate()
        .unwrap();

        let StyleCommand::Create(style) = command else {
            panic!("expected create");
        };
        assert_eq!(style.name, "Pop Art");
        assert!(style.is_active);
        assert_eq!(style.example_image_url, None);
    }

    #[test]
    fn test_create_reports_every_field() {
        let err = StyleForm {
            name: Some(String::new()),
            example_image_url: Some("javascript:alert(1)".to_owned()),
            is_active: Some("yes please".to_owned()),
            ..form("create")
        }
        .validate()
        .unwrap_err();

        assert!(err.has_field("name"));
        assert!(err.has_field("promptTemplate"));
        assert!(err.has_field("exampleImageUrl"));
        assert!(err.has_field("isActive"));
    }

    #[test]
    fn test_update_is_partial() {
        let command = StyleForm {
            id: Some(ID.to_owned()),
            name: Some("Vivid".to_owned()),
            is_active: Some("true".to_owned()),
            ..form("update")
        }
        .validate()
        .unwrap();

        assert_eq!(
            command,
            StyleCommand::Update {
                id: StyleId::parse(ID).unwrap(),
                patch: StylePatch {
                    name: Some("Vivid".to_owned()),
                    prompt_template: None,
                    example_image_url: Patch::Keep,
                    is_active: Some(true),
                },
            }
        );
    }

    #[test]
    fn test_update_keeps_constraints() {
        let err = StyleForm {
            id: Some("not-a-uuid".to_owned()),
            name: Some("x".repeat(MAX_NAME_LENGTH + 1)),
            ..form("update")
        }
        .validate()
        .unwrap_err();

        assert!(err.has_field("id"));
        assert!(err.has_field("name"));
        assert_eq!(err.errors().len(), 2);
    }

    #[test]
    fn test_update_empty_image_clears() {
        let command = StyleForm {
            id: Some(ID.to_owned()),
            example_image_url: Some(String::new()),
            ..form("update")
        }
        .validate()
        .unwrap();

        let StyleCommand::Update { patch, .. } = command else {
            panic!("expected update");
        };
        assert_eq!(patch.example_image_url, Patch::Clear);
    }

    #[test]
    fn test_delete_requires_uuid() {
        assert_eq!(
            StyleForm {
                id: Some(ID.to_owned()),
                ..form("delete")
            }
            .validate()
            .unwrap(),
            StyleCommand::Delete(StyleId::parse(ID).unwrap())
        );
        assert!(form("delete").validate().unwrap_err().has_field("id"));
    }

    #[test]
    fn test_unknown_action() {
        let err = form("archive").validate().unwrap_err();
        assert!(err.has_field("_action"));
        assert_eq!(err.errors().len(), 1);

        let err = StyleForm::default().validate().unwrap_err();
        assert!(err.has_field("_action"));
    }
}
