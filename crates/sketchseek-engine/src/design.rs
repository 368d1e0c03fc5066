use crate::backend::DesignBackend;
use crate::error::{ValidationError, WorkflowError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sketchseek_common::protocol::{CreateDesignRequest, DesignId, InputMode, SessionId};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Category hints offered by the search UI. Other values are passed through.
pub const KNOWN_CATEGORIES: &[&str] = &["UI", "Logo", "Icon", "Illustration"];

/// User input for one design, not yet checked.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignDraft {
    pub input_mode: InputMode,
    pub category_hint: Option<String>,
    pub text_prompt: Option<String>,
    pub canvas_data: Option<String>,
}

impl DesignDraft {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            input_mode: InputMode::Text,
            category_hint: None,
            text_prompt: Some(prompt.into()),
            canvas_data: None,
        }
    }

    pub fn canvas(data: impl Into<String>) -> Self {
        Self {
            input_mode: InputMode::Canvas,
            category_hint: None,
            text_prompt: None,
            canvas_data: Some(data.into()),
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category_hint = category;
        self
    }

    /// Check that the payload matches the mode.
    ///
    /// Blank strings count as absent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let text = non_blank(self.text_prompt.as_deref());
        let canvas = non_blank(self.canvas_data.as_deref());

        match self.input_mode {
            InputMode::Text => {
                if canvas.is_some() {
                    return Err(ValidationError::UnexpectedCanvasData);
                }
                if text.is_none() {
                    return Err(ValidationError::EmptyTextPrompt);
                }
            }
            InputMode::Canvas => {
                if text.is_some() {
                    return Err(ValidationError::UnexpectedTextPrompt);
                }
                if canvas.is_none() {
                    return Err(ValidationError::EmptyCanvas);
                }
            }
        }
        Ok(())
    }

    /// Validate and build the wire request.
    pub fn to_request(&self, session_id: SessionId) -> Result<CreateDesignRequest, ValidationError> {
        self.validate()?;

        let (text_prompt, canvas_data) = match self.input_mode {
            InputMode::Text => (self.text_prompt.clone(), None),
            InputMode::Canvas => (None, self.canvas_data.clone()),
        };

        Ok(CreateDesignRequest {
            session_id,
            input_mode: self.input_mode,
            category_hint: non_blank(self.category_hint.as_deref()).map(str::to_string),
            text_prompt,
            canvas_data,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Encode raw image bytes as a data URL, the format the backend expects for sketches.
pub fn canvas_data_url(bytes: &[u8], path: &Path) -> String {
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Uploads one design. Never retries.
pub struct DesignSubmitter {
    backend: Arc<dyn DesignBackend>,
}

impl DesignSubmitter {
    pub fn new(backend: Arc<dyn DesignBackend>) -> Self {
        Self { backend }
    }

    pub async fn submit(
        &self,
        session_id: &SessionId,
        draft: &DesignDraft,
    ) -> Result<DesignId, WorkflowError> {
        let request = draft.to_request(session_id.clone())?;
        let response = self.backend.create_design(&request).await?;
        info!(
            "Created {} design {} (status: {})",
            request.input_mode, response.design_id, response.status
        );
        Ok(response.design_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_draft_valid() {
        assert_eq!(DesignDraft::text("red vintage poster").validate(), Ok(()));
    }

    #[test]
    fn test_blank_text_rejected() {
        for prompt in ["", "   ", "\n\t"] {
            assert_eq!(
                DesignDraft::text(prompt).validate(),
                Err(ValidationError::EmptyTextPrompt)
            );
        }
    }

    #[test]
    fn test_blank_canvas_rejected() {
        assert_eq!(
            DesignDraft::canvas("  ").validate(),
            Err(ValidationError::EmptyCanvas)
        );
    }

    #[test]
    fn test_mixed_payload_rejected() {
        let mut draft = DesignDraft::text("logo");
        draft.canvas_data = Some("data:image/png;base64,AAAA".into());
        assert_eq!(draft.validate(), Err(ValidationError::UnexpectedCanvasData));

        let mut draft = DesignDraft::canvas("data:image/png;base64,AAAA");
        draft.text_prompt = Some("logo".into());
        assert_eq!(draft.validate(), Err(ValidationError::UnexpectedTextPrompt));
    }

    #[test]
    fn test_request_drops_blank_category() {
        let request = DesignDraft::text("icon set")
            .with_category(Some("  ".into()))
            .to_request(SessionId::new("s"))
            .unwrap();
        assert_eq!(request.category_hint, None);
        assert_eq!(request.text_prompt.as_deref(), Some("icon set"));
        assert_eq!(request.canvas_data, None);
    }

    #[test]
    fn test_request_keeps_category() {
        let request = DesignDraft::canvas("data:image/png;base64,AAAA")
            .with_category(Some("Logo".into()))
            .to_request(SessionId::new("s"))
            .unwrap();
        assert_eq!(request.input_mode, InputMode::Canvas);
        assert_eq!(request.category_hint.as_deref(), Some("Logo"));
        assert_eq!(request.text_prompt, None);
    }

    #[test]
    fn test_canvas_data_url_mime() {
        let png = canvas_data_url(&[1, 2, 3], Path::new("sketch.png"));
        assert_eq!(png, "data:image/png;base64,AQID");

        let jpg = canvas_data_url(&[1, 2, 3], Path::new("photo.JPG"));
        assert!(jpg.starts_with("data:image/jpeg;base64,"));

        let unknown = canvas_data_url(&[], Path::new("sketch"));
        assert_eq!(unknown, "data:image/png;base64,");
    }
}
