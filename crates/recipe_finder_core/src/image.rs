//! crates/recipe_finder_core/src/image.rs
//!
//! Bounded-retry image generation for recipes.
//!
//! The retry loop is an explicit state machine. [`ImageGenState::next`] is a
//! pure transition function and [`generate_with_retry`] drives it against an
//! [`ImageGenerationService`] and a [`Pause`].

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::ImagePayload;
use crate::ports::{ImageGenerationService, Pause, PortError};

//=========================================================================================
// Retry Policy and State Machine
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: the wait after attempt `n` (1-based) is `n * base_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageGenerationError {
    /// Every attempt completed without an image payload.
    #[error("No image data returned after {attempts} attempts")]
    Exhausted { attempts: u32 },
    /// The provider call itself failed; never retried.
    #[error("{0}")]
    Transport(String),
}

impl From<ImageGenerationError> for PortError {
    fn from(err: ImageGenerationError) -> Self {
        PortError::Upstream(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageGenState {
    Idle,
    Requesting { attempt: u32 },
    Waiting { attempt: u32, delay: Duration },
    Succeeded(ImagePayload),
    Exhausted { cause: ImageGenerationError },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageGenEvent {
    Start,
    Payload(ImagePayload),
    NoPayload,
    TransportError(String),
    Resumed,
}

impl ImageGenState {
    /// Applies one event. Events that don't apply to the current state leave it unchanged.
    pub fn next(self, event: ImageGenEvent, policy: &RetryPolicy) -> Self {
        match (self, event) {
            (Self::Idle, ImageGenEvent::Start) => Self::Requesting { attempt: 1 },
            (Self::Requesting { .. }, ImageGenEvent::Payload(payload)) => Self::Succeeded(payload),
            (Self::Requesting { attempt }, ImageGenEvent::NoPayload) => {
                if attempt < policy.max_attempts {
                    Self::Waiting {
                        attempt,
                        delay: policy.delay_after(attempt),
                    }
                } else {
                    Self::Exhausted {
                        cause: ImageGenerationError::Exhausted { attempts: attempt },
                    }
                }
            }
            (Self::Requesting { .. }, ImageGenEvent::TransportError(message)) => Self::Exhausted {
                cause: ImageGenerationError::Transport(message),
            },
            (Self::Waiting { attempt, .. }, ImageGenEvent::Resumed) => Self::Requesting { attempt: attempt + 1 },
            (state, _) => state,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Exhausted { .. })
    }
}

/// Requests an image, retrying "no payload" answers with linear backoff.
///
/// Attempts run strictly in sequence; each failure is observed before the next begins.
pub async fn generate_with_retry(
    provider: &dyn ImageGenerationService,
    pause: &dyn Pause,
    policy: &RetryPolicy,
    prompt: &str,
) -> Result<ImagePayload, ImageGenerationError> {
    let mut state = ImageGenState::Idle.next(ImageGenEvent::Start, policy);
    loop {
        state = match state {
            ImageGenState::Requesting { attempt } => {
                let event = match provider.generate(prompt).await {
                    Ok(Some(payload)) => ImageGenEvent::Payload(payload),
                    Ok(None) => ImageGenEvent::NoPayload,
                    Err(e) => ImageGenEvent::TransportError(e.to_string()),
                };
                info!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    got_image = matches!(event, ImageGenEvent::Payload(_)),
                    "Image generation attempt finished"
                );
                ImageGenState::Requesting { attempt }.next(event, policy)
            }
            ImageGenState::Waiting { attempt, delay } => {
                warn!(attempt, delay_ms = delay.as_millis() as u64, "No image data returned, retrying");
                pause.pause(delay).await;
                ImageGenState::Waiting { attempt, delay }.next(ImageGenEvent::Resumed, policy)
            }
            ImageGenState::Succeeded(payload) => return Ok(payload),
            ImageGenState::Exhausted { cause } => return Err(cause),
            ImageGenState::Idle => ImageGenState::Idle.next(ImageGenEvent::Start, policy),
        };
    }
}

//=========================================================================================
// Prompt and Storage Path
//=========================================================================================

/// One entry of a recipe's ingredient list as sent by clients: a bare string,
/// a structured AI ingredient, or anything else (ignored).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IngredientInput {
    Text(String),
    Structured {
        #[serde(default)]
        ingredient: Option<String>,
        #[serde(default)]
        quantity: Option<Value>,
        #[serde(default)]
        unit: Option<String>,
    },
    Other(Value),
}

impl IngredientInput {
    /// `"<qty> <unit> <name>"` for structured entries, the string itself otherwise.
    pub fn label(&self) -> Option<String> {
        let label = match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Structured { ingredient, quantity, unit } => {
                let quantity = quantity.as_ref().and_then(quantity_text);
                let parts: Vec<&str> = match quantity {
                    Some(ref qty) => vec![qty.as_str(), unit.as_deref().unwrap_or(""), ingredient.as_deref().unwrap_or("")],
                    None => vec![ingredient.as_deref().unwrap_or("")],
                };
                parts
                    .into_iter()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            }
            Self::Other(_) => String::new(),
        };
        (!label.is_empty()).then_some(label)
    }
}

/// Reads a JSON ingredient list; `None` when the value isn't an array.
pub fn ingredient_inputs(value: Option<&Value>) -> Option<Vec<IngredientInput>> {
    match value {
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| serde_json::from_value(item.clone()).unwrap_or(IngredientInput::Other(Value::Null)))
                .collect(),
        ),
        _ => None,
    }
}

/// Zero, empty and non-scalar quantities are omitted from the label.
fn quantity_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// The fixed photo prompt for a finished dish.
pub fn build_image_prompt(name: Option<&str>, ingredients: &[IngredientInput]) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or("Unknown dish");

    let mut labels: Vec<String> = Vec::new();
    for label in ingredients.iter().filter_map(IngredientInput::label) {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    let ingredient_list = if labels.is_empty() {
        "not specified".to_string()
    } else {
        labels.join(", ")
    };

    format!(
        "Generate a high-quality, realistic photo-style image of the FINAL cooked dish.\n\
         \n\
         Recipe name: \"{name}\"\n\
         Key ingredients: {ingredient_list}\n\
         \n\
         Requirements:\n\
         - Show a single plated serving of the finished dish.\n\
         - Neutral, soft background (no text, no logos, no hands).\n\
         - Bright, appetizing lighting.\n\
         - No text overlays or watermarks.\n"
    )
}

/// Blob path of a saved recipe's generated image.
pub fn saved_image_path(saved_id: &str, payload: &ImagePayload) -> String {
    format!("saved/{}.{}", saved_id, payload.extension())
}
