//! Illustration resolution
//!
//! Asks the active transport for a picture, scans whatever comes back, and
//! falls back to the curated scene library so the caller always receives a
//! renderable image.

pub mod extract;
pub mod scenes;

pub use extract::extract_image_url;
pub use scenes::{random_scene, random_topic, Scene, SCENES, TOPICS};

use crate::ai::Transport;
use crate::models::ImageResolution;
use crate::{prompts, Error, Result};
use rand::Rng;

/// Resolve an illustration for `topic`. Only missing credentials propagate;
/// every other failure resolves to a library scene.
pub async fn resolve(transport: &dyn Transport, topic: &str) -> Result<ImageResolution> {
    let prompt = prompts::composition_image(topic);

    match transport.generate_image(&prompt).await {
        Ok(raw) => match extract_image_url(&raw) {
            Some(url) => {
                tracing::info!("Using generated image for '{}'", topic);
                return Ok(ImageResolution {
                    url,
                    is_model_generated: true,
                    topic: topic.to_string(),
                });
            }
            None => tracing::warn!(
                "No image found in generation response ({} chars), using curated scene",
                raw.len()
            ),
        },
        Err(Error::MissingCredentials(reason)) => return Err(Error::MissingCredentials(reason)),
        Err(e) => tracing::warn!("Image generation failed, using curated scene: {}", e),
    }

    Ok(fallback(&mut rand::thread_rng()))
}

pub fn fallback<R: Rng + ?Sized>(rng: &mut R) -> ImageResolution {
    let scene = random_scene(rng);
    ImageResolution {
        url: scene.url.to_string(),
        is_model_generated: false,
        topic: scene.topic.to_string(),
    }
}
