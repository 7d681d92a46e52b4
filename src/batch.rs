//! Batch image generation: one sweep over the ordered scene prompts, strictly
//! sequential, filling only the scenes that have no image yet.

use async_trait::async_trait;

use crate::content::SceneAssets;
use crate::error::Result;

/// Seam between the orchestrator and the provider, one image per call.
#[async_trait]
pub trait SceneImageSource {
    async fn generate(&self, scene: usize, prompt: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    pub scene: usize,
    pub total: usize,
    /// round(100 * completed / total)
    pub percent: u8,
    /// The scene already had an image and was not re-requested.
    pub skipped: bool,
}

/// Process scenes in index order; skip indices already present, generate and
/// store the rest, publishing progress after every scene. Serialized on
/// purpose: one provider call in flight bounds rate-limit exposure.
///
/// On the first failed scene the error propagates and the sweep stops;
/// everything stored up to that point is kept. Returns the number of images
/// actually generated.
pub async fn fill_missing_images<S, P>(
    prompts: &[String],
    images: &mut SceneAssets,
    source: &S,
    mut on_progress: P,
) -> Result<usize>
where
    S: SceneImageSource + ?Sized,
    P: FnMut(BatchProgress),
{
    let total = prompts.len();
    if total == 0 {
        return Ok(0);
    }

    let mut generated = 0;
    for (scene, prompt) in prompts.iter().enumerate() {
        let skipped = images.contains(scene);
        if !skipped {
            let bytes = source.generate(scene, prompt).await?;
            images.insert(scene, bytes)?;
            generated += 1;
        }
        let percent = (100.0 * (scene + 1) as f64 / total as f64).round() as u8;
        on_progress(BatchProgress {
            scene,
            total,
            percent,
            skipped,
        });
    }
    Ok(generated)
}
