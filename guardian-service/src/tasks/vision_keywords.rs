use tracing::debug;

use crate::model::{GenerativeModel, InlineImage, Part};

const VISION_PROMPT: &str = "Analyze this medical situation.
Identify the injury type and any visible tools/items.
Return 3-5 keywords only.";

/// Ask the model for a handful of keywords describing the image.
pub async fn extract_visual_keywords(
    model: &dyn GenerativeModel,
    api_key: &str,
    image: &InlineImage,
) -> anyhow::Result<String> {
    let parts = [Part::Text(VISION_PROMPT.to_string()), Part::Image(image.clone())];
    let keywords = model.generate(api_key, &parts).await?;
    let keywords = keywords.trim().to_string();
    debug!(keywords = %keywords, "Visual keywords extracted");
    Ok(keywords)
}
