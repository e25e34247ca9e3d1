pub mod advice_prompt;
pub mod vision_keywords;

pub use advice_prompt::{HistoryTurn, PromptContext, build_prompt, parse_history};
pub use vision_keywords::extract_visual_keywords;
