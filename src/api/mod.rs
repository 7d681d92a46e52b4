mod gemini;

pub use gemini::{GeminiClient, GeminiSceneSource, GenreRecommendation, OperationHandle};
