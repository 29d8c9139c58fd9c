pub mod gemini_image;
pub mod pause;
pub mod recipe_db;
pub mod recipe_llm;
pub mod supabase;
pub mod unconfigured;

pub use gemini_image::GeminiImageAdapter;
pub use pause::TokioPause;
pub use recipe_db::SqliteRecipeStore;
pub use recipe_llm::OpenAiRecipeAdapter;
pub use supabase::SupabaseAdapter;
pub use unconfigured::Unconfigured;
