pub mod db;
pub mod embeddings;
pub mod guidance_llm;
pub mod pdf;
pub mod sst;
pub mod tts;

pub use db::DbAdapter;
pub use embeddings::OpenAiEmbeddingAdapter;
pub use guidance_llm::OpenAiGuidanceAdapter;
pub use sst::OpenAiSstAdapter;
pub use tts::OpenAiTtsAdapter;
