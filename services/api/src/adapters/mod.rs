pub mod completion_llm;
pub mod db;
pub mod sessions;
pub mod tts;

pub use completion_llm::OpenAiCompletionAdapter;
pub use db::DbAdapter;
pub use sessions::InMemorySessionStore;
pub use tts::OpenAiTtsAdapter;
