use sqlpilot_llm::SqlGenerator;

/// Shared per-process state handed to request handlers.
pub struct AppState {
    pub generator: SqlGenerator,
}
