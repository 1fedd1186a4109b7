pub mod openai {
    pub const API_BASE: &str = "https://api.openai.com/v1";
    pub const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
    pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
    pub const BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";
    pub const MODEL_ID_ENV_VAR: &str = "OPENAI_MODEL_ID";
}

pub mod azure {
    /// Base URLs containing this (case-insensitive) are Azure deployments
    pub const HOST_MARKER: &str = "azure.com";
    pub const DEFAULT_API_VERSION: &str = "2024-08-01-preview";
    pub const API_VERSION_ENV_VAR: &str = "AZURE_OPENAI_API_VERSION";
    pub const API_KEY_HEADER: &str = "api-key";
    pub const DEPLOYMENTS_SEGMENT: &str = "/deployments";
}

pub mod models {
    pub const O1: &str = "o1";
    pub const O1_PREVIEW: &str = "o1-preview";
    pub const O1_MINI: &str = "o1-mini";
    pub const O3_MINI: &str = "o3-mini";
    pub const DEEPSEEK_REASONER: &str = "deepseek-reasoner";
}
