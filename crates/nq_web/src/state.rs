pub struct AppState {
    pub client: reqwest::Client,
    pub upstream_base: String,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(upstream_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upstream_base: upstream_base.into(),
            api_key,
        }
    }
}
