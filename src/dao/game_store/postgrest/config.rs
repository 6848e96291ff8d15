use crate::config::ApiKey;

/// Runtime configuration describing how to reach one PostgREST table.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL; the REST prefix is appended by the store.
    pub base_url: String,
    /// Table holding the games, `games` by default.
    pub table: String,
    /// Sent both as `apikey` and as the bearer token.
    pub api_key: ApiKey,
}

impl PostgrestConfig {
    /// Settings for `table` under `base_url`.
    pub fn new(base_url: impl Into<String>, table: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            base_url: base_url.into(),
            table: table.into(),
            api_key,
        }
    }

    /// Endpoint of the table, e.g. `https://project.example/rest/v1/games`.
    pub fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            self.table
        )
    }
}
