use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var("PALATE_EMBEDDING_PROVIDER")
            && !provider.is_empty()
        {
            self.embedding.provider = provider;
        }

        if let Ok(model) = std::env::var("PALATE_EMBEDDING_MODEL")
            && !model.is_empty()
        {
            self.embedding.model = model;
        }

        if let Ok(key) =
            std::env::var("PALATE_EMBEDDING_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
            && !key.is_empty()
        {
            self.embedding.api_key = Some(key);
        }

        if let Ok(dims_str) = std::env::var("PALATE_EMBEDDING_DIMENSIONS")
            && let Ok(dims) = dims_str.parse::<usize>()
        {
            self.embedding.dimensions = dims;
        }

        if let Ok(top_n_str) = std::env::var("PALATE_TOP_N")
            && let Ok(top_n) = top_n_str.parse::<usize>()
        {
            self.ranking.top_n = top_n;
        }

        if let Ok(weight_str) = std::env::var("PALATE_DISLIKE_WEIGHT")
            && let Ok(weight) = weight_str.parse::<f64>()
            && weight.is_finite()
        {
            self.ranking.dislike_weight = weight;
        }

        if let Ok(port_str) =
            std::env::var("PALATE_GATEWAY_PORT").or_else(|_| std::env::var("PORT"))
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }

        if let Ok(host) = std::env::var("PALATE_GATEWAY_HOST").or_else(|_| std::env::var("HOST"))
            && !host.is_empty()
        {
            self.gateway.host = host;
        }

        if let Ok(level) = std::env::var("PALATE_LOG_LEVEL")
            && !level.is_empty()
        {
            self.observability.log_level = level;
        }
    }
}
