// src/config/mod.rs
pub mod pipeline;

pub use pipeline::{
    load_default, load_from, HeadlineSettings, OutputConfig, PipelineConfig, ProviderConfig,
    SocialSettings, ENV_APP_KEY, ENV_CONFIG_PATH,
};
