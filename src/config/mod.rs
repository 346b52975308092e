mod radar_config;

pub use radar_config::{
    API_KEY_ENV, DEFAULT_HISTORY_LIMIT, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT, RadarConfig, render_user_prompt,
};
