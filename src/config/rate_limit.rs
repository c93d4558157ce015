use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub public_read: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            public_read: RateLimitRule::new(30, 60),
            protected: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    /// Per-group overrides come from `RATE_LIMIT_AUTH`, `RATE_LIMIT_PUBLIC`
    /// and `RATE_LIMIT_PROTECTED`, each in `per_second:burst` form.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        for (var, rule) in [
            ("RATE_LIMIT_AUTH", &mut cfg.auth),
            ("RATE_LIMIT_PUBLIC", &mut cfg.public_read),
            ("RATE_LIMIT_PROTECTED", &mut cfg.protected),
        ] {
            if let Ok(raw) = env::var(var) {
                match parse_rule(&raw) {
                    Ok(parsed) => *rule = parsed,
                    Err(err) => tracing::warn!("Invalid {} '{}': {}", var, raw, err),
                }
            }
        }

        cfg
    }
}

fn parse_bool_env(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "on" => Some(true),
            "0" | "false" | "no" | "n" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 {
        return Err("per_second must be > 0".to_string());
    }
    if burst_size == 0 {
        return Err("burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}
