pub const EVALGATE_LOG_ENV: &str = "EVALGATE_LOG";
pub const EVALGATE_HTTP_TIMEOUT_MS_ENV: &str = "EVALGATE_HTTP_TIMEOUT_MS";

const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
const MIN_HTTP_TIMEOUT_MS: u64 = 1_000;

#[must_use]
pub fn read_non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
pub(crate) fn read_env_u64(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
}

#[must_use]
pub fn http_timeout_ms() -> u64 {
    clamp_timeout_ms(read_env_u64(EVALGATE_HTTP_TIMEOUT_MS_ENV))
}

fn clamp_timeout_ms(raw: Option<u64>) -> u64 {
    raw.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS)
        .max(MIN_HTTP_TIMEOUT_MS)
}

#[cfg(test)]
mod tests {
    use super::clamp_timeout_ms;

    #[test]
    fn timeout_defaults_and_floors() {
        assert_eq!(clamp_timeout_ms(None), 30_000);
        assert_eq!(clamp_timeout_ms(Some(5)), 1_000);
        assert_eq!(clamp_timeout_ms(Some(45_000)), 45_000);
    }
}
