use crate::domain::Rules;
use crate::use_cases::{ArenaSettings, WorldSettings};
use std::{env, str::FromStr, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TICK_RATE_HZ: u32 = 30;
// Above this the derived interval drops under one millisecond.
const MAX_TICK_RATE_HZ: u32 = 1000;
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);
const DEFAULT_SHIELD_DURATION_MS: u64 = 2500;

/// Process-level knobs, read from `WORD_DUEL_*` environment variables.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub port: u16,
    pub tick_rate_hz: u32,
    pub canvas_width: f32,
    pub projectile_speed: f32,
    pub shield_duration: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let rules = Rules::default();
        Self {
            port: DEFAULT_PORT,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            canvas_width: rules.canvas_width,
            projectile_speed: rules.projectile.speed,
            shield_duration: Duration::from_millis(DEFAULT_SHIELD_DURATION_MS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: read_var("WORD_DUEL_PORT", defaults.port, |_| true),
            tick_rate_hz: read_var(
                "WORD_DUEL_TICK_RATE_HZ",
                defaults.tick_rate_hz,
                tick_rate_in_range,
            ),
            canvas_width: read_var("WORD_DUEL_CANVAS_WIDTH", defaults.canvas_width, |w| {
                w.is_finite() && *w > 0.0
            }),
            projectile_speed: read_var(
                "WORD_DUEL_PROJECTILE_SPEED",
                defaults.projectile_speed,
                |s| s.is_finite() && *s > 0.0,
            ),
            shield_duration: Duration::from_millis(read_var(
                "WORD_DUEL_SHIELD_DURATION_MS",
                DEFAULT_SHIELD_DURATION_MS,
                |ms| *ms > 0,
            )),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        (Duration::from_secs(1) / self.tick_rate_hz.max(1)).max(MIN_TICK_INTERVAL)
    }

    pub fn rules(&self) -> Rules {
        let mut rules = Rules {
            canvas_width: self.canvas_width,
            ..Rules::default()
        };
        rules.projectile.speed = self.projectile_speed;
        rules
    }

    pub fn arena_settings(&self) -> ArenaSettings {
        ArenaSettings {
            input_channel_capacity: INPUT_CHANNEL_CAPACITY,
            world_broadcast_capacity: WORLD_BROADCAST_CAPACITY,
            world: WorldSettings {
                tick_interval: self.tick_interval(),
                shield_duration: self.shield_duration,
                rules: self.rules(),
            },
        }
    }
}

fn tick_rate_in_range(hz: &u32) -> bool {
    (1..=MAX_TICK_RATE_HZ).contains(hz)
}

fn read_var<T>(name: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => parse_or_default(name, &raw, default, valid),
        Err(_) => default,
    }
}

fn parse_or_default<T>(name: &str, raw: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            tracing::warn!(
                var = name,
                value = %raw,
                ?default,
                "invalid config value; using default"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_arena() {
        let config = ServerConfig::default();

        assert_eq!(config.port, 8080);
        assert_eq!(config.tick_interval(), Duration::from_secs(1) / 30);
        assert_eq!(config.shield_duration, Duration::from_millis(2500));
        assert_eq!(config.rules().canvas_width, 1200.0);
        assert_eq!(config.rules().projectile.speed, 8.0);
    }

    #[test]
    fn overrides_flow_into_world_settings() {
        let config = ServerConfig {
            tick_rate_hz: 100,
            canvas_width: 600.0,
            projectile_speed: 40.0,
            ..ServerConfig::default()
        };

        let settings = config.arena_settings();

        assert_eq!(settings.world.tick_interval, Duration::from_millis(10));
        assert_eq!(settings.world.rules.canvas_width, 600.0);
        assert_eq!(settings.world.rules.projectile.speed, 40.0);
        assert_eq!(settings.input_channel_capacity, INPUT_CHANNEL_CAPACITY);
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let value = read_var("WORD_DUEL_TEST_NEVER_SET", 7u32, |_| true);

        assert_eq!(value, 7);
    }

    #[test]
    fn tick_rates_that_round_to_a_zero_interval_are_rejected() {
        let hz = |raw: &str| parse_or_default("WORD_DUEL_TICK_RATE_HZ", raw, 30, tick_rate_in_range);

        assert_eq!(hz("2000000000"), 30);
        assert_eq!(hz("1001"), 30);
        assert_eq!(hz("0"), 30);
        assert_eq!(hz("-5"), 30);
        assert_eq!(hz(" 60 "), 60);
        assert_eq!(hz("1000"), 1000);
    }

    #[test]
    fn tick_interval_never_reaches_zero() {
        let config = ServerConfig {
            tick_rate_hz: u32::MAX,
            ..ServerConfig::default()
        };

        assert_eq!(config.tick_interval(), Duration::from_millis(1));
        assert_eq!(
            config.arena_settings().world.tick_interval,
            Duration::from_millis(1)
        );
    }

    #[test]
    fn non_positive_gameplay_values_fall_back() {
        let width = parse_or_default("WORD_DUEL_CANVAS_WIDTH", "-1", 1200.0f32, |w| *w > 0.0);
        let speed = parse_or_default("WORD_DUEL_PROJECTILE_SPEED", "fast", 8.0f32, |_| true);

        assert_eq!(width, 1200.0);
        assert_eq!(speed, 8.0);
    }
}
