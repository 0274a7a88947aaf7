//! Run-time tuning for the interpreter and its host loop.
//!
//! The CLI takes no flags, so the knobs come from environment variables,
//! falling back to the conventional values:
//!
//! | variable                | default | meaning                                  |
//! |-------------------------|---------|------------------------------------------|
//! | `CHIP8_CYCLES_PER_FRAME`| 10      | instructions executed per timer tick     |
//! | `CHIP8_FRAME_RATE`      | 60      | timer ticks / redraws per second         |
//! | `CHIP8_MAX_STACK_DEPTH` | 16      | call depth before 2nnn faults            |
//! | `CHIP8_KEY_HOLD_MS`     | 150     | how long a terminal key press stays down |
//! | `CHIP8_HALT_ON_FAULT`   | true    | stop on a runtime fault, or skip it      |
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip8Config {
    pub cycles_per_frame: u32,
    pub frame_rate_hz: u32,
    pub max_stack_depth: usize,
    pub key_hold: Duration,
    pub halt_on_fault: bool,
}

impl Default for Chip8Config {
    fn default() -> Self {
        Chip8Config {
            cycles_per_frame: 10,
            frame_rate_hz: 60,
            max_stack_depth: 16,
            key_hold: Duration::from_millis(150),
            halt_on_fault: true,
        }
    }
}

impl Chip8Config {
    /// defaults overridden by any CHIP8_* environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// as `from_env`, but reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, "CHIP8_CYCLES_PER_FRAME", |v: &u32| *v > 0) {
            config.cycles_per_frame = v;
        }
        if let Some(v) = parse_var(&lookup, "CHIP8_FRAME_RATE", |v: &u32| *v > 0) {
            config.frame_rate_hz = v;
        }
        if let Some(v) = parse_var(&lookup, "CHIP8_MAX_STACK_DEPTH", |v: &usize| *v > 0) {
            config.max_stack_depth = v;
        }
        if let Some(v) = parse_var(&lookup, "CHIP8_KEY_HOLD_MS", |_: &u64| true) {
            config.key_hold = Duration::from_millis(v);
        }
        if let Some(v) = parse_var(&lookup, "CHIP8_HALT_ON_FAULT", |_: &bool| true) {
            config.halt_on_fault = v;
        }
        log::debug!("configuration: {:?}", config);
        config
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    valid: impl Fn(&T) -> bool,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(v) if valid(&v) => Some(v),
        _ => {
            log::warn!("ignoring {}={:?}: not a usable value", name, raw);
            None
        }
    }
}
