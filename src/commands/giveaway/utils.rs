use std::time::Duration;

use lazy_static::lazy_static;
use rand::Rng;
use rand::distr::Alphanumeric;
use regex::{Captures, Regex};

lazy_static! {
    static ref DURATION_REGEX: Regex = Regex::new(
        r"^\s*(?:(?P<hours>\d+)h)?\s*(?:(?P<minutes>\d+)m)?\s*(?:(?P<seconds>\d+)s?)?\s*$"
    )
    .unwrap();
}

pub const GIVEAWAY_CODE_LENGTH: usize = 6;

fn parsed_group(captures: &Captures, name: &str) -> Option<u64> {
    match captures.name(name) {
        Some(value) => value.as_str().parse::<u64>().ok(),
        None => Some(0),
    }
}

// Decodes a `1h30m15s` style duration string. A bare number is read as
// seconds. Returns None when nothing parseable was provided; a zero
// duration parses fine here and is rejected by the config validation.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let captures = DURATION_REGEX.captures(text)?;

    let no_parts = captures.name("hours").is_none()
        && captures.name("minutes").is_none()
        && captures.name("seconds").is_none();
    if no_parts {
        return None;
    }

    let hours = parsed_group(&captures, "hours")?;
    let minutes = parsed_group(&captures, "minutes")?;
    let seconds = parsed_group(&captures, "seconds")?;

    let total = hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?;
    Some(Duration::from_secs(total))
}

// A short human-facing identifier, printed in the announcement footer and
// accepted by the reroll / end commands.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..GIVEAWAY_CODE_LENGTH)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect::<String>()
        .to_uppercase()
}
