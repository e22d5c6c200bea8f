use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Classification of one telemetry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    /// `LED PWM duty cycle set to <N>%`
    DutyCycleUpdate { percent: u8 },
    /// `Photocell read: raw=<N>, scaled=true, value=<M>`
    SampleReading { raw: u32, scaled: u32 },
    Unrecognized,
}

struct Matcher {
    pattern: Regex,
    build: fn(&Captures<'_>) -> Option<Record>,
}

// Tried in order; the first pattern found in a line decides its record type.
static MATCHERS: Lazy<[Matcher; 2]> = Lazy::new(|| {
    [
        Matcher {
            pattern: compile(r"LED PWM duty cycle set to ([0-9]+)%"),
            build: duty_cycle,
        },
        Matcher {
            pattern: compile(r"Photocell read: raw=([0-9]+), scaled=true, value=([0-9]+)"),
            build: sample_reading,
        },
    ]
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("record patterns are valid regular expressions")
}

impl Record {
    pub fn classify(line: &str) -> Self {
        MATCHERS
            .iter()
            .find_map(|matcher| {
                matcher
                    .pattern
                    .captures(line)
                    .map(|caps| (matcher.build)(&caps))
            })
            .flatten()
            .unwrap_or(Record::Unrecognized)
    }
}

fn duty_cycle(caps: &Captures<'_>) -> Option<Record> {
    let percent: u8 = caps[1].parse().ok()?;
    (percent <= 100).then_some(Record::DutyCycleUpdate { percent })
}

fn sample_reading(caps: &Captures<'_>) -> Option<Record> {
    Some(Record::SampleReading {
        raw: caps[1].parse().ok()?,
        scaled: caps[2].parse().ok()?,
    })
}

/// Decodes a raw record, replacing invalid UTF-8 and trimming line terminators.
pub fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
