use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;

/// Reserved tokens of the date format grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millis,
    Micros,
}

/// Longest first: `SSSSSS` has to win over `SSS`.
const TOKENS: &[(&str, DateToken)] = &[
    ("SSSSSS", DateToken::Micros),
    ("yyyy", DateToken::Year),
    ("SSS", DateToken::Millis),
    ("MM", DateToken::Month),
    ("dd", DateToken::Day),
    ("HH", DateToken::Hour),
    ("mm", DateToken::Minute),
    ("ss", DateToken::Second),
];

impl DateToken {
    fn capture(self) -> &'static str {
        match self {
            DateToken::Year => r"(\d{4})",
            DateToken::Millis => r"(\d{3})",
            DateToken::Micros => r"(\d{6})",
            _ => r"(\d{1,2})",
        }
    }

    fn width(self) -> usize {
        match self {
            DateToken::Year => 4,
            DateToken::Millis => 3,
            DateToken::Micros => 6,
            _ => 2,
        }
    }

    fn apply(self, parts: &mut DateParts, value: u32) {
        match self {
            DateToken::Year => parts.year = Some(value),
            DateToken::Month => parts.month = Some(value),
            DateToken::Day => parts.day = Some(value),
            DateToken::Hour => parts.hour = value,
            DateToken::Minute => parts.minute = value,
            DateToken::Second => parts.second = value,
            DateToken::Millis => parts.millisecond = value,
            DateToken::Micros => parts.millisecond = value / 1000,
        }
    }

    /// The integer this token was parsed into, for round-trip comparison.
    fn parsed(self, parts: &DateParts) -> Option<u32> {
        match self {
            DateToken::Year => parts.year,
            DateToken::Month => parts.month,
            DateToken::Day => parts.day,
            DateToken::Hour => Some(parts.hour),
            DateToken::Minute => Some(parts.minute),
            DateToken::Second => Some(parts.second),
            DateToken::Millis | DateToken::Micros => Some(parts.millisecond),
        }
    }

    /// The same field re-read from a constructed date-time.
    fn extract(self, dt: &NaiveDateTime) -> i64 {
        match self {
            DateToken::Year => i64::from(dt.year()),
            DateToken::Month => i64::from(dt.month()),
            DateToken::Day => i64::from(dt.day()),
            DateToken::Hour => i64::from(dt.hour()),
            DateToken::Minute => i64::from(dt.minute()),
            DateToken::Second => i64::from(dt.second()),
            DateToken::Millis | DateToken::Micros => i64::from(dt.nanosecond() / 1_000_000),
        }
    }

    fn render(self, dt: &NaiveDateTime) -> String {
        let value = match self {
            DateToken::Micros => self.extract(dt) * 1000,
            _ => self.extract(dt),
        };
        format!("{:0width$}", value, width = self.width())
    }
}

#[derive(Debug, Default)]
struct DateParts {
    year: Option<u32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Token(DateToken),
    Literal(String),
}

fn render_segments(segments: &[Segment], dt: &NaiveDateTime) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Token(token) => token.render(dt),
            Segment::Literal(text) => text.clone(),
        })
        .collect()
}

fn tokenize(format: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = format;

    while !rest.is_empty() {
        if let Some((text, token)) = TOKENS.iter().find(|(text, _)| rest.starts_with(text)) {
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Token(*token));
            rest = &rest[text.len()..];
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            literal.push(c);
        }
        rest = chars.as_str();
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// A compiled date format: one anchored regex plus the token order its
/// capture groups appear in. Compile once, reuse for every row.
#[derive(Debug, Clone)]
pub struct DateFormatProgram {
    format: String,
    segments: Vec<Segment>,
    tokens: Vec<DateToken>,
    regex: Regex,
}

impl DateFormatProgram {
    pub fn compile(format: &str) -> Option<Self> {
        let segments = tokenize(format);
        let mut pattern = String::from("^");
        let mut tokens = Vec::new();

        for segment in &segments {
            match segment {
                Segment::Token(token) => {
                    pattern.push_str(token.capture());
                    tokens.push(*token);
                }
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).ok()?;
        Some(Self {
            format: format.to_string(),
            segments,
            tokens,
            regex,
        })
    }

    pub fn format_str(&self) -> &str {
        &self.format
    }

    /// Parses `value`, returning `None` on any mismatch, missing date part
    /// or calendar overflow (`31.02.2024` does not become March 2nd).
    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let caps = self.regex.captures(value.trim())?;
        let mut parts = DateParts::default();

        for (i, token) in self.tokens.iter().enumerate() {
            let digits = caps.get(i + 1)?.as_str();
            token.apply(&mut parts, digits.parse().ok()?);
        }

        let year = i32::try_from(parts.year?).ok()?;
        let dt = NaiveDate::from_ymd_opt(year, parts.month?, parts.day?)?.and_hms_milli_opt(
            parts.hour,
            parts.minute,
            parts.second,
            parts.millisecond,
        )?;

        let round_trips = self
            .tokens
            .iter()
            .all(|token| token.parsed(&parts).map(i64::from) == Some(token.extract(&dt)));
        round_trips.then_some(dt)
    }

    pub fn format(&self, dt: &NaiveDateTime) -> String {
        render_segments(&self.segments, dt)
    }
}

pub fn parse_date(value: &str, format: &str) -> Option<NaiveDateTime> {
    DateFormatProgram::compile(format)?.parse(value)
}

pub fn format_date(dt: &NaiveDateTime, format: &str) -> String {
    render_segments(&tokenize(format), dt)
}
