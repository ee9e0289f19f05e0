use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Characters ignored inside amounts: all Unicode whitespace, which covers
/// the no-break spaces (U+00A0, U+202F) used as thousands separators.
pub fn is_amount_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{00A0}' || c == '\u{202F}'
}

/// Parses an amount whose decimal separator may be `,` or `.`.
///
/// Whichever of the two occurs last is taken as the decimal separator; every
/// other `,`/`.` is grouping noise. Whitespace (NBSP included) is ignored and
/// one leading sign is kept. Returns `None` for empty input, a lone sign, or
/// anything that does not end up as a finite number.
pub fn parse_amount(text: &str) -> Option<f64> {
    let compact: String = text
        .chars()
        .filter(|c| !is_amount_space(*c))
        .collect();

    let (negative, body) = match compact.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, compact.strip_prefix('+').unwrap_or(compact.as_str())),
    };
    if body.is_empty() {
        return None;
    }

    let decimal_at = match (body.rfind(','), body.rfind('.')) {
        (Some(comma), Some(dot)) => Some(comma.max(dot)),
        (comma, dot) => comma.or(dot),
    };

    let mut normalized = String::with_capacity(body.len() + 1);
    if negative {
        normalized.push('-');
    }
    for (i, ch) in body.char_indices() {
        match ch {
            ',' | '.' if Some(i) == decimal_at => normalized.push('.'),
            ',' | '.' => {}
            _ => normalized.push(ch),
        }
    }

    let value: f64 = normalized.parse().ok()?;
    value.is_finite().then_some(value)
}

fn is_placeholder(c: char) -> bool {
    c == '0' || c == '#'
}

/// A fraction sub-pattern is always `0*#*`.
fn is_fraction_run(run: &[char]) -> bool {
    let zeros = run.iter().take_while(|c| **c == '0').count();
    run[zeros..].iter().all(|c| *c == '#')
}

/// An ICU/Excel style digit-placeholder pattern such as `#.##0,00`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberPattern {
    pub prefix: String,
    pub suffix: String,
    pub grouping_char: Option<char>,
    pub grouping_size: usize,
    pub min_integer_digits: usize,
    pub min_fraction_digits: usize,
    pub max_fraction_digits: usize,
    pub decimal_char: char,
}

impl NumberPattern {
    /// Decomposes `pattern`; `None` when it holds no `0`/`#` placeholder.
    pub fn parse(pattern: &str) -> Option<Self> {
        let chars: Vec<char> = pattern.chars().collect();
        let first = chars.iter().position(|c| is_placeholder(*c))?;
        let last = chars.iter().rposition(|c| is_placeholder(*c))?;
        let core = &chars[first..=last];

        let separators: Vec<(usize, char)> = core
            .iter()
            .enumerate()
            .filter(|(_, c)| !is_placeholder(**c))
            .map(|(i, c)| (i, *c))
            .collect();

        let decimal_at = match separators.last() {
            None => None,
            Some(&(pos, ch)) if separators.iter().any(|(_, c)| *c != ch) => Some(pos),
            Some(_) if separators.len() > 1 => None,
            Some(&(pos, _)) => {
                let before = &core[..pos];
                let after = &core[pos + 1..];
                let groups = after.len() == 3 && (!is_fraction_run(after) || !before.contains(&'0'));
                (!groups).then_some(pos)
            }
        };

        let (integer, fraction) = match decimal_at {
            Some(pos) => (&core[..pos], &core[pos + 1..]),
            None => (core, &core[core.len()..]),
        };

        let (grouping_char, grouping_size) = match integer.iter().rposition(|c| !is_placeholder(*c)) {
            Some(pos) => {
                let size = integer[pos + 1..].iter().filter(|c| is_placeholder(**c)).count();
                (Some(integer[pos]).filter(|_| size > 0), size)
            }
            None => (None, 0),
        };

        let decimal_char = match decimal_at {
            Some(pos) => core[pos],
            None if grouping_char == Some('.') => ',',
            None => '.',
        };

        Some(Self {
            prefix: chars[..first].iter().collect(),
            suffix: chars[last + 1..].iter().collect(),
            grouping_char,
            grouping_size,
            min_integer_digits: integer.iter().filter(|c| **c == '0').count(),
            min_fraction_digits: fraction.iter().filter(|c| **c == '0').count(),
            max_fraction_digits: fraction.iter().filter(|c| is_placeholder(**c)).count(),
            decimal_char,
        })
    }

    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }

        let precision = self.max_fraction_digits;
        let fixed = match Decimal::from_f64(value.abs()) {
            Some(d) => {
                let scale = u32::try_from(precision).unwrap_or(u32::MAX);
                let rounded = d.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
                format!("{:.precision$}", rounded)
            }
            None => format!("{:.precision$}", value.abs()),
        };

        let (int_digits, frac_digits) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

        let mut fraction = frac_digits.to_string();
        while fraction.len() > self.min_fraction_digits && fraction.ends_with('0') {
            fraction.pop();
        }

        let mut integer = int_digits.to_string();
        while integer.len() < self.min_integer_digits {
            integer.insert(0, '0');
        }

        let is_zero = integer.chars().chain(fraction.chars()).all(|c| c == '0');

        let mut out = String::new();
        if value < 0.0 && !is_zero {
            out.push('-');
        }
        out.push_str(&self.prefix);
        out.push_str(&self.group(&integer));
        if !fraction.is_empty() {
            out.push(self.decimal_char);
            out.push_str(&fraction);
        }
        out.push_str(&self.suffix);
        out
    }

    fn group(&self, digits: &str) -> String {
        let Some(sep) = self.grouping_char else {
            return digits.to_string();
        };
        let size = self.grouping_size;
        let len = digits.chars().count();
        let mut out = String::with_capacity(len + len / size.max(1));
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (len - i) % size == 0 {
                out.push(sep);
            }
            out.push(c);
        }
        out
    }
}

/// Renders `value` through `pattern`; patterns without placeholders fall
/// back to the plain float rendering.
pub fn format_number_with_pattern(value: f64, pattern: &str) -> String {
    match NumberPattern::parse(pattern) {
        Some(p) => p.format(value),
        None => value.to_string(),
    }
}
