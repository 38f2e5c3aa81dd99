//! Literal decoding: numeric suffixes and escape sequences.

use chai_ir::NumberLit;

/// Decode an integer literal with its optional suffix.
///
/// Without a suffix the literal takes the narrowest of `int`, `long`,
/// `unsigned_long` that holds it. `u` selects `unsigned` (or
/// `unsigned_long` when the value does not fit), `l`/`ll` selects `long`,
/// and `u` combined with `l` selects `unsigned_long`.
pub(crate) fn parse_int_literal(slice: &str) -> Option<NumberLit> {
    let digits_end = slice
        .char_indices()
        .rev()
        .take_while(|(_, c)| matches!(c, 'u' | 'U' | 'l' | 'L'))
        .last()
        .map_or(slice.len(), |(i, _)| i);
    let (digits, suffix) = slice.split_at(digits_end);

    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        u64::from_str_radix(bin, 2).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };

    let unsigned = suffix.contains(['u', 'U']);
    let longs = suffix.chars().filter(|c| matches!(c, 'l' | 'L')).count();
    if suffix.len() - longs > 1 || longs > 2 {
        return None;
    }

    Some(match (unsigned, longs) {
        (true, 0) => match u32::try_from(value) {
            Ok(v) => NumberLit::Unsigned(v),
            Err(_) => NumberLit::UnsignedLong(value),
        },
        (true, _) => NumberLit::UnsignedLong(value),
        (false, 0) => {
            if let Ok(v) = i32::try_from(value) {
                NumberLit::Int(v)
            } else if let Ok(v) = i64::try_from(value) {
                NumberLit::Long(v)
            } else {
                NumberLit::UnsignedLong(value)
            }
        }
        (false, _) => NumberLit::Long(i64::try_from(value).ok()?),
    })
}

/// Decode a floating-point literal. An `f` suffix selects `float`;
/// everything else is `double`.
pub(crate) fn parse_float_literal(slice: &str) -> Option<NumberLit> {
    match slice.as_bytes().last() {
        Some(b'f' | b'F') => {
            let value: f32 = slice[..slice.len() - 1].parse().ok()?;
            Some(NumberLit::float(value))
        }
        Some(b'l' | b'L') => {
            let value: f64 = slice[..slice.len() - 1].parse().ok()?;
            Some(NumberLit::double(value))
        }
        _ => Some(NumberLit::double(slice.parse().ok()?)),
    }
}

/// Process string escape sequences.
///
/// Unknown escapes are kept verbatim.
pub(crate) fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('0') => result.push('\0'),
            Some('$') => result.push('$'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

/// Process a char literal body (without quotes).
pub(crate) fn unescape_char(s: &str) -> char {
    let mut chars = s.chars();
    match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('0') => '\0',
            Some(c) => c,
            None => '\\',
        },
        Some(c) => c,
        None => '\0',
    }
}
