// ── Counter parsing ──
//
// iptables renders packet/byte counters with K/M/G suffixes once they
// grow large ("2304K", "1.2M"). Collectors normalize those back into
// plain integers here.

use tracing::warn;

/// Parse a possibly-suffixed counter rendering into a count.
///
/// Accepts plain integers (with or without thousands separators),
/// decimal values with a `K`/`M`/`G` multiplier, and the `--` placeholder
/// iptables emits for absent counters. Unparseable input degrades to `0`
/// rather than failing the whole snapshot.
pub fn parse_scaled_count(raw: &str) -> u64 {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "--" {
        return 0;
    }

    let (digits, multiplier) = match cleaned.as_bytes().last() {
        Some(b'K' | b'k') => (&cleaned[..cleaned.len() - 1], 1_000_f64),
        Some(b'M' | b'm') => (&cleaned[..cleaned.len() - 1], 1_000_000_f64),
        Some(b'G' | b'g') => (&cleaned[..cleaned.len() - 1], 1_000_000_000_f64),
        _ => (cleaned.as_str(), 1_f64),
    };

    match digits.parse::<f64>() {
        Ok(value) if value >= 0.0 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let scaled = (value * multiplier).round() as u64;
            scaled
        }
        _ => {
            warn!(raw, "unparseable counter value, treating as zero");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integers_pass_through() {
        assert_eq!(parse_scaled_count("0"), 0);
        assert_eq!(parse_scaled_count("42"), 42);
        assert_eq!(parse_scaled_count("1,024"), 1024);
    }

    #[test]
    fn suffixes_scale() {
        assert_eq!(parse_scaled_count("2K"), 2_000);
        assert_eq!(parse_scaled_count("2.3K"), 2_300);
        assert_eq!(parse_scaled_count("1.5M"), 1_500_000);
        assert_eq!(parse_scaled_count("3g"), 3_000_000_000);
    }

    #[test]
    fn placeholders_and_garbage_become_zero() {
        assert_eq!(parse_scaled_count(""), 0);
        assert_eq!(parse_scaled_count("--"), 0);
        assert_eq!(parse_scaled_count("abc"), 0);
        assert_eq!(parse_scaled_count("-5"), 0);
    }
}
