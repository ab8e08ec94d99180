//! ISBN-13 codec: canonical form, check digits, validity.
//!
//! Pure functions over candidate strings. Malformed input yields
//! `None`/`false`, never an error.

use regex::Regex;
use std::sync::OnceLock;

fn isbn13_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{13}$").expect("isbn13 pattern must compile"))
}

/// Strip ASCII hyphens and spaces; keep the result iff exactly 13 digits remain.
pub fn canonicalize(raw: &str) -> Option<String> {
    let mut digits = String::with_capacity(13);
    for ch in raw.chars() {
        if ch == '-' || ch == ' ' {
            continue;
        }
        digits.push(ch);
    }
    if isbn13_re().is_match(&digits) {
        Some(digits)
    } else {
        None
    }
}

/// Whether `candidate` canonicalizes to 13 ASCII digits.
pub fn is_well_formed(candidate: &str) -> bool {
    canonicalize(candidate).is_some()
}

/// Check digit for a 12-digit stem.
///
/// Weighted sum with weights alternating 1,3,1,3,... over the stem,
/// then `(10 - sum % 10) % 10`. Returns `None` unless the stem is
/// exactly 12 ASCII digits.
pub fn check_digit(first12: &str) -> Option<u8> {
    if first12.len() != 12 || !first12.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sum: u32 = first12
        .bytes()
        .enumerate()
        .map(|(position, byte)| {
            let digit = u32::from(byte - b'0');
            if position % 2 == 0 { digit } else { digit * 3 }
        })
        .sum();
    Some(((10 - sum % 10) % 10) as u8)
}

/// Format and checksum validity of one candidate (hyphenated or canonical).
pub fn is_valid(candidate: &str) -> bool {
    let Some(canonical) = canonicalize(candidate) else {
        return false;
    };
    let (stem, check) = canonical.split_at(12);
    match check_digit(stem) {
        Some(expected) => check.as_bytes()[0] - b'0' == expected,
        None => false,
    }
}

/// Append the computed check digit to a 12-digit stem.
pub fn complete(stem: &str) -> Option<String> {
    let check = check_digit(stem)?;
    Some(format!("{stem}{check}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_hyphens_and_spaces() {
        assert_eq!(
            canonicalize("978-0-306-40615-7"),
            Some("9780306406157".to_string())
        );
        assert_eq!(
            canonicalize("978 0306 40615 7"),
            Some("9780306406157".to_string())
        );
    }

    #[test]
    fn canonicalize_rejects_wrong_length_and_non_digits() {
        assert_eq!(canonicalize("97803064061"), None);
        assert_eq!(canonicalize("97803064061577"), None);
        assert_eq!(canonicalize("978030640615X"), None);
        assert_eq!(canonicalize(""), None);
    }

    #[test]
    fn check_digit_matches_known_identifiers() {
        // 978-0-306-40615-7 is the canonical worked example for ISBN-13.
        assert_eq!(check_digit("978030640615"), Some(7));
        assert_eq!(check_digit("978123456100"), Some(0));
        assert_eq!(check_digit("978123456101"), Some(7));
        assert_eq!(check_digit("978123456102"), Some(4));
    }

    #[test]
    fn check_digit_rejects_malformed_stems() {
        assert_eq!(check_digit("97803064061"), None);
        assert_eq!(check_digit("9780306406157"), None);
        assert_eq!(check_digit("97803064061x"), None);
    }

    #[test]
    fn is_valid_accepts_correct_and_rejects_wrong_check_digit() {
        assert!(is_valid("9780306406157"));
        assert!(is_valid("978-0-306-40615-7"));
        for wrong in [0u8, 1, 2, 3, 4, 5, 6, 8, 9] {
            assert!(!is_valid(&format!("978030640615{wrong}")));
        }
    }

    #[test]
    fn complete_round_trips_through_is_valid() {
        let isbn = complete("978123456100").expect("stem should complete");
        assert_eq!(isbn, "9781234561000");
        assert!(is_valid(&isbn));
    }

    #[test]
    fn checksum_rule_holds_over_generated_stems() {
        // Deterministic sweep: a fixed linear congruential sequence stands in
        // for random 12-digit stems so the property is reproducible.
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let stem = format!("{:012}", state % 1_000_000_000_000);
            let check = check_digit(&stem).expect("generated stem must be 12 digits");
            for digit in 0..=9u8 {
                let candidate = format!("{stem}{digit}");
                assert_eq!(is_valid(&candidate), digit == check, "stem {stem}");
            }
        }
    }
}
