use std::borrow::Cow;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

const EMOJI_REGEX_SIZE_LIMIT: usize = 1 << 27;
const VARIATION_SELECTOR_16: char = '\u{FE0F}';

/// Components that are emoji on their own but are not listed as standalone
/// entries: skin-tone modifiers, hair styles and regional indicators.
const COMPONENT_RANGES: [(char, char); 3] = [
    ('\u{1F3FB}', '\u{1F3FF}'),
    ('\u{1F9B0}', '\u{1F9B3}'),
    ('\u{1F1E6}', '\u{1F1FF}'),
];

/// Removes every known emoji sequence from free text.
///
/// The alternation is ordered longest sequence first so that ZWJ families,
/// flags and skin-tone variants are removed whole instead of leaving stray
/// modifiers behind.
#[derive(Debug, Clone)]
pub struct EmojiStripper {
    pattern: Regex,
}

impl EmojiStripper {
    pub fn new() -> Result<Self> {
        let mut sequences = Vec::<String>::new();
        for emoji in emojis::iter() {
            push_with_unqualified(&mut sequences, emoji.as_str());
            if let Some(tones) = emoji.skin_tones() {
                for toned in tones {
                    push_with_unqualified(&mut sequences, toned.as_str());
                }
            }
        }
        for (first, last) in COMPONENT_RANGES {
            sequences.extend((first..=last).map(String::from));
        }

        sequences.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        sequences.dedup();

        let alternation = sequences
            .iter()
            .map(|sequence| regex::escape(sequence))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&format!("(?:{alternation})"))
            .size_limit(EMOJI_REGEX_SIZE_LIMIT)
            .dfa_size_limit(EMOJI_REGEX_SIZE_LIMIT)
            .build()
            .context("failed to compile emoji regex")?;

        Ok(Self { pattern })
    }

    /// Strips until nothing matches, so `strip(strip(s)) == strip(s)` holds even
    /// when removing one sequence joins the pieces of another.
    pub fn strip(&self, input: &str) -> String {
        let mut current = input.to_string();
        loop {
            let stripped = match self.pattern.replace_all(&current, "") {
                Cow::Borrowed(_) => None,
                Cow::Owned(stripped) => Some(stripped),
            };
            match stripped {
                Some(stripped) => current = stripped,
                None => return current,
            }
        }
    }
}

fn push_with_unqualified(sequences: &mut Vec<String>, sequence: &str) {
    sequences.push(sequence.to_string());
    if sequence.contains(VARIATION_SELECTOR_16) {
        let unqualified: String = sequence
            .chars()
            .filter(|ch| *ch != VARIATION_SELECTOR_16)
            .collect();
        if !unqualified.is_empty() {
            sequences.push(unqualified);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EmojiStripper;

    fn is_emoji_code_point(ch: char) -> bool {
        matches!(
            u32::from(ch),
            0x1F000..=0x1FAFF | 0x2600..=0x27BF | 0x2B00..=0x2BFF | 0xE0020..=0xE007F
        )
    }

    #[test]
    fn strip_removes_standalone_components() {
        let stripper = EmojiStripper::new().expect("emoji regex should compile");

        assert_eq!(stripper.strip("a🏽b"), "ab");
        assert_eq!(stripper.strip("x🇦y"), "xy");
        assert_eq!(stripper.strip("🇺🇸🇦"), "");
        assert_eq!(stripper.strip("1️⃣z"), "z");
    }

    #[test]
    fn strip_removes_simple_and_compound_emoji() {
        let stripper = EmojiStripper::new().expect("emoji regex should compile");

        assert_eq!(stripper.strip("Acme 🌱 Labs"), "Acme  Labs");
        assert_eq!(stripper.strip("👩‍👩‍👧‍👦family"), "family");
        assert_eq!(stripper.strip("🇺🇸flag"), "flag");
        assert_eq!(stripper.strip("👍🏽 ok"), " ok");
    }

    #[test]
    fn strip_leaves_plain_text_untouched() {
        let stripper = EmojiStripper::new().expect("emoji regex should compile");

        assert_eq!(stripper.strip("Food & Ag."), "Food & Ag.");
        assert_eq!(stripper.strip("Blockchain (L1, L2)"), "Blockchain (L1, L2)");
        assert_eq!(stripper.strip("café — naïve"), "café — naïve");
        assert_eq!(stripper.strip(""), "");
    }

    #[test]
    fn strip_is_idempotent_and_leaves_no_emoji() {
        let stripper = EmojiStripper::new().expect("emoji regex should compile");

        for input in [
            "🌍🌎🌏 regen",
            "❤️ community ❤",
            "🧑🏿‍🌾 farmer 🐝🐝",
            "no emoji here",
            "🏳️‍🌈🏴‍☠️",
            "a🏽b",
            "x🇦y",
            "🦰 hair",
        ] {
            let once = stripper.strip(input);
            let twice = stripper.strip(&once);
            assert_eq!(once, twice, "stripping should be idempotent for {input:?}");
            assert!(
                !once.chars().any(is_emoji_code_point),
                "emoji left in {once:?}"
            );
        }
    }
}
