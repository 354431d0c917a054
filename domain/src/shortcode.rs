//! Shortcode generation strategies.

use crate::{Shortcode, ShortcodeGenerator};

/// Length of generated shortcodes.
pub const GENERATED_LEN: usize = 6;

/// URL-safe alphabet used for generated shortcodes: `A-Za-z0-9_-`.
pub const ALPHABET: [char; 64] = nanoid::alphabet::SAFE;

/// Random nanoid-backed generator. 64^6 possible codes keeps collisions
/// negligible at session scale; nothing prevents them structurally.
#[derive(Clone, Copy, Debug)]
pub struct NanoidGenerator {
    len: usize,
}

impl NanoidGenerator {
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Default for NanoidGenerator {
    fn default() -> Self {
        Self::new(GENERATED_LEN)
    }
}

impl ShortcodeGenerator for NanoidGenerator {
    fn generate(&self) -> Shortcode {
        Shortcode::new(nanoid::format(nanoid::rngs::default, &ALPHABET, self.len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_six_chars_from_alphabet() {
        let g = NanoidGenerator::default();
        for _ in 0..50 {
            let code = g.generate();
            assert_eq!(code.as_str().chars().count(), GENERATED_LEN);
            assert!(code.as_str().chars().all(|c| ALPHABET.contains(&c)));
        }
    }

    #[test]
    fn consecutive_codes_differ() {
        let g = NanoidGenerator::default();
        // 64^6 space; a collision here would point at a broken RNG.
        assert_ne!(g.generate(), g.generate());
    }

    #[test]
    fn custom_length() {
        let g = NanoidGenerator::new(10);
        assert_eq!(g.generate().as_str().len(), 10);
    }
}
