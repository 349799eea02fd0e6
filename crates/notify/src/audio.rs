//! Active USB audio cards

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AudioCard {
    pub present: bool,
    /// Card belongs to a bundled (multi-function) device
    pub bundle: bool,
}

/// Fixed table of audio card slots
#[derive(Debug, Clone)]
pub struct AudioCards {
    cards: Vec<AudioCard>,
    max_len: usize,
}

impl AudioCards {
    pub fn new(slots: usize, max_len: usize) -> Self {
        Self {
            cards: vec![AudioCard::default(); slots],
            max_len,
        }
    }

    /// Update one slot; out of range indexes are ignored
    pub fn set(&mut self, index: usize, card: AudioCard) -> bool {
        match self.cards.get_mut(index) {
            Some(slot) => {
                *slot = card;
                true
            }
            None => {
                warn!("audio card index {} out of range", index);
                false
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<AudioCard> {
        self.cards.get(index).copied()
    }

    /// `<card0><*card2>` list of present cards, bounded by `max_len`
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, card) in self.cards.iter().enumerate() {
            if !card.present {
                continue;
            }
            let entry = format!("<{}card{}>", if card.bundle { "*" } else { "" }, i);
            if out.len() + entry.len() >= self.max_len {
                warn!("cards string overflow at card {}", i);
                break;
            }
            out.push_str(&entry);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let mut cards = AudioCards::new(4, 256);
        assert_eq!(cards.render(), "");
        cards.set(0, AudioCard { present: true, bundle: false });
        cards.set(2, AudioCard { present: true, bundle: true });
        assert_eq!(cards.render(), "<card0><*card2>");
        assert!(!cards.set(4, AudioCard::default()));
    }

    #[test]
    fn test_render_truncates() {
        let mut cards = AudioCards::new(3, 15);
        for i in 0..3 {
            cards.set(i, AudioCard { present: true, bundle: false });
        }
        assert_eq!(cards.render(), "<card0><card1>");
    }
}
