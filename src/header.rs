//! Provenance records written by the mosaickers

/// Where the mosaickers write their provenance. Nothing reads it back.
pub trait HeaderSink {
    fn insert_history(&mut self, text: &str);

    fn insert_comment(&mut self, text: &str);

    fn add_value(&mut self, key: &str, value: &str, comment: &str);
}

#[derive(Clone, Debug, PartialEq)]
pub enum Card {
    History(String),
    Comment(String),
    Value {
        key: String,
        value: String,
        comment: String,
    },
}

/// In-memory list of header cards
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.cards.iter().filter_map(|card| match card {
            Card::History(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.cards.iter().filter_map(|card| match card {
            Card::Comment(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.cards.iter().find_map(|card| match card {
            Card::Value { key: k, value, .. } if k.eq_ignore_ascii_case(key) => Some(value.as_str()),
            _ => None,
        })
    }
}

impl HeaderSink for Header {
    fn insert_history(&mut self, text: &str) {
        self.cards.push(Card::History(text.to_string()));
    }

    fn insert_comment(&mut self, text: &str) {
        self.cards.push(Card::Comment(text.to_string()));
    }

    /// A key already present is overwritten in place
    fn add_value(&mut self, key: &str, value: &str, comment: &str) {
        let card = Card::Value {
            key: key.to_ascii_uppercase(),
            value: value.to_string(),
            comment: comment.to_string(),
        };
        let existing = self
            .cards
            .iter()
            .position(|c| matches!(c, Card::Value { key: k, .. } if k.eq_ignore_ascii_case(key)));

        match existing {
            Some(i) => self.cards[i] = card,
            None => self.cards.push(card),
        }
    }
}
