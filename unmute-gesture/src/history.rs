use heapless::Deque;
use unmute_shared::{Letter, TranslationEvent};

/// Maximum number of events kept in a [`TranslationHistory`]
pub const HISTORY_CAPACITY: usize = 10;

/// Most recent distinct translation events, oldest first.
///
/// An event whose letter equals the current last letter is suppressed, and
/// once the history is full the oldest event is evicted.
#[derive(Debug, Clone)]
pub struct TranslationHistory {
    events: Deque<TranslationEvent, HISTORY_CAPACITY>,
}

impl TranslationHistory {
    pub fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    /// Returns `true` if the event was appended
    pub fn push(&mut self, event: TranslationEvent) -> bool {
        if self.last_letter() == Some(event.letter) {
            return false;
        }

        if self.events.is_full() {
            self.events.pop_front();
        }
        self.events.push_back(event).is_ok()
    }

    pub fn last(&self) -> Option<&TranslationEvent> {
        self.events.back()
    }

    pub fn last_letter(&self) -> Option<Letter> {
        self.last().map(|event| event.letter)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranslationEvent> {
        self.events.iter()
    }

    pub fn letters(&self) -> impl Iterator<Item = Letter> + '_ {
        self.events.iter().map(|event| event.letter)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for TranslationHistory {
    fn default() -> Self {
        Self::new()
    }
}
