use log::trace;
use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};

pub const DEFAULT_MESSAGES: [&str; 6] = [
    "Nice! 🎯",
    "Well done! 👏",
    "Excellent! ⭐",
    "Perfect! 🌟",
    "Amazing! 🎉",
    "Sensational! 🏆",
];

/// Picks the message shown when an object is found. Uniform choice, repeats allowed.
#[derive(Debug, Clone)]
pub struct Celebration {
    messages: Vec<String>,
    rng: StdRng,
    seed: u64,
}

impl Celebration {
    pub fn seeded(seed: u64) -> Self {
        Self::with_messages(DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect(), seed)
    }

    /// Unpredictable seed; [`Celebration::seed`] reports it so a run can be replayed.
    pub fn from_entropy(messages: Vec<String>) -> Self {
        Self::with_messages(messages, rand::random())
    }

    /// Falls back to the default set when `messages` is empty.
    pub fn with_messages(messages: Vec<String>, seed: u64) -> Self {
        let messages = if messages.is_empty() {
            DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect()
        } else {
            messages
        };
        trace!(target: "session", "Celebration seed: {}", seed);
        Self {
            messages,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn pick(&mut self) -> String {
        self.messages
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }
}
