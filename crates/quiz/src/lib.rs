pub mod analytics;
pub mod candidates;
pub mod chords;
pub mod error;
pub mod round;
pub mod scoring;
pub mod session;
pub mod store;

pub use analytics::Statistics;
pub use candidates::CandidateSet;
pub use chords::{ChordDrill, ChordFeedback};
pub use error::QuizError;
pub use round::{generate_round, Round};
pub use scoring::{Feedback, ScoringEngine, Verdict};
pub use session::{advance_delay, PendingAdvance, Phase, QuizSession, SelectOutcome};
pub use store::{ConfigBackend, ConfigStore, FileBackend, MemoryBackend, CONFIG_KEY};
