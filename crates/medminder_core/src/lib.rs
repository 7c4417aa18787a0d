pub mod chunk;
pub mod domain;
pub mod index;
pub mod intent;
pub mod ports;
pub mod schedule;

pub use domain::{
    AuthSession, DosePeriod, DueDose, DueReminder, DueReport, Medicine, Reminder, User,
    UserCredentials,
};
pub use index::{DocumentIndex, ScoredChunk};
pub use intent::VoiceCommand;
pub use ports::{
    DatabaseService, EmbeddingService, GuidanceService, PortError, PortResult,
    SpeechToTextService, TextToSpeechService,
};
