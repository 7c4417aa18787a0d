//! crates/medminder_core/src/intent.rs
//!
//! Turns a speech transcript into a structured voice command.
//!
//! Matching is deliberately forgiving: transcripts are lowercased and probed
//! for key phrases, so "list my medicines" and "What are my medicines?" land
//! on the same command. Anything that does not match becomes `Unrecognized`
//! so the caller can ask the user to repeat themselves.

use chrono::NaiveTime;

/// A structured command extracted from a voice transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceCommand {
    /// "What are my medicines?" / "list my medications"
    ListMedicines,
    /// "Is any medicine due?" / "check my schedule"
    CheckDue,
    /// "Remind me to take aspirin at 8:30 pm"
    AddReminder { medicine: String, time: NaiveTime },
    /// The transcript did not match any known command.
    Unrecognized,
}

/// Parses a transcript into a [`VoiceCommand`].
pub fn parse_command(transcript: &str) -> VoiceCommand {
    let lowered = transcript.to_lowercase();

    if let Some(command) = parse_add_reminder(&lowered) {
        return command;
    }

    if (lowered.contains("list") || lowered.contains("what are"))
        && (lowered.contains("medicine") || lowered.contains("medication"))
    {
        return VoiceCommand::ListMedicines;
    }

    if lowered.contains("check")
        || lowered.contains("due")
        || lowered.contains("do i need to take")
    {
        return VoiceCommand::CheckDue;
    }

    VoiceCommand::Unrecognized
}

fn parse_add_reminder(lowered: &str) -> Option<VoiceCommand> {
    let trigger = ["remind me to take ", "set a reminder for ", "set reminder for "]
        .iter()
        .find_map(|t| lowered.split_once(t).map(|(_, rest)| rest))?;

    let (medicine, time_part) = trigger.split_once(" at ")?;
    let medicine = medicine.trim();
    if medicine.is_empty() {
        return None;
    }

    let time = parse_spoken_time(time_part)?;
    Some(VoiceCommand::AddReminder {
        medicine: medicine.to_string(),
        time,
    })
}

/// Parses times the way people say them: "8:30 pm", "20:30", "8 pm", "8".
fn parse_spoken_time(raw: &str) -> Option<NaiveTime> {
    let cleaned = raw
        .trim()
        .trim_end_matches('.')
        .replace("p.m", "pm")
        .replace("a.m", "am");
    let cleaned = cleaned.trim();

    const FORMATS: &[&str] = &["%I:%M %p", "%I:%M%p", "%H:%M", "%I %p", "%I%p", "%H"];
    FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(cleaned, f).ok())
}
