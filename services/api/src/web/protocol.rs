//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the
//! API server for the reminder watcher.

use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts the periodic due-medicine check for this connection.
    StartWatch,

    /// Stops the periodic check. The connection stays open, so the watch can
    /// be started again.
    StopWatch,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================
// NOTE: When a reminder is due, the spoken announcement is sent as a raw
// Binary frame following the `ReminderDue` message.
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the periodic check has started.
    WatchStarted,

    /// Confirms the periodic check has stopped.
    WatchStopped,

    /// Something is due. `message` is the human-readable announcement.
    ReminderDue { checked_at: String, message: String },

    /// A check ran and nothing was due.
    NothingDue { checked_at: String },

    /// Reports a fatal error to the client, which should display an error message.
    /// Also sent when a periodic check fails and the watch task stops.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_frame_carries_tag_and_message() {
        let msg = ServerMessage::Error {
            message: "Reminder check failed; the watch has stopped.".to_string(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(
            json["message"],
            "Reminder check failed; the watch has stopped."
        );
    }

    #[test]
    fn client_messages_parse_from_snake_case_tags() {
        let start: ClientMessage = serde_json::from_str(r#"{"type":"start_watch"}"#).unwrap();
        assert!(matches!(start, ClientMessage::StartWatch));
        let stop: ClientMessage = serde_json::from_str(r#"{"type":"stop_watch"}"#).unwrap();
        assert!(matches!(stop, ClientMessage::StopWatch));
    }
}
