//! Wire protocol line definitions
//!
//! The protocol is plain UTF-8 text, one message per `\n`-terminated
//! line. `ServerMessage` enumerates every line the server can emit; the
//! `Display` impl produces the exact wire text (without the terminator,
//! which [`crate::session::Session::send`] appends).

use std::fmt;

use crate::types::Username;

/// Server → Client protocol line
#[derive(Debug, Clone)]
pub enum ServerMessage {
    /// Sent once on connect, before username negotiation
    UsernamePrompt,
    /// Greets a newly admitted member
    Welcome { username: Username },
    /// Current membership as seen by a newly admitted member
    Roster { usernames: Vec<Username> },
    /// A new member entered the room (sent to everyone else)
    Joined { username: Username },
    /// A member left the room (sent to the remainder)
    Disconnected { username: Username },
    /// Chat text relayed to every member except the sender
    Chat { from: Username, text: String },
    /// Rejection line for a syntactically invalid username
    InvalidUsername,
    /// Rejection line for a name already held by a member
    UsernameTaken,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsernamePrompt => write!(f, "Please enter your username..."),
            Self::Welcome { username } => {
                write!(f, "* Welcome to the chat room {username}!")
            }
            Self::Roster { usernames } => {
                if usernames.is_empty() {
                    write!(f, "* The room is currently empty")
                } else {
                    let names: Vec<&str> = usernames.iter().map(Username::as_str).collect();
                    write!(f, "* The room contains: {}", names.join(", "))
                }
            }
            Self::Joined { username } => write!(f, "* {username} just joined!"),
            Self::Disconnected { username } => write!(f, "* {username} just disconnected!"),
            Self::Chat { from, text } => write!(f, "[{from}] {text}"),
            Self::InvalidUsername => write!(f, "Invalid username"),
            Self::UsernameTaken => write!(f, "Username is already taken"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Username {
        Username::parse(s).unwrap()
    }

    #[test]
    fn test_prompt_line() {
        assert_eq!(
            ServerMessage::UsernamePrompt.to_string(),
            "Please enter your username..."
        );
    }

    #[test]
    fn test_welcome_line() {
        let msg = ServerMessage::Welcome { username: name("alice") };
        assert_eq!(msg.to_string(), "* Welcome to the chat room alice!");
    }

    #[test]
    fn test_roster_empty() {
        let msg = ServerMessage::Roster { usernames: vec![] };
        assert_eq!(msg.to_string(), "* The room is currently empty");
    }

    #[test]
    fn test_roster_names() {
        let msg = ServerMessage::Roster {
            usernames: vec![name("alice"), name("bob")],
        };
        assert_eq!(msg.to_string(), "* The room contains: alice, bob");
    }

    #[test]
    fn test_join_and_leave_notices() {
        let joined = ServerMessage::Joined { username: name("bob") };
        assert_eq!(joined.to_string(), "* bob just joined!");

        let left = ServerMessage::Disconnected { username: name("bob") };
        assert_eq!(left.to_string(), "* bob just disconnected!");
    }

    #[test]
    fn test_chat_line() {
        let msg = ServerMessage::Chat {
            from: name("alice"),
            text: "hello".to_string(),
        };
        assert_eq!(msg.to_string(), "[alice] hello");
    }

    #[test]
    fn test_rejection_lines() {
        assert_eq!(ServerMessage::InvalidUsername.to_string(), "Invalid username");
        assert_eq!(
            ServerMessage::UsernameTaken.to_string(),
            "Username is already taken"
        );
    }
}
