use std::fmt;

/// How a client run ended.
///
/// The engine never exits the process; the caller maps each outcome to an
/// exit status of its choosing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientOutcome {
    /// The conversation ended normally, from either side.
    Clean,
    /// Bad command-line or local input prevented a run.
    CommandLine,
    /// The server could not be reached, or the connection broke.
    ConnectionFailed,
    /// The server sent a message that does not parse.
    MalformedMessage,
    /// A datagram was never confirmed.
    DeliveryTimeout,
    /// A request got no reply in time.
    NoReply,
    /// The server sent a reply nobody asked for.
    UnexpectedReply,
}

impl ClientOutcome {
    pub fn is_success(self) -> bool {
        self == Self::Clean
    }
}

impl fmt::Display for ClientOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clean => "clean exit",
            Self::CommandLine => "command-line error",
            Self::ConnectionFailed => "server connection error",
            Self::MalformedMessage => "malformed message",
            Self::DeliveryTimeout => "delivery timeout",
            Self::NoReply => "no reply",
            Self::UnexpectedReply => "unexpected reply",
        })
    }
}
