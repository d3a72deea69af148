//! Process exit statuses.

use std::process::ExitCode;

use chatline::ClientOutcome;

/// Exit status for a finished session.
///
/// | outcome           | status |
/// |-------------------|--------|
/// | clean             | 0      |
/// | command line      | 11     |
/// | connection failed | 21     |
/// | malformed message | 31     |
/// | delivery timeout  | 32     |
/// | no reply          | 33     |
/// | unexpected reply  | 34     |
pub fn status(outcome: ClientOutcome) -> u8 {
    match outcome {
        ClientOutcome::Clean => 0,
        ClientOutcome::CommandLine => 11,
        ClientOutcome::ConnectionFailed => 21,
        ClientOutcome::MalformedMessage => 31,
        ClientOutcome::DeliveryTimeout => 32,
        ClientOutcome::NoReply => 33,
        ClientOutcome::UnexpectedReply => 34,
    }
}

pub fn exit_code(outcome: ClientOutcome) -> ExitCode {
    ExitCode::from(status(outcome))
}
