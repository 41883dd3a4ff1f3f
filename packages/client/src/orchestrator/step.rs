use std::fmt;

/// Lifecycle states, visited strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Init,
    OpenSocket1,
    ConfigureTls1,
    Connect1,
    HandshakeDone1,
    SendHello1,
    Read1,
    Close1,
    OpenSocket2,
    ConfigureTls2,
    Connect2WithEarlyData,
    Read2,
    Close2,
    Shutdown,
}

impl Step {
    pub const SEQUENCE: [Step; 14] = [
        Step::Init,
        Step::OpenSocket1,
        Step::ConfigureTls1,
        Step::Connect1,
        Step::HandshakeDone1,
        Step::SendHello1,
        Step::Read1,
        Step::Close1,
        Step::OpenSocket2,
        Step::ConfigureTls2,
        Step::Connect2WithEarlyData,
        Step::Read2,
        Step::Close2,
        Step::Shutdown,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Init => "INIT",
            Step::OpenSocket1 => "OPEN_SOCKET_1",
            Step::ConfigureTls1 => "CONFIGURE_TLS_1",
            Step::Connect1 => "CONNECT_1",
            Step::HandshakeDone1 => "HANDSHAKE_DONE_1",
            Step::SendHello1 => "SEND_HELLO_1",
            Step::Read1 => "READ_1",
            Step::Close1 => "CLOSE_1",
            Step::OpenSocket2 => "OPEN_SOCKET_2",
            Step::ConfigureTls2 => "CONFIGURE_TLS_2",
            Step::Connect2WithEarlyData => "CONNECT_2_WITH_EARLY_DATA",
            Step::Read2 => "READ_2",
            Step::Close2 => "CLOSE_2",
            Step::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Steps owned by one of the two phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Full handshake, then the hello exchange
    Full,
    /// Early data straight after connect
    EarlyData,
}

impl Phase {
    pub(crate) fn open_step(self) -> Step {
        match self {
            Phase::Full => Step::OpenSocket1,
            Phase::EarlyData => Step::OpenSocket2,
        }
    }

    pub(crate) fn configure_step(self) -> Step {
        match self {
            Phase::Full => Step::ConfigureTls1,
            Phase::EarlyData => Step::ConfigureTls2,
        }
    }

    pub(crate) fn close_step(self) -> Step {
        match self {
            Phase::Full => Step::Close1,
            Phase::EarlyData => Step::Close2,
        }
    }
}
