use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Connection state of the external messaging client.
pub enum ClientState {
    /// No `initialize` has been issued yet, or the client was destroyed.
    #[default]
    Uninitialized,
    /// `initialize` was issued; waiting for the client's `ready` event.
    Initializing,
    /// Paired and connected; sends are accepted.
    Ready,
    /// The client reported a disconnect; recovery is in progress.
    Disconnected,
}

impl ClientState {
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
