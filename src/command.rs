use std::fmt;

/// The closed set of commands both sides agree on.
///
/// Commands travel on the wire as camelCase strings; routing is done against
/// this enum so a command without a registration path is visible at the match
/// sites rather than silently falling through at runtime. Unknown wire
/// strings fail `parse` and take the no-handler path.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Command {
    /// Keep-alive notification, sent periodically by both sides.
    Heartbeat,
    /// Host-side periodic state-refresh cue.
    Sync,
    /// Surface announces it finished loading.
    Ready,
    /// Host pushes a new table model to the surface.
    UpdateTable,
    /// Host pushes freshly extracted theme variables.
    UpdateTheme,
    /// Surface requests the full table model.
    RequestTable,
    /// Surface requests a cell/row/column mutation.
    ApplyEdit,
    /// Surface requests the current theme.
    GetTheme,
    /// Surface requests a CSV/TSV rendition of the table.
    ExportTable,
}

impl Command {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::Sync => "sync",
            Self::Ready => "ready",
            Self::UpdateTable => "updateTable",
            Self::UpdateTheme => "updateTheme",
            Self::RequestTable => "requestTable",
            Self::ApplyEdit => "applyEdit",
            Self::GetTheme => "getTheme",
            Self::ExportTable => "exportTable",
        }
    }

    /// Case-sensitive reverse of `as_str`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "heartbeat" => Some(Self::Heartbeat),
            "sync" => Some(Self::Sync),
            "ready" => Some(Self::Ready),
            "updateTable" => Some(Self::UpdateTable),
            "updateTheme" => Some(Self::UpdateTheme),
            "requestTable" => Some(Self::RequestTable),
            "applyEdit" => Some(Self::ApplyEdit),
            "getTheme" => Some(Self::GetTheme),
            "exportTable" => Some(Self::ExportTable),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
