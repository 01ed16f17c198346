use crate::layout::LayoutError;

/// Failure talking to the persistence gateway.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("gateway returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid gateway response: {0}")]
    Decode(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    SavePosition,
    CreateRelationship,
    DeleteRelationship,
}

impl std::fmt::Display for WriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::SavePosition => "save table position",
            Self::CreateRelationship => "create relationship",
            Self::DeleteRelationship => "delete relationship",
        })
    }
}

/// Everything the editor reports to the user. None of these are fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditorError {
    #[error("failed to load diagram: {0}")]
    LoadFailure(#[source] GatewayError),
    #[error("failed to {op}: {source}")]
    WriteFailure {
        op: WriteOp,
        #[source]
        source: GatewayError,
    },
    #[error("invalid relationship target: {0}")]
    InvalidRelationshipTarget(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl EditorError {
    pub fn write(op: WriteOp, source: GatewayError) -> Self {
        Self::WriteFailure { op, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_failure_message() {
        let err = EditorError::write(
            WriteOp::SavePosition,
            GatewayError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "failed to save table position: gateway returned status 500: boom"
        );
    }

    #[test]
    fn test_layout_error_is_transparent() {
        let err: EditorError = LayoutError::UnknownTable("ghost".to_string()).into();
        assert_eq!(err.to_string(), "unknown table: ghost");
    }
}
