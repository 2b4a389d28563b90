use crate::models::NodeCategory;
use thiserror::Error;

/// Fatal pipeline errors. None of these are retried: the run aborts before
/// any partial graph is handed to rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunnelError {
    #[error("no application data available from {origin}")]
    DataUnavailable { origin: String },

    #[error("cannot resolve table schema: {reason}")]
    Schema { reason: String },

    #[error("value {value:?} collides with a reserved node label")]
    UnclassifiedNode { value: String },

    #[error("no palette entry configured for category {category:?}")]
    UnresolvedColor { category: NodeCategory },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_the_offending_detail() {
        let err = FunnelError::UnclassifiedNode {
            value: "No reply".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "value \"No reply\" collides with a reserved node label"
        );

        let err = FunnelError::UnresolvedColor {
            category: NodeCategory::NoReply,
        };
        assert!(err.to_string().contains("NoReply"));
    }
}
