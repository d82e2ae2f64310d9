use std::path::PathBuf;

use thiserror::Error;

/// Failures a conversion run can surface. Every pipeline stage reports
/// through one of these; the orchestrator propagates them unchanged.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The import collaborator could not produce a scene.
    #[error("failed to read input file: {}, reason: {reason}", .path.display())]
    Import { path: PathBuf, reason: String },

    /// The requested format id matches neither the custom path nor the
    /// generic registry.
    #[error("invalid output format id: {0}")]
    UnknownFormat(String),

    /// The export collaborator failed to write the scene.
    #[error("failed to write output file: {}, reason: {reason}", .path.display())]
    Export { path: PathBuf, reason: String },

    /// An option failed validation before it reached the pipeline.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let error = ConvertError::Import {
            path: PathBuf::from("mesh.glb"),
            reason: String::from("not a glb"),
        };
        assert!(error.to_string().contains("mesh.glb"));
        assert!(error.to_string().contains("not a glb"));

        let error = ConvertError::UnknownFormat(String::from("voxels"));
        assert!(error.to_string().contains("voxels"));
    }
}
