use std::path::Path;

use anyhow::{Context, Result};
#[cfg(any(feature = "openvino", feature = "cuda"))]
use ort::ep::{self, ExecutionProvider};
use ort::session::{
    builder::{GraphOptimizationLevel, SessionBuilder},
    Session,
};

#[allow(unused_mut)]
pub fn session_builder() -> Result<SessionBuilder> {
    let mut builder =
        Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

    #[cfg(feature = "openvino")]
    {
        let ep = ep::OpenVINO::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("openvino feature is enabled, onnx runtime not compiled with openvino")
        }
    }

    #[cfg(feature = "cuda")]
    {
        let ep = ep::CUDA::default();
        if ep.is_available()? {
            ep.register(&mut builder)?;
        } else {
            log::warn!("cuda feature is enabled, onnx runtime not compiled with cuda")
        }
    }

    Ok(builder)
}

pub fn detector_session(model: &Path) -> Result<Session> {
    session_builder()?
        .commit_from_file(model)
        .with_context(|| format!("load detector model {}", model.display()))
}
