use std::io::Write;

use crate::{RenderPlan, Result};

/// Downstream consumer of a finished plan: the compositor that resamples the
/// crops and the encoder that muxes them with the audio live behind this.
pub trait RenderSink {
    fn submit(&mut self, plan: &RenderPlan) -> Result<()>;
}

/// Writes each submitted plan as pretty-printed JSON, one document per plan.
#[derive(Debug)]
pub struct JsonPlanSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonPlanSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> RenderSink for JsonPlanSink<W> {
    fn submit(&mut self, plan: &RenderPlan) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, plan)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        tracing::debug!(records = plan.records.len(), "render plan submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppConfig, Coordinator, FocusPoint, ImageSize, SceneDescriptor};

    #[test]
    fn writes_plans_as_json_documents() {
        let coordinator = Coordinator::new(AppConfig::default()).unwrap();
        let scenes = [SceneDescriptor::new(1, "stars", FocusPoint::new(0.5, 0.2, 2.0))];
        let plan = coordinator
            .plan(ImageSize::new(1600, 1200), &scenes, None)
            .unwrap();

        let mut bytes = Vec::new();
        JsonPlanSink::new(&mut bytes).submit(&plan).unwrap();

        let parsed: RenderPlan = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, plan);
        assert_eq!(bytes.last(), Some(&b'\n'));
    }
}
