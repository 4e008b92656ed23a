/// Terminal front end: decode a model file and summarize it
use std::io::{stderr, Read, Seek, Write};

use anyhow::Result;
use chunk3d_core::{DecodeReport, Scene, SceneDecoder};
use tracing::{debug, trace};

pub mod progress;
pub mod summary;

pub use progress::ProgressLine;
pub use summary::Summary;

/// What to show besides the entity list
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectOptions {
    pub progress: bool,
    pub list_materials: bool,
}

pub struct InspectApp {
    options: InspectOptions,
}

impl InspectApp {
    pub fn new(options: InspectOptions) -> Self {
        Self { options }
    }

    /// Decode `stream` and write the summary to `out`.
    pub fn run<R: Read + Seek, W: Write>(&self, stream: &mut R, out: &mut W) -> Result<()> {
        let (scene, report) = self.decode(stream)?;
        debug!("decoded {} records", report.records);

        Summary::new(&scene, &report).draw(out, self.options.list_materials)?;
        Ok(())
    }

    fn decode<R: Read + Seek>(&self, stream: &mut R) -> Result<(Scene, DecodeReport)> {
        if !self.options.progress {
            return Ok(SceneDecoder::new(stream)?.decode_with_report()?);
        }

        let mut line = ProgressLine::new(stderr());
        let result = {
            let mut observer = |percent: u8| {
                if let Err(e) = line.update(percent) {
                    trace!("progress line not drawn: {e}");
                }
            };
            SceneDecoder::new(stream)?
                .with_progress(&mut observer)
                .decode_with_report()
        };
        line.finish()?;
        Ok(result?)
    }
}
