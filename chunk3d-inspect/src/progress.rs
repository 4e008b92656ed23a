/// Single-line terminal progress indicator driven by decoder progress events
use std::io::{self, Write};

use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
    QueueableCommand,
};

const BAR_WIDTH: usize = 30;

pub struct ProgressLine<W: Write> {
    writer: W,
    last: Option<u8>,
}

impl<W: Write> ProgressLine<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last: None }
    }

    /// Redraw if the percentage changed since the last event.
    pub fn update(&mut self, percent: u8) -> io::Result<()> {
        if self.last == Some(percent) {
            return Ok(());
        }
        self.last = Some(percent);

        let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
        let bar = format!(
            "[{}{}] {:>3}%",
            "#".repeat(filled),
            ".".repeat(BAR_WIDTH - filled),
            percent
        );

        self.writer.queue(cursor::MoveToColumn(0))?;
        self.writer.queue(Clear(ClearType::CurrentLine))?;
        self.writer.queue(SetForegroundColor(Color::Cyan))?;
        self.writer.queue(Print(bar))?;
        self.writer.queue(ResetColor)?;
        self.writer.flush()
    }

    /// Erase the line so later output starts clean.
    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.queue(cursor::MoveToColumn(0))?;
        self.writer.queue(Clear(ClearType::CurrentLine))?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
