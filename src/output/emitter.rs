//! Line-delimited message writer

use super::message::Message;
use crate::error::Result;
use crate::schema::JsonSchema;
use crate::state::State;
use crate::types::JsonValue;
use chrono::Utc;
use std::io::{BufWriter, Stdout, Write};

/// Writes Singer messages to any [`Write`] sink
///
/// Output is buffered and flushed after every state message, so a
/// checkpoint never reaches the reader ahead of the records it covers.
#[derive(Debug)]
pub struct Emitter<W: Write> {
    writer: W,
    records_written: u64,
    states_written: u64,
}

impl Emitter<BufWriter<Stdout>> {
    /// Emitter writing to stdout
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(std::io::stdout()))
    }
}

impl<W: Write> Emitter<W> {
    /// Create an emitter over a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records_written: 0,
            states_written: 0,
        }
    }

    /// Write any message as one line
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;

        match message {
            Message::Record { .. } => self.records_written += 1,
            Message::State { .. } => {
                self.states_written += 1;
                self.writer.flush()?;
            }
            Message::Schema { .. } => {}
        }
        Ok(())
    }

    /// Write the SCHEMA message of a stream
    pub fn write_schema(
        &mut self,
        stream: &str,
        schema: &JsonSchema,
        key_properties: &[String],
        bookmark_properties: &[String],
    ) -> Result<()> {
        self.write_message(&Message::schema(
            stream,
            schema.to_json(),
            key_properties.to_vec(),
            bookmark_properties.to_vec(),
        ))
    }

    /// Write a RECORD message stamped with the current time
    pub fn write_record(&mut self, stream: &str, record: JsonValue) -> Result<()> {
        self.write_message(&Message::record(stream, record, Utc::now()))
    }

    /// Write a STATE message and flush
    pub fn write_state(&mut self, state: &State) -> Result<()> {
        self.write_message(&Message::state(serde_json::to_value(state)?))
    }

    /// Flush buffered output
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of RECORD messages written
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Number of STATE messages written
    pub fn states_written(&self) -> u64 {
        self.states_written
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
