//! Status record output

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::{Writer, WriterBuilder};
use std::io::{self, Write};

// Internal imports
use arm_if::status::{fields::Field, ArmStatus};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Writes the selected fields of each status as one output record.
pub struct StatusWriter<W: Write> {
    fields: Vec<Field>,

    sink: Sink<W>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

enum Sink<W: Write> {
    Csv(Writer<W>),
    Binary(W),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<W: Write> StatusWriter<W> {
    /// Write one CSV line per status.
    pub fn csv(fields: Vec<Field>, writer: W) -> Self {
        let w = WriterBuilder::new().has_headers(false).from_writer(writer);

        Self {
            fields,
            sink: Sink::Csv(w),
        }
    }

    /// Write the binary form of each field, back to back.
    pub fn binary(fields: Vec<Field>, writer: W) -> Self {
        Self {
            fields,
            sink: Sink::Binary(writer),
        }
    }

    /// Write a status and flush it to the underlying writer.
    pub fn write(&mut self, status: &ArmStatus) -> io::Result<()> {
        match &mut self.sink {
            Sink::Csv(w) => {
                w.write_record(self.fields.iter().map(|f| f.value(status).to_string()))?;
                w.flush()
            }
            Sink::Binary(w) => {
                for field in self.fields.iter() {
                    field.value(status).write_binary(w)?;
                }
                w.flush()
            }
        }
    }
}
