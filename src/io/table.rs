use std::error;
use std::fmt;
use std::fs;
use std::io;
use std::num;
use std::path::Path;
use std::convert::AsRef;
use std::result;

use csv;

use constants::*;
use table::{Row, Table};

/// A prediction table reader.
pub struct Reader<R: io::Read> {
    inner: csv::Reader<R>,
}

impl Reader<fs::File> {
    /// Read from a given file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::File::open(path)?;
        Ok(Reader::new(file))
    }
}

impl<R: io::Read> Reader<R> {
    /// Read from a given reader.
    pub fn new(reader: R) -> Self {
        Reader {
            inner: csv::ReaderBuilder::new()
                .delimiter(b',')
                .comment(Some(b'#'))
                .has_headers(true)
                .trim(csv::Trim::All)
                .from_reader(reader),
        }
    }

    /// Check that the header names the expected columns in the expected order.
    pub fn check_header(&mut self) -> Result<()> {
        let header = self.inner.headers()?;
        for (i, &name) in HEADER.iter().enumerate() {
            match header.get(i) {
                Some(x) if x == name => {},
                _ => return Err(Error::MissingField(name.to_owned())),
            }
        }
        Ok(())
    }

    /// Iterate over records.
    pub fn records(&mut self) -> Records<R> {
        Records { inner: self.inner.records() }
    }
}

pub struct Records<'r, R: 'r + io::Read> {
    inner: csv::StringRecordsIter<'r, R>,
}

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Csv(csv::Error),
    MissingField(String),
    ParseInt(String, num::ParseIntError),
    ParseFloat(String, num::ParseFloatError),
    InvalidRow(u64, String),
}

pub type Result<T> = result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Error {
        Error::Csv(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => write!(f, "{}", err),
            Error::Csv(ref err) => write!(f, "{}", err),
            Error::MissingField(ref name) => write!(f, "missing column '{}'", name),
            Error::ParseInt(ref name, ref err) => write!(f, "column '{}': {}", name, err),
            Error::ParseFloat(ref name, ref err) => write!(f, "column '{}': {}", name, err),
            Error::InvalidRow(line, ref why) => write!(f, "line {}: {}", line, why),
        }
    }
}

impl error::Error for Error {}

fn field<'a>(record: &'a csv::StringRecord, i: usize) -> Result<&'a str> {
    record.get(i).ok_or(Error::MissingField(HEADER[i].to_owned()))
}

fn parse_u32(record: &csv::StringRecord, i: usize) -> Result<u32> {
    field(record, i)?.parse::<u32>().map_err(|e| Error::ParseInt(HEADER[i].to_owned(), e))
}

fn parse_f64(record: &csv::StringRecord, i: usize) -> Result<f64> {
    field(record, i)?.parse::<f64>().map_err(|e| Error::ParseFloat(HEADER[i].to_owned(), e))
}

/// Parse one CSV record into a row.
/// An empty or NA screening field means the screening requirement is undefined.
fn parse_row(record: &csv::StringRecord) -> Result<Row> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);

    let label = field(record, 1)?.to_owned();
    let row = Row {
        cycles: parse_u32(record, 0)?,
        frequency: parse_f64(record, 1)?,
        label: label,
        replacements: parse_u32(record, 2)?,
        prevalence: parse_f64(record, 3)?,
        screened_colonies: match field(record, 4) {
            Ok("") | Ok(NA) | Err(_) => None,
            Ok(_) => Some(parse_f64(record, 4)?),
        },
    };

    if !(row.frequency >= 0.0 && row.frequency <= 1.0) {
        return Err(Error::InvalidRow(line, format!("replacement frequency {} is not in [0, 1]", row.frequency)));
    }
    if !(row.prevalence >= 0.0 && row.prevalence <= 1.0) {
        return Err(Error::InvalidRow(line, format!("prevalence {} is not in [0, 1]", row.prevalence)));
    }
    if let Some(s) = row.screened_colonies {
        if !(s >= 1.0) {
            return Err(Error::InvalidRow(line, format!("screened colonies {} is below 1", s)));
        }
    }

    Ok(row)
}

impl<'r, R: io::Read> Iterator for Records<'r, R> {
    type Item = Result<Row>;

    /// Get next record.
    /// Stop reading as soon as a problematic record is encountered.
    fn next(&mut self) -> Option<Result<Row>> {
        self.inner.next()
            .map(|res| {
                match res {
                    Err(err) => Err(Error::Csv(err)),
                    Ok(record) => parse_row(&record),
                }
            })
    }
}

/// A prediction table writer.
pub struct Writer<W: io::Write> {
    inner: csv::Writer<W>,
}

impl Writer<fs::File> {
    /// Write to a given file path.
    pub fn to_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::File::create(path)?;
        Ok(Writer::new(file))
    }
}

impl<W: io::Write> Writer<W> {
    pub fn new(writer: W) -> Self {
        Writer {
            inner: csv::WriterBuilder::new()
                .delimiter(b',')
                .has_headers(false)
                .from_writer(writer),
        }
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.inner.write_record(&HEADER)?;
        Ok(())
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        let screened = match row.screened_colonies {
            Some(s) => s.to_string(),
            None => NA.to_owned(),
        };
        self.inner.write_record(&[
            row.cycles.to_string(),
            row.label.clone(),
            row.replacements.to_string(),
            row.prevalence.to_string(),
            screened,
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        self.inner.into_inner().map_err(|e| Error::Io(e.into_error()))
    }
}

/// Load a whole table from a CSV file.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let mut reader = Reader::from_file(path)?;
    reader.check_header()?;
    let rows = reader.records().collect::<Result<Vec<Row>>>()?;
    debug!("read {} rows", rows.len());
    Ok(Table::new(rows))
}

/// Write a whole table to a CSV file.
pub fn write_table<P: AsRef<Path>>(path: P, table: &Table) -> Result<()> {
    let mut writer = Writer::to_file(path)?;
    writer.write_header()?;
    for row in table.iter() {
        writer.write_row(row)?;
    }
    writer.flush()
}
