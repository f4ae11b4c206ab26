use std::borrow::Cow;
use std::fmt::{self, Write as _};
use std::io::{self, Write};

use crate::error::{Result, SamplerError};
use crate::models::TransactionRecord;

/// Characters that force a value to be quoted.
const NEEDS_QUOTING: &[char] = &[
    ',', '"', '\n', '\r', ' ', ';', '\'', '-', '&', '@', '(', ')', '[', ']', '{', '}', '!', '?',
    '#', '$', '%', '^', '*', '+', '=', '<', '>', '/', '\\',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvSchema {
    /// All fourteen columns.
    #[default]
    Full,
    /// Older twelve-column layout without `category_guid` and `debit_credit_indicator`.
    Legacy,
}

impl CsvSchema {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Full => &[
                "primary_key",
                "account_uid",
                "product_cd",
                "txn_posted_date",
                "txn_date",
                "txn_type",
                "amount",
                "category",
                "sub_category",
                "category_guid",
                "debit_credit_indicator",
                "txn_uid",
                "tokenized_pan",
                "last4digitNbr",
            ],
            Self::Legacy => &[
                "primary_key",
                "account_uid",
                "product_cd",
                "txn_posted_date",
                "txn_date",
                "txn_type",
                "amount",
                "category",
                "sub_category",
                "txn_uid",
                "tokenized_pan",
                "last4digitNbr",
            ],
        }
    }

    fn write_record<W: Write>(&self, row: &mut RowWriter<'_, W>, r: &TransactionRecord) -> io::Result<()> {
        row.field(&r.primary_key)?;
        row.field(&r.account_uid)?;
        row.field(r.product_cd.code())?;
        row.display(r.txn_posted_date.format("%Y-%m-%d"))?;
        row.display(r.txn_date.format("%Y-%m-%d"))?;
        row.field(r.txn_type.code())?;
        row.display(format_args!("{:.2}", r.amount))?;
        row.field(&r.category)?;
        row.field(&r.sub_category)?;
        if *self == Self::Full {
            row.field(&r.category_guid)?;
            row.field(r.debit_credit_indicator().code())?;
        }
        row.display(r.txn_uid)?;
        row.field(&r.tokenized_pan)?;
        row.field(&r.last4digit_nbr)?;
        row.end()
    }
}

/// Quote a value when it contains any character from the escaping set,
/// doubling embedded quotes.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains(NEEDS_QUOTING) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Streams one line at a time; non-string values are formatted into a
/// reused scratch buffer before escaping.
struct RowWriter<'a, W: Write> {
    out: &'a mut W,
    scratch: String,
    started: bool,
}

impl<'a, W: Write> RowWriter<'a, W> {
    fn new(out: &'a mut W) -> Self {
        Self { out, scratch: String::new(), started: false }
    }

    fn field(&mut self, value: &str) -> io::Result<()> {
        if self.started {
            self.out.write_all(b",")?;
        }
        self.started = true;
        self.out.write_all(escape_field(value).as_bytes())
    }

    fn display(&mut self, value: impl fmt::Display) -> io::Result<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        write!(scratch, "{value}").map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let written = self.field(&scratch);
        self.scratch = scratch;
        written
    }

    fn end(&mut self) -> io::Result<()> {
        self.started = false;
        self.out.write_all(b"\n")
    }
}

pub fn write_csv<W: Write>(out: &mut W, records: &[TransactionRecord], schema: CsvSchema) -> Result<()> {
    let mut row = RowWriter::new(out);
    for column in schema.columns() {
        row.field(column)?;
    }
    row.end()?;
    for record in records {
        schema.write_record(&mut row, record)?;
    }
    out.flush()?;
    Ok(())
}

pub fn encode_csv(records: &[TransactionRecord], schema: CsvSchema) -> Result<String> {
    let mut buf = Vec::with_capacity(64 + records.len().min(4096) * 160);
    write_csv(&mut buf, records, schema)?;
    String::from_utf8(buf).map_err(|e| SamplerError::Other(e.to_string()))
}
