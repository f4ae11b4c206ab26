use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, Days, Local, NaiveDate};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info};

use crate::error::{Result, SamplerError};
use crate::models::{
    CardHolder, CategoryAssignment, ProductCode, TransactionRecord, TxnType, FEES_AND_CHARGES,
};
use crate::request::RequestError;
use crate::taxonomy::Taxonomy;

const TXN_UID_START: u64 = 1_000_000;
const PAN_LEN: usize = 16;
const PAN_MASK: char = 'X';
const ACCOUNT_PREFIX: &str = "000000";
const ACCOUNT_RANDOM_DIGITS: usize = 14;
/// Upper bound on up-front reservation; larger batches grow as they fill.
const PREALLOC_CAP: usize = 4096;

/// Process-wide txnUid source. One instance is shared by every generator
/// (and so every request) in the process.
#[derive(Debug)]
pub struct TxnUidCounter(AtomicU64);

impl TxnUidCounter {
    pub fn new() -> Self {
        Self::starting_at(TXN_UID_START)
    }

    pub fn starting_at(start: u64) -> Self {
        Self(AtomicU64::new(start))
    }

    /// Increment and return the new value.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for TxnUidCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts, optional type filter and optional year for one generation run.
/// Callers normally build it through [`crate::request::GenerateParams::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub data_sample_count: usize,
    pub unique_sample_count: usize,
    pub txn_type: Option<TxnType>,
    pub year: Option<i32>,
}

impl GenerationRequest {
    pub fn new(data_sample_count: usize, unique_sample_count: usize) -> Self {
        Self {
            data_sample_count,
            unique_sample_count,
            txn_type: None,
            year: None,
        }
    }

    pub fn with_txn_type(mut self, txn_type: TxnType) -> Self {
        self.txn_type = Some(txn_type);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn check_counts(&self) -> std::result::Result<(), RequestError> {
        if self.data_sample_count == 0 {
            return Err(RequestError::DataSampleCount);
        }
        if self.unique_sample_count == 0 {
            return Err(RequestError::UniqueSampleCount);
        }
        if self.unique_sample_count > self.data_sample_count {
            return Err(RequestError::UniqueExceedsTotal);
        }
        Ok(())
    }
}

pub struct Generator {
    taxonomy: Arc<Taxonomy>,
    counter: Arc<TxnUidCounter>,
    products: Vec<ProductCode>,
    today: Option<NaiveDate>,
}

impl Generator {
    pub fn new(taxonomy: Arc<Taxonomy>, counter: Arc<TxnUidCounter>) -> Self {
        Self {
            taxonomy,
            counter,
            products: vec![ProductCode::Credit],
            today: None,
        }
    }

    /// Product codes drawn uniformly per base record. An empty list keeps the default.
    pub fn with_products(mut self, products: Vec<ProductCode>) -> Self {
        if !products.is_empty() {
            self.products = products;
        }
        self
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        request: &GenerationRequest,
        rng: &mut R,
    ) -> Result<Vec<TransactionRecord>> {
        request.check_counts()?;
        let started = Instant::now();
        let today = self.today();
        let year = request.year.unwrap_or_else(|| today.year());
        let total = request.data_sample_count;
        let unique = request.unique_sample_count;

        let mut seen = HashSet::with_capacity(total.min(PREALLOC_CAP));
        let mut records = Vec::with_capacity(total.min(PREALLOC_CAP));

        while records.len() < unique {
            let record = self.base_record(request.txn_type, year, today, rng)?;
            if seen.insert(record.primary_key.clone()) {
                records.push(record);
            } else {
                debug!(key = %record.primary_key, "duplicate primary key, retrying base record");
            }
        }

        while records.len() < total {
            let template = &records[rng.gen_range(0..unique)];
            let record = self.variant_record(template, request.txn_type, year, today, rng)?;
            if seen.insert(record.primary_key.clone()) {
                records.push(record);
            } else {
                debug!(key = %record.primary_key, "duplicate primary key, retrying variant record");
            }
        }

        info!(
            total,
            unique,
            year,
            last_uid = self.counter.current(),
            elapsed = ?started.elapsed(),
            "generated transaction records"
        );
        Ok(records)
    }

    fn base_record<R: Rng + ?Sized>(
        &self,
        filter: Option<TxnType>,
        year: i32,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<TransactionRecord> {
        let posted = posted_date(year, today, rng)?;
        let txn_date = txn_date_before(posted, rng);
        let txn_type = filter.unwrap_or_else(|| base_txn_type(rng));
        let assignment = self.assign_category(txn_type, None, rng);
        let holder = CardHolder {
            account_uid: random_account_uid(rng),
            product_cd: self.products[rng.gen_range(0..self.products.len())],
            tokenized_pan: random_tokenized_pan(rng),
        };
        let amount = random_amount(rng);
        let txn_uid = self.counter.next();
        Ok(TransactionRecord::new(holder, posted, txn_date, txn_type, amount, assignment, txn_uid))
    }

    /// Same account and card as `template`; fresh uid, dates, amount, type and category.
    fn variant_record<R: Rng + ?Sized>(
        &self,
        template: &TransactionRecord,
        filter: Option<TxnType>,
        year: i32,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<TransactionRecord> {
        let txn_uid = self.counter.next();
        let posted = posted_date(year, today, rng)?;
        let txn_date = txn_date_before(posted, rng);

        let amount = if rng.gen_bool(0.5) {
            random_amount(rng)
        } else {
            scaled_amount(template.amount, rng.gen_range(0.5..=1.5))
        };

        let txn_type = filter.unwrap_or_else(|| variant_txn_type(template.txn_type, rng));
        let keep_root = if rng.gen_bool(0.7) {
            None
        } else {
            Some(template.category.as_str())
        };
        let assignment = self.assign_category(txn_type, keep_root, rng);

        Ok(TransactionRecord::new(
            template.card_holder(),
            posted,
            txn_date,
            txn_type,
            amount,
            assignment,
            txn_uid,
        ))
    }

    /// Resolve the category triple for a type. `keep_root` asks a purchase to
    /// stay under the named root and only re-roll the subcategory; it is
    /// ignored when the type does not accept that root.
    fn assign_category<R: Rng + ?Sized>(
        &self,
        txn_type: TxnType,
        keep_root: Option<&str>,
        rng: &mut R,
    ) -> CategoryAssignment {
        let taxonomy = &self.taxonomy;
        match txn_type {
            TxnType::Fee => {
                let mut assignment =
                    taxonomy.assign_under(taxonomy.guid_by_name(FEES_AND_CHARGES), rng);
                assignment.category = FEES_AND_CHARGES.to_string();
                assignment
            }
            TxnType::Payment => taxonomy.uncategorized(),
            TxnType::Purchase => {
                let root = match keep_root {
                    Some(name) if txn_type.accepts_root(name) => taxonomy.guid_by_name(name),
                    _ => loop {
                        let guid = taxonomy.random_root_category(rng);
                        if txn_type.accepts_root(taxonomy.name_by_guid(guid)) {
                            break guid;
                        }
                    },
                };
                taxonomy.assign_under(root, rng)
            }
        }
    }
}

fn base_txn_type<R: Rng + ?Sized>(rng: &mut R) -> TxnType {
    let roll: f64 = rng.gen();
    if roll < 0.15 {
        TxnType::Fee
    } else if roll < 0.30 {
        TxnType::Payment
    } else {
        TxnType::Purchase
    }
}

/// FEE and PAYMENT templates keep their class; purchases split 15/25/60.
fn variant_txn_type<R: Rng + ?Sized>(template: TxnType, rng: &mut R) -> TxnType {
    let roll: f64 = rng.gen();
    match template {
        TxnType::Fee => TxnType::Fee,
        TxnType::Payment => TxnType::Payment,
        TxnType::Purchase if roll < 0.15 => TxnType::Fee,
        TxnType::Purchase if roll < 0.40 => TxnType::Payment,
        TxnType::Purchase => TxnType::Purchase,
    }
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(chrono::Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Posted date within `year`. For the current year the range is Jan 1 up to
/// yesterday; other years pick a month uniformly, then a day in that month.
pub fn posted_date<R: Rng + ?Sized>(year: i32, today: NaiveDate, rng: &mut R) -> Result<NaiveDate> {
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(SamplerError::InvalidYear(year))?;
    if year == today.year() {
        let span = today.signed_duration_since(jan_first).num_days();
        if span <= 0 {
            return Ok(jan_first);
        }
        let offset = rng.gen_range(0..span) as u64;
        return jan_first
            .checked_add_days(Days::new(offset))
            .ok_or(SamplerError::InvalidYear(year));
    }
    let month = rng.gen_range(1..=12);
    let last_day = days_in_month(year, month).ok_or(SamplerError::InvalidYear(year))?;
    let day = rng.gen_range(1..=last_day);
    NaiveDate::from_ymd_opt(year, month, day).ok_or(SamplerError::InvalidYear(year))
}

/// 0-2 days before `posted`, never crossing into the previous year.
pub fn txn_date_before<R: Rng + ?Sized>(posted: NaiveDate, rng: &mut R) -> NaiveDate {
    let offset = rng.gen_range(0..=2u32).min(posted.ordinal0());
    posted
        .checked_sub_days(Days::new(u64::from(offset)))
        .unwrap_or(posted)
}

fn min_amount() -> Decimal {
    Decimal::new(100, 2)
}

fn max_amount() -> Decimal {
    Decimal::new(999_999, 2)
}

fn to_amount(raw: Decimal) -> Decimal {
    let mut amount = raw
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .clamp(min_amount(), max_amount());
    amount.rescale(2);
    amount
}

pub fn random_amount<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    let raw: f64 = rng.gen_range(1.0..10_000.0);
    to_amount(Decimal::from_f64(raw).unwrap_or_else(min_amount))
}

pub fn scaled_amount(base: Decimal, factor: f64) -> Decimal {
    let factor = Decimal::from_f64(factor).unwrap_or(Decimal::ONE);
    to_amount(base * factor)
}

fn random_digits<R: Rng + ?Sized>(out: &mut String, count: usize, rng: &mut R) {
    for _ in 0..count {
        out.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
}

pub fn random_account_uid<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut uid = String::with_capacity(ACCOUNT_PREFIX.len() + ACCOUNT_RANDOM_DIGITS);
    uid.push_str(ACCOUNT_PREFIX);
    random_digits(&mut uid, ACCOUNT_RANDOM_DIGITS, rng);
    uid
}

/// 16 characters: six digits, six mask characters, four digits.
pub fn random_tokenized_pan<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut pan = String::with_capacity(PAN_LEN);
    random_digits(&mut pan, 6, rng);
    pan.extend(std::iter::repeat(PAN_MASK).take(6));
    random_digits(&mut pan, 4, rng);
    pan
}
