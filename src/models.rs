use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the taxonomy file. An empty `parent_guid` marks a root category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "categoryGUID")]
    pub guid: String,
    #[serde(rename = "category")]
    pub name: String,
    #[serde(rename = "parentCategoryGUID")]
    pub parent_guid: String,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_guid.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebitCredit {
    Debit,
    Credit,
}

impl DebitCredit {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Debit => "D",
            Self::Credit => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductCode {
    Credit,
    Debit,
}

impl ProductCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Transaction class. Each variant owns the sign it books with and the
/// root categories it may be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnType {
    Purchase,
    Fee,
    Payment,
}

pub const FEES_AND_CHARGES: &str = "Fees and Charges";
pub const UNCATEGORIZED: &str = "Uncategorized";

impl TxnType {
    pub const ALL: [TxnType; 3] = [TxnType::Purchase, TxnType::Fee, TxnType::Payment];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Fee => "FEE",
            Self::Payment => "PAYMENT",
        }
    }

    pub fn indicator(&self) -> DebitCredit {
        match self {
            Self::Purchase | Self::Fee => DebitCredit::Debit,
            Self::Payment => DebitCredit::Credit,
        }
    }

    /// Whether a purchase may be filed under the given root category.
    /// FEE and PAYMENT have a fixed root and never consult this.
    pub fn accepts_root(&self, root_name: &str) -> bool {
        match self {
            Self::Purchase => root_name != FEES_AND_CHARGES && root_name != UNCATEGORIZED,
            Self::Fee => root_name == FEES_AND_CHARGES,
            Self::Payment => root_name == UNCATEGORIZED,
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TxnType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.code().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| s.to_string())
    }
}

/// Resolved (category, subcategory, guid) triple for a record. Only the
/// taxonomy builds these, so names and guid always agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAssignment {
    pub category: String,
    pub sub_category: String,
    pub category_guid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub account_uid: String,
    pub product_cd: ProductCode,
    pub txn_posted_date: NaiveDate,
    pub txn_date: NaiveDate,
    pub txn_type: TxnType,
    pub amount: Decimal,
    pub category: String,
    pub sub_category: String,
    pub category_guid: String,
    pub txn_uid: u64,
    pub tokenized_pan: String,
    pub last4digit_nbr: String,
    pub primary_key: String,
}

/// Identity and card fields shared by a base record and all of its variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardHolder {
    pub account_uid: String,
    pub product_cd: ProductCode,
    pub tokenized_pan: String,
}

pub fn primary_key(account_uid: &str, product_cd: ProductCode, posted: NaiveDate, txn_uid: u64) -> String {
    format!("{account_uid}_{product_cd}_{}_{txn_uid}", posted.format("%Y-%m-%d"))
}

impl TransactionRecord {
    pub fn new(
        holder: CardHolder,
        txn_posted_date: NaiveDate,
        txn_date: NaiveDate,
        txn_type: TxnType,
        amount: Decimal,
        assignment: CategoryAssignment,
        txn_uid: u64,
    ) -> Self {
        let primary_key = primary_key(&holder.account_uid, holder.product_cd, txn_posted_date, txn_uid);
        let last4digit_nbr = holder
            .tokenized_pan
            .get(holder.tokenized_pan.len().saturating_sub(4)..)
            .unwrap_or_default()
            .to_string();
        Self {
            account_uid: holder.account_uid,
            product_cd: holder.product_cd,
            txn_posted_date,
            txn_date,
            txn_type,
            amount,
            category: assignment.category,
            sub_category: assignment.sub_category,
            category_guid: assignment.category_guid,
            txn_uid,
            tokenized_pan: holder.tokenized_pan,
            last4digit_nbr,
            primary_key,
        }
    }

    pub fn debit_credit_indicator(&self) -> DebitCredit {
        self.txn_type.indicator()
    }

    pub fn card_holder(&self) -> CardHolder {
        CardHolder {
            account_uid: self.account_uid.clone(),
            product_cd: self.product_cd,
            tokenized_pan: self.tokenized_pan.clone(),
        }
    }
}
