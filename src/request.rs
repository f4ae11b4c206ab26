use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::generator::GenerationRequest;
use crate::models::TxnType;

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEARS_AHEAD: i32 = 5;

/// Caller-facing validation failures. The `Display` text is returned verbatim
/// as the body of a 400 response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Data sample count must be greater than 0")]
    DataSampleCount,

    #[error("Currently only CSV file type is supported")]
    FileType,

    #[error("Unique sample count must be greater than 0")]
    UniqueSampleCount,

    #[error("Unique sample count cannot be greater than data sample count")]
    UniqueExceedsTotal,

    #[error("Transaction type must be one of: PURCHASE, FEE, PAYMENT")]
    TxnType,

    #[error("Year must be between 2000 and {max}")]
    Year { max: i32 },

    #[error("Data sample count cannot be greater than {max}")]
    TooManySamples { max: usize },
}

/// Raw request parameters, as they arrive on the query string or the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    pub file_type: Option<String>,
    pub data_sample_count: Option<i64>,
    pub unique_sample_count: Option<i64>,
    pub txn_type: Option<String>,
    pub year: Option<i32>,
}

/// Count bounds applied before any generation work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountLimits {
    /// Stands in for an absent data sample count.
    pub default_count: usize,
    pub max_count: usize,
}

impl GenerateParams {
    /// Check every parameter and build the request.
    pub fn validate(
        &self,
        limits: CountLimits,
        current_year: i32,
    ) -> Result<GenerationRequest, RequestError> {
        let result = self.check(limits, current_year);
        if let Err(e) = &result {
            warn!(params = ?self, error = %e, "rejected generation request");
        }
        result
    }

    fn check(&self, limits: CountLimits, current_year: i32) -> Result<GenerationRequest, RequestError> {
        let too_many = RequestError::TooManySamples { max: limits.max_count };
        let data_sample_count = match self.data_sample_count {
            Some(n) => n,
            None => i64::try_from(limits.default_count).map_err(|_| too_many.clone())?,
        };
        if data_sample_count <= 0 {
            return Err(RequestError::DataSampleCount);
        }
        let data_sample_count = usize::try_from(data_sample_count)
            .ok()
            .filter(|&n| n <= limits.max_count)
            .ok_or(too_many)?;

        let file_type = self.file_type.as_deref().unwrap_or("CSV");
        if !file_type.eq_ignore_ascii_case("CSV") {
            return Err(RequestError::FileType);
        }

        let unique_sample_count = match self.unique_sample_count {
            None => data_sample_count,
            Some(n) if n <= 0 => return Err(RequestError::UniqueSampleCount),
            Some(n) => usize::try_from(n)
                .ok()
                .filter(|&n| n <= data_sample_count)
                .ok_or(RequestError::UniqueExceedsTotal)?,
        };

        let mut request = GenerationRequest::new(data_sample_count, unique_sample_count);

        match self.txn_type.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(raw) => {
                let txn_type = raw.parse::<TxnType>().map_err(|_| RequestError::TxnType)?;
                request = request.with_txn_type(txn_type);
            }
        }

        if let Some(year) = self.year {
            let max = current_year + MAX_YEARS_AHEAD;
            if !(MIN_YEAR..=max).contains(&year) {
                return Err(RequestError::Year { max });
            }
            request = request.with_year(year);
        }

        Ok(request)
    }
}
