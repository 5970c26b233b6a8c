use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfirmDateRequest {
    pub date_iso: NaiveDate,
}
