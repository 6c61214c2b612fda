use std::str::FromStr;

use diesel::backend::Backend;
use diesel::{
	deserialize::{self, FromSql},
	serialize,
	serialize::{IsNull, Output, ToSql},
	sql_types::Text,
};
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Categorical risk bucket derived from the default probability
#[derive(
	Debug, Clone, Copy, AsExpression, FromSqlRow, Eq, PartialEq, Ord, PartialOrd, EnumString,
	Display, Serialize, Deserialize,
)]
#[diesel(sql_type = Text)]
pub enum RiskLevel {
	Low,
	Medium,
	High,
}

impl ToSql<Text, Sqlite> for RiskLevel {
	fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
		out.set_value(self.to_string());
		Ok(IsNull::No)
	}
}

impl FromSql<Text, Sqlite> for RiskLevel {
	fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
		let s = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;

		Ok(RiskLevel::from_str(&s)?)
	}
}

/// Action suggested to the underwriting side
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display, Serialize, Deserialize)]
pub enum Recommendation {
	Approved,
	#[strum(serialize = "Review Required")]
	#[serde(rename = "Review Required")]
	ReviewRequired,
	Reject,
}

/// Map a default probability to its risk bucket
///
/// Boundaries are closed on the lower end: exactly 0.30 is Medium,
/// exactly 0.70 is High
pub fn risk_tier(probability: f64) -> RiskLevel {
	if probability < 0.3 {
		RiskLevel::Low
	} else if probability < 0.7 {
		RiskLevel::Medium
	} else {
		RiskLevel::High
	}
}

/// Map a default probability to an underwriting recommendation
///
/// The 0.40 cutoff is intentionally looser than the 0.30 tier boundary;
/// low-Medium applications still auto-approve
pub fn recommendation(probability: f64) -> Recommendation {
	if probability < 0.4 {
		Recommendation::Approved
	} else if probability < 0.7 {
		Recommendation::ReviewRequired
	} else {
		Recommendation::Reject
	}
}

/// Binary default call; strictly greater than even odds
pub fn default_flag(probability: f64) -> bool {
	probability > 0.5
}
