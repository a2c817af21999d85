//! # National Identity Number Decoder
//!
//! Decodes a 14-digit national identity number into the holder's birth
//! date, gender, and registration governorate.
//!
//! ## Layout
//!
//! ```text
//!  position: 0 | 1 2 | 3 4 | 5 6 | 7 8 | 9 10 11 12 | 13
//!  field:    C | Y Y | M M | D D | G G |  serial     | K
//! ```
//!
//! - `C` — century digit: `2` for 1900–1999, `3` for 2000–2099.
//! - `YY MM DD` — birth date within the century.
//! - `GG` — governorate code (see [`crate::governorate`]).
//! - serial — the last serial digit (position 12) encodes gender: odd is
//!   male, even is female.
//! - `K` — check digit. Read but never validated.
//!
//! ## Check Order
//!
//! length → charset → century → calendar date → future date → governorate.
//! The first failing check determines the error.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::governorate::governorate_name;

/// Required number of characters in a national identity number.
pub const NATIONAL_ID_LENGTH: usize = 14;

/// Holder gender as encoded by the serial parity digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Return the display name used in API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    fn from_digit(digit: u8) -> Self {
        if digit % 2 == 1 {
            Self::Male
        } else {
            Self::Female
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes extracted from a valid national identity number.
///
/// Serializes with `birth_date` in `dd/mm/yyyy` form, matching the API
/// response contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedIdentity {
    pub birth_year: i32,
    #[serde(with = "dmy_date")]
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub governorate: String,
}

impl DecodedIdentity {
    /// Birth date rendered as `dd/mm/yyyy`.
    pub fn birth_date_display(&self) -> String {
        self.birth_date.format(dmy_date::FORMAT).to_string()
    }
}

/// Decode against today's UTC date.
pub fn decode(input: &str) -> Result<DecodedIdentity, ValidationError> {
    decode_at(input, Utc::now().date_naive())
}

/// Decode a national identity number, treating `today` as the latest
/// acceptable birth date.
pub fn decode_at(input: &str, today: NaiveDate) -> Result<DecodedIdentity, ValidationError> {
    if input.chars().count() != NATIONAL_ID_LENGTH {
        return Err(ValidationError::InvalidLength);
    }
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat);
    }
    // All bytes are ASCII digits from here on, so byte slicing is char slicing.
    let digits = input.as_bytes();

    let century = match digits[0] {
        b'2' => 1900,
        b'3' => 2000,
        _ => return Err(ValidationError::InvalidCentury),
    };
    let birth_year = century + two_digit(digits[1], digits[2]) as i32;

    let month = two_digit(digits[3], digits[4]);
    let day = two_digit(digits[5], digits[6]);
    let birth_date = NaiveDate::from_ymd_opt(birth_year, month, day)
        .ok_or(ValidationError::InvalidDateFormat)?;
    if birth_date > today {
        return Err(ValidationError::FutureDate);
    }

    let governorate =
        governorate_name(&input[7..9]).ok_or(ValidationError::InvalidGovernorate)?;

    let gender = Gender::from_digit(digits[12] - b'0');

    Ok(DecodedIdentity {
        birth_year,
        birth_date,
        gender,
        governorate: governorate.to_string(),
    })
}

fn two_digit(tens: u8, ones: u8) -> u32 {
    u32::from(tens - b'0') * 10 + u32::from(ones - b'0')
}

/// Serde adapter for `dd/mm/yyyy` dates.
mod dmy_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
