//! # Governorate Code Table
//!
//! Static mapping from the two-digit region code embedded at positions 7–8
//! of a national identity number to the governorate name. Code `88` marks
//! holders born abroad.

/// Code used for holders registered as born outside the country.
pub const FOREIGN_CODE: &str = "88";

/// All known governorate codes, ordered by code.
pub const GOVERNORATES: [(&str, &str); 28] = [
    ("01", "Cairo"),
    ("02", "Alexandria"),
    ("03", "Port Said"),
    ("04", "Suez"),
    ("11", "Damietta"),
    ("12", "Dakahlia"),
    ("13", "Sharkia"),
    ("14", "Qalyubia"),
    ("15", "Kafr El Sheikh"),
    ("16", "Gharbia"),
    ("17", "Monufia"),
    ("18", "Beheira"),
    ("19", "Ismailia"),
    ("21", "Giza"),
    ("22", "Beni Suef"),
    ("23", "Fayoum"),
    ("24", "Minya"),
    ("25", "Assiut"),
    ("26", "Sohag"),
    ("27", "Qena"),
    ("28", "Aswan"),
    ("29", "Luxor"),
    ("31", "Red Sea"),
    ("32", "New Valley"),
    ("33", "Matrouh"),
    ("34", "North Sinai"),
    ("35", "South Sinai"),
    (FOREIGN_CODE, "Foreign"),
];

/// Look up the governorate name for a two-digit code.
///
/// The table is sorted by code, so this is a binary search.
pub fn governorate_name(code: &str) -> Option<&'static str> {
    GOVERNORATES
        .binary_search_by(|(c, _)| (*c).cmp(code))
        .ok()
        .map(|idx| GOVERNORATES[idx].1)
}
