/// Two-digit years at or below this value are read as 20xx, the rest as 19xx
pub const DEFAULT_CENTURY_PIVOT: u8 = 30;

/// Fixed boundary used to expand a two-digit MRZ year into a full year
///
/// The pivot does not roll with the current date: `00..=pivot` maps to the
/// 2000s and `pivot+1..=99` maps to the 1900s. With the default of 30 a
/// guest born in 1930 is read as born in 2030.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CenturyPivot(u8);

impl CenturyPivot {
    /// Returns `None` for values that are not a two-digit year
    pub fn new(pivot: u8) -> Option<Self> {
        (pivot <= 99).then_some(Self(pivot))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Century prefix for a two-digit year
    #[inline]
    pub fn century_for(self, two_digit_year: u8) -> &'static str {
        if two_digit_year <= self.0 {
            "20"
        } else {
            "19"
        }
    }
}

impl Default for CenturyPivot {
    fn default() -> Self {
        Self(DEFAULT_CENTURY_PIVOT)
    }
}

/// Convert an MRZ `YYMMDD` birth date to `YYYY-MM-DD` using the default pivot
pub fn format_birth_date(raw: &str) -> String {
    format_birth_date_with_pivot(raw, CenturyPivot::default())
}

/// Convert an MRZ `YYMMDD` birth date to `YYYY-MM-DD`
///
/// Anything that is not exactly six characters is returned unchanged: an
/// empty field, a date the service already formatted, or OCR noise. A
/// six character value whose year part is not two digits is also returned
/// unchanged. Month and day are copied as-is.
///
/// # Arguments
/// * `raw` - Birth date as read from the MRZ
/// * `pivot` - Century boundary for the two-digit year
pub fn format_birth_date_with_pivot(raw: &str, pivot: CenturyPivot) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() != 6 {
        return raw.to_string();
    }

    if !chars[..2].iter().all(|c| c.is_ascii_digit()) {
        return raw.to_string();
    }

    let year: String = chars[0..2].iter().collect();
    let month: String = chars[2..4].iter().collect();
    let day: String = chars[4..6].iter().collect();

    let two_digit_year = match year.parse::<u8>() {
        Ok(y) => y,
        Err(_) => return raw.to_string(),
    };

    format!("{}{}-{}-{}", pivot.century_for(two_digit_year), year, month, day)
}
