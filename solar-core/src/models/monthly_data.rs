use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Calendar month, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// All twelve months, January first.
    pub const ALL: [Month; 12] = [
        Self::Jan,
        Self::Feb,
        Self::Mar,
        Self::Apr,
        Self::May,
        Self::Jun,
        Self::Jul,
        Self::Aug,
        Self::Sep,
        Self::Oct,
        Self::Nov,
        Self::Dec,
    ];

    /// Short lowercase key used in stored records (`"jan"` … `"dec"`).
    pub fn key(&self) -> &'static str {
        match self {
            Self::Jan => "jan",
            Self::Feb => "feb",
            Self::Mar => "mar",
            Self::Apr => "apr",
            Self::May => "may",
            Self::Jun => "jun",
            Self::Jul => "jul",
            Self::Aug => "aug",
            Self::Sep => "sep",
            Self::Oct => "oct",
            Self::Nov => "nov",
            Self::Dec => "dec",
        }
    }

    /// Month name as printed on proposals.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Jan => "Janeiro",
            Self::Feb => "Fevereiro",
            Self::Mar => "Março",
            Self::Apr => "Abril",
            Self::May => "Maio",
            Self::Jun => "Junho",
            Self::Jul => "Julho",
            Self::Aug => "Agosto",
            Self::Sep => "Setembro",
            Self::Oct => "Outubro",
            Self::Nov => "Novembro",
            Self::Dec => "Dezembro",
        }
    }

    /// One-based month number.
    pub fn number(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn from_number(number: u32) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize).copied())
    }

    /// Parses a month from its key, its number, or its English or Portuguese
    /// name. Matching is case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(number) = s.parse::<u32>() {
            return Self::from_number(number);
        }
        let lower = s.to_lowercase();
        Self::ALL.into_iter().find(|month| {
            lower == month.key()
                || lower == month.label().to_lowercase()
                || lower == month.english_name()
        })
    }

    fn english_name(&self) -> &'static str {
        match self {
            Self::Jan => "january",
            Self::Feb => "february",
            Self::Mar => "march",
            Self::Apr => "april",
            Self::May => "may",
            Self::Jun => "june",
            Self::Jul => "july",
            Self::Aug => "august",
            Self::Sep => "september",
            Self::Oct => "october",
            Self::Nov => "november",
            Self::Dec => "december",
        }
    }
}

/// One value per calendar month.
///
/// Depending on context the values are consumption (kWh), irradiation
/// (kWh/m²/day) or generation (kWh). All twelve months are always present;
/// a month without a reading is zero and still counts towards averages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyData {
    pub jan: f64,
    pub feb: f64,
    pub mar: f64,
    pub apr: f64,
    pub may: f64,
    pub jun: f64,
    pub jul: f64,
    pub aug: f64,
    pub sep: f64,
    pub oct: f64,
    pub nov: f64,
    pub dec: f64,
}

impl MonthlyData {
    /// All months zero.
    pub const ZERO: MonthlyData = MonthlyData {
        jan: 0.0,
        feb: 0.0,
        mar: 0.0,
        apr: 0.0,
        may: 0.0,
        jun: 0.0,
        jul: 0.0,
        aug: 0.0,
        sep: 0.0,
        oct: 0.0,
        nov: 0.0,
        dec: 0.0,
    };

    /// Same value for every month.
    pub fn splat(value: f64) -> Self {
        Self::from_fn(|_| value)
    }

    pub fn from_fn(mut f: impl FnMut(Month) -> f64) -> Self {
        let mut data = Self::ZERO;
        for month in Month::ALL {
            data[month] = f(month);
        }
        data
    }

    /// `(month, value)` pairs in calendar order.
    pub fn iter(&self) -> impl Iterator<Item = (Month, f64)> + '_ {
        Month::ALL.into_iter().map(move |month| (month, self[month]))
    }

    /// Sum of the twelve values, accumulated January to December.
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, value)| value).sum()
    }

    /// Total divided by twelve.
    pub fn average(&self) -> f64 {
        self.total() / 12.0
    }
}

impl Index<Month> for MonthlyData {
    type Output = f64;

    fn index(&self, month: Month) -> &f64 {
        match month {
            Month::Jan => &self.jan,
            Month::Feb => &self.feb,
            Month::Mar => &self.mar,
            Month::Apr => &self.apr,
            Month::May => &self.may,
            Month::Jun => &self.jun,
            Month::Jul => &self.jul,
            Month::Aug => &self.aug,
            Month::Sep => &self.sep,
            Month::Oct => &self.oct,
            Month::Nov => &self.nov,
            Month::Dec => &self.dec,
        }
    }
}

impl IndexMut<Month> for MonthlyData {
    fn index_mut(&mut self, month: Month) -> &mut f64 {
        match month {
            Month::Jan => &mut self.jan,
            Month::Feb => &mut self.feb,
            Month::Mar => &mut self.mar,
            Month::Apr => &mut self.apr,
            Month::May => &mut self.may,
            Month::Jun => &mut self.jun,
            Month::Jul => &mut self.jul,
            Month::Aug => &mut self.aug,
            Month::Sep => &mut self.sep,
            Month::Oct => &mut self.oct,
            Month::Nov => &mut self.nov,
            Month::Dec => &mut self.dec,
        }
    }
}
