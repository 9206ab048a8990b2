use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow};
use itertools::Itertools;

pub fn column_letter(index: usize) -> String {
    let mut remaining = index + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        let rem = (remaining - 1) % 26;
        letters.push(b'A' + rem as u8);
        remaining = (remaining - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut value = 0usize;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    Some(value - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    column: usize,
    row: usize,
}

impl CellAddress {
    pub fn new(row: usize, column: usize) -> Self {
        Self { column, row }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.column), self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| anyhow!("Cell address '{value}' is missing a row number"))?;
        let (letters, digits) = trimmed.split_at(split);
        let column = column_index(letters)
            .ok_or_else(|| anyhow!("Cell address '{value}' has an invalid column"))?;
        let row = digits
            .parse::<usize>()
            .ok()
            .filter(|row| *row > 0)
            .ok_or_else(|| anyhow!("Cell address '{value}' has an invalid row"))?;
        Ok(CellAddress::new(row - 1, column))
    }
}

pub fn join_addresses(addresses: &[CellAddress]) -> String {
    addresses.iter().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_row_and_column_as_letters_and_one_based_row() {
        assert_eq!(CellAddress::new(4, 2).to_string(), "C5");
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
        assert_eq!(CellAddress::new(9, 27).to_string(), "AB10");
    }

    #[test]
    fn column_letters_round_trip_at_boundaries() {
        for (index, letters) in [(0, "A"), (25, "Z"), (26, "AA"), (701, "ZZ"), (702, "AAA")] {
            assert_eq!(column_letter(index), letters);
            assert_eq!(column_index(letters), Some(index));
        }
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn rows_sort_numerically() {
        let mut addresses = vec![
            "A10".parse::<CellAddress>().unwrap(),
            "A9".parse().unwrap(),
            "A1".parse().unwrap(),
        ];
        addresses.sort();
        assert_eq!(join_addresses(&addresses), "A1, A9, A10");
    }

    #[test]
    fn parse_rejects_row_zero() {
        assert!("B0".parse::<CellAddress>().is_err());
        assert!("7".parse::<CellAddress>().is_err());
    }
}
