use serde::{Serialize, Deserialize};

pub const DEFAULT_LIMIT: usize = 10;
pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 50;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize
)]
#[serde(from = "i64", into = "usize")]
pub struct Limit(usize);

impl Limit {
    pub fn new(given: i64) -> Self {
        if given < MIN_LIMIT as i64 {
            Limit(MIN_LIMIT)
        } else if given > MAX_LIMIT as i64 {
            Limit(MAX_LIMIT)
        } else {
            Limit(given as usize)
        }
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Limit(DEFAULT_LIMIT)
    }
}

impl From<i64> for Limit {
    fn from(given: i64) -> Self {
        Limit::new(given)
    }
}

impl From<Limit> for usize {
    fn from(limit: Limit) -> Self {
        limit.0
    }
}

impl std::str::FromStr for Limit {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed: i64 = s.trim().parse()?;

        Ok(Limit::new(parsed))
    }
}
