//! Argument value types.

use clap::ValueEnum;

use citegraph_builder::CandidateDirection;
use citegraph_core::config::parse_secs;

/// 1-based page numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageList(pub Vec<u32>);

/// Parse `32-42` (inclusive range) or `32,33,34`.
pub fn parse_pages(s: &str) -> Result<PageList, String> {
    let s = s.trim();
    let page = |p: &str| -> Result<u32, String> {
        match p.trim().parse::<u32>() {
            Ok(0) => Err("page numbers start at 1".to_string()),
            Ok(n) => Ok(n),
            Err(_) => Err(format!("'{}' is not a page number", p.trim())),
        }
    };

    if let Some((start, end)) = s.split_once('-') {
        let (start, end) = (page(start)?, page(end)?);
        if start > end {
            return Err(format!("page range {}-{} is reversed", start, end));
        }
        return Ok(PageList((start..=end).collect()));
    }

    let pages = s.split(',').map(page).collect::<Result<Vec<_>, _>>()?;
    Ok(PageList(pages))
}

/// Parse a pacing delay, bounded the same way as the environment value.
pub fn parse_delay(s: &str) -> Result<f64, String> {
    parse_secs("--rate-limit", s).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Papers citing the seed
    Citations,
    /// Papers the seed cites
    References,
}

impl From<DirectionArg> for CandidateDirection {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::Citations => CandidateDirection::Citations,
            DirectionArg::References => CandidateDirection::References,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pages() {
        assert_eq!(parse_pages("32-35").unwrap().0, vec![32, 33, 34, 35]);
        assert_eq!(parse_pages("7").unwrap().0, vec![7]);
        assert_eq!(parse_pages("32, 33,40").unwrap().0, vec![32, 33, 40]);
        assert_eq!(parse_pages("5-5").unwrap().0, vec![5]);
    }

    #[test]
    fn test_parse_pages_errors() {
        assert!(parse_pages("").is_err());
        assert!(parse_pages("0-3").is_err());
        assert!(parse_pages("12-3").is_err());
        assert!(parse_pages("1,a").is_err());
        assert!(parse_pages("3-").is_err());
    }

    #[test]
    fn test_parse_delay() {
        assert_eq!(parse_delay("0.5").unwrap(), 0.5);
        assert_eq!(parse_delay("0").unwrap(), 0.0);
        assert!(parse_delay("inf").is_err());
        assert!(parse_delay("1e300").is_err());
        assert!(parse_delay("-1").is_err());
        assert!(parse_delay("soon").is_err());
    }
}
