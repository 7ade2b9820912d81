//! PDF → reference list.

use std::path::Path;

use tracing::{info, warn};

use citegraph_core::{ReferenceDetails, Result};

use crate::pdf::PdfReader;
use crate::references::{parse_reference, ReferenceExtractor, ReferencePattern};

/// Read the given pages (every page when `pages` is empty), split the
/// reference section and parse each entry. Unparsable entries are logged
/// and skipped; the result is ordered by entry number.
pub fn extract_references(
    reader: &dyn PdfReader,
    pattern: ReferencePattern,
    path: &Path,
    pages: &[u32],
) -> Result<Vec<ReferenceDetails>> {
    let text = if pages.is_empty() {
        reader.read(path)?
    } else {
        reader.extract_pages(path, pages)?.join("\n")
    };

    let entries = ReferenceExtractor::new(pattern).extract(&text);
    let mut references = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for (id, entry) in &entries {
        match parse_reference(*id, entry) {
            Some(reference) => references.push(reference),
            None => {
                skipped += 1;
                warn!("Could not parse reference {}: {}", id, entry);
            }
        }
    }

    info!(
        "Parsed {} of {} references from {}",
        references.len(),
        entries.len(),
        path.display()
    );
    if skipped > 0 {
        warn!("{} references skipped", skipped);
    }
    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_core::Error;
    use std::sync::Mutex;

    struct FakeReader {
        pages: Vec<&'static str>,
        requested: Mutex<Vec<Vec<u32>>>,
    }

    impl PdfReader for FakeReader {
        fn read(&self, _path: &Path) -> Result<String> {
            Ok(self.pages.join("\n"))
        }

        fn extract_pages(&self, _path: &Path, pages: &[u32]) -> Result<Vec<String>> {
            self.requested.lock().unwrap().push(pages.to_vec());
            pages
                .iter()
                .map(|&p| {
                    self.pages
                        .get(p as usize - 1)
                        .map(|s| s.to_string())
                        .ok_or_else(|| Error::Pdf(format!("page {} out of range", p)))
                })
                .collect()
        }
    }

    fn reader() -> FakeReader {
        FakeReader {
            pages: vec![
                "Introduction. Knowledge graphs [1] are useful.",
                "References\n[1] Ada Lovelace. 1843. Notes on the analytical engine. Scientific Memoirs, 3.\n\
                 [2] not a reference at all\n",
                "[3] Alan Turing. 1950. Computing machinery and intelligence. Mind, 59.\n",
            ],
            requested: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_selected_pages_only() {
        let reader = reader();
        let refs = extract_references(&reader, ReferencePattern::BracketedNumber, Path::new("x.pdf"), &[2, 3])
            .unwrap();
        assert_eq!(reader.requested.lock().unwrap().as_slice(), &[vec![2u32, 3]]);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id, 1);
        assert_eq!(refs[0].title, "Notes on the analytical engine");
        assert_eq!(refs[1].id, 3);
        assert_eq!(refs[1].publish, "Mind");
        assert_eq!(refs[1].page_or_volume, "59");
    }

    #[test]
    fn test_out_of_range_page_propagates() {
        let err = extract_references(&reader(), ReferencePattern::BracketedNumber, Path::new("x.pdf"), &[9])
            .unwrap_err();
        assert_eq!(err.kind(), "pdf");
    }
}
