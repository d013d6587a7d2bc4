use crate::error::ExtractError;
use lopdf::Document;
use std::path::Path;

/// Raw text of one page, numbered from 1 in reading order.
#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

pub trait PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, ExtractError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, ExtractError> {
        let document =
            Document::load(path).map_err(|error| ExtractError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| ExtractError::PdfParse(error.to_string()))?;

            // Pages with no text stay in the sequence; the chunker skips them
            // and page numbering stays faithful to the document.
            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        if pages.iter().all(|page| page.text.trim().is_empty()) {
            return Err(ExtractError::PdfParse(format!(
                "pdf had no readable page text: {}",
                path.display()
            )));
        }

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::{LopdfExtractor, PdfExtractor};
    use crate::error::ExtractError;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn unreadable_pdf_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        std::fs::File::create(&path).and_then(|mut file| file.write_all(b"%PDF-1.4\n%broken"))?;

        let result = LopdfExtractor::default().extract_pages(&path);
        assert!(matches!(result, Err(ExtractError::PdfParse(_))));
        Ok(())
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let result =
            LopdfExtractor::default().extract_pages(std::path::Path::new("/nonexistent.pdf"));
        assert!(result.is_err());
    }
}
