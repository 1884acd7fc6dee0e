//! Documents bundled with the server binary.

use chrono::Utc;
use gordon_protocol::{Metadata, Page, PageRef, Predicate, Relationship, Section};
use uuid::{uuid, Uuid};

pub const ROOT_DOC_ID: Uuid = uuid!("208b43d9-a95d-476d-ba3b-3b64fda2507b");
pub const WIRE_DOC_ID: Uuid = uuid!("996b046f-11d2-41c9-8b45-9294c7215e38");

const AUTHOR: &str = "jspc";

/// Sample pages served unless disabled in configuration.
pub fn samples() -> Vec<Page> {
    vec![root(), wire_format()]
}

fn meta(id: Uuid) -> Metadata {
    Metadata::new(id, AUTHOR, Utc::now().fixed_offset())
}

fn root() -> Page {
    let mut page = Page::new(meta(ROOT_DOC_ID), "The Gordon Documentation Protocol");
    page.preamble = "The canonical Gordon documentation".to_string();
    page.sections = vec![
        Section::new(
            "Introduction",
            "Welcome to the documentation for the Gordon documentation protocol.\n\
             This is a living document and tracks the current state of the server.\n",
        ),
        Section::new(
            "The Data Format",
            "Gordon pages travel as a compact binary encoding with native support for \
             identifiers, timestamps, sequences and maps.\n\n\
             The full layout of a page is described in [l:0].\n",
        ),
        Section::new(
            "The Network Format",
            "Each connection carries exactly one length-prefixed request and one \
             length-prefixed page, normally over TLS. The server listens on port 4444 \
             unless configured otherwise.",
        ),
    ];
    page.tags = vec!["gordon".to_string(), "protocol".to_string()];
    page.labels.insert("status".to_string(), "draft".to_string());
    page.links = vec![PageRef::to_page(WIRE_DOC_ID)];
    page.relationships = vec![Relationship::new(
        PageRef::to_page(WIRE_DOC_ID),
        Predicate::Supplements,
        PageRef::to_page(ROOT_DOC_ID),
    )];
    page
}

fn wire_format() -> Page {
    let mut page = Page::new(meta(WIRE_DOC_ID), "Wire Format for Gordon");
    page.preamble = "Byte-level layout of Gordon requests and pages".to_string();
    page.sections = vec![
        Section::new(
            "Scalars",
            "Integers are big-endian.\n\
             bool       1 byte, 0 or 1\n\
             string     u32 length, then UTF-8 bytes\n\
             bytes      u32 length, then raw bytes\n\
             uuid       16 raw bytes\n\
             timestamp  i64 seconds since the epoch, then u32 nanoseconds\n\
             enum       1 byte; 0 is never valid\n",
        ),
        Section::new(
            "Collections",
            "Sequences and maps start with a u32 element count. Map entries are \
             written key then value, in ascending key order.",
        ),
        Section::new(
            "Request",
            "verb (enum) | id (uuid) | args (map<string,string>)\n\n\
             The nil id asks for the page index.",
        ),
        Section::new(
            "Page",
            "meta | history[] | title | preamble | sections[] | tags[] | labels{} | \
             links[] | relationships[] | status\n\n\
             Titles must be between 1 and 512 characters. Publication dates are \
             normalized to UTC before encoding.",
        ),
    ];
    page.tags = vec!["gordon".to_string(), "wire-format".to_string()];
    page.links = vec![PageRef::to_page(ROOT_DOC_ID)];
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use gordon_protocol::{Decoder, Encoder};

    #[test]
    fn test_samples_encode() {
        for page in samples() {
            let bytes = Encoder::encode_page(&page).unwrap();
            let mut decoder = Decoder::new();
            decoder.extend(&bytes);
            let decoded = decoder.decode_page().unwrap().unwrap();
            assert_eq!(decoded.title, page.title);
            assert_eq!(decoded.sections.len(), page.sections.len());
        }
    }

    #[test]
    fn test_sample_links_resolve() {
        let pages = samples();
        let ids: Vec<Uuid> = pages.iter().map(|p| p.meta.id).collect();
        for page in &pages {
            for link in &page.links {
                assert!(ids.contains(&link.page), "dangling link {}", link.page);
            }
        }
    }
}
