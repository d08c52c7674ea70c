use lopdf::Document as LopdfDocument;
use lopdf::content::Content;

/// Extract the first `Tj` string of every page, in page order
pub fn page_labels(doc: &LopdfDocument) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|page_id| {
            let Ok(data) = doc.get_page_content(*page_id) else {
                return String::new();
            };
            let Ok(content) = Content::decode(&data) else {
                return String::new();
            };
            content
                .operations
                .iter()
                .find(|op| op.operator == "Tj")
                .and_then(|op| op.operands.first())
                .and_then(|operand| operand.as_str().ok())
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .unwrap_or_default()
        })
        .collect()
}

/// Check that every page carries a MediaBox and Resources of its own
pub fn assert_pages_self_contained(doc: &LopdfDocument) {
    for (number, page_id) in doc.get_pages() {
        let page = doc
            .get_dictionary(page_id)
            .unwrap_or_else(|_| panic!("page {} is not a dictionary", number));
        assert!(page.has(b"MediaBox"), "page {} lost its MediaBox", number);
        assert!(page.has(b"Resources"), "page {} lost its Resources", number);
    }
}

/// Check that the bytes look like a JPEG image
pub fn assert_jpeg(bytes: &[u8]) {
    assert!(bytes.len() > 4, "image is empty");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8], "missing JPEG start-of-image marker");
    assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9], "missing JPEG end-of-image marker");
}
