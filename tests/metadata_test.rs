use lopdf::{dictionary, Document, Object, Stream};

/// A minimal one-page document, built in memory so these tests carry no
/// fixture dependency.
fn sample_document(version: &str) -> Document {
    let mut doc = Document::with_version(version);
    let pages_id = doc.new_object_id();
    let content = lopdf::content::Content {
        operations: vec![lopdf::content::Operation::new("BT", vec![]), lopdf::content::Operation::new("ET", vec![])],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn sample_pdf_bytes(version: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    sample_document(version).save_to(&mut bytes).unwrap();
    bytes
}

#[test]
fn test_metadata_extraction_basic() {
    let buffer = sample_pdf_bytes("1.5");
    let doc = Document::load_mem(&buffer).unwrap();

    assert_eq!(doc.version, "1.5");
    assert!(!doc.get_pages().is_empty());
}

#[test]
fn test_metadata_extraction_page_count() {
    let buffer = sample_pdf_bytes("1.5");
    let doc = Document::load_mem(&buffer).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);
}

#[test]
fn test_metadata_extraction_unicode() {
    let mut doc = sample_document("1.5");
    doc.trailer.set("Info", dictionary! { "Title" => Object::string_literal("😀") });
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();

    let reloaded = Document::load_mem(&buffer).unwrap();
    assert!(!reloaded.get_pages().is_empty());
}

#[test]
fn test_metadata_extraction_from_memory() {
    let buffer = sample_pdf_bytes("1.7");
    let doc = Document::load_mem(&buffer).unwrap();

    assert_eq!(doc.version, "1.7");
    assert!(!doc.get_pages().is_empty());
}

#[test]
fn test_metadata_extraction_incremental() {
    let mut prev = sample_document("1.5");
    let mut prev_bytes = Vec::new();
    prev.save_to(&mut prev_bytes).unwrap();

    let mut incremental = lopdf::IncrementalDocument::create_from(prev_bytes, prev);
    let new_page_dict = dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    incremental.new_document.add_object(Object::Dictionary(new_page_dict));

    let mut merged = Vec::new();
    incremental.get_prev_documents().clone().save_to(&mut merged).unwrap();
    let doc = Document::load_mem(&merged).unwrap();
    assert!(!doc.get_pages().is_empty());
}
