use lopdf::{Document, IncrementalDocument, Object};

/// An edit staged through `IncrementalDocument` must leave the previously
/// loaded structure untouched while exposing the edit only through the new
/// document's view, and must not copy pages the edit never touched.
#[test]
fn incremental_update_preserves_old_view_and_exposes_new() -> lopdf::Result<()> {
    let mut prev = Document::with_version("1.5");
    let pages_id = prev.new_object_id();
    let page1_id = prev.new_object_id();
    let page2_id = prev.new_object_id();

    let catalog_id = prev.add_object(lopdf::dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    prev.trailer.set("Root", Object::Reference(catalog_id));
    prev.objects.insert(
        pages_id,
        Object::Dictionary(lopdf::dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page1_id), Object::Reference(page2_id)],
            "Count" => 2,
        }),
    );
    let media_box = vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)];
    prev.objects.insert(
        page1_id,
        Object::Dictionary(lopdf::dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => media_box.clone(),
        }),
    );
    prev.objects.insert(
        page2_id,
        Object::Dictionary(lopdf::dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => media_box,
        }),
    );

    let mut prev_bytes = Vec::new();
    prev.save_to(&mut prev_bytes)?;

    let mut incremental = IncrementalDocument::create_from(prev_bytes, prev);
    assert_eq!(incremental.get_prev_documents().version, "1.5");

    incremental.opt_clone_object_to_new_document(page1_id)?;
    let edited_box = vec![Object::Integer(0), Object::Integer(0), Object::Integer(300), Object::Integer(400)];
    incremental
        .new_document
        .get_object_mut(page1_id)?
        .as_dict_mut()?
        .set("MediaBox", edited_box);

    let old_box = incremental.get_prev_documents().get_dictionary(page1_id)?.get(b"MediaBox")?.as_array()?;
    assert_eq!(old_box[2].as_i64()?, 612, "the previously loaded document must keep the original MediaBox");

    let new_box = incremental.new_document.get_dictionary(page1_id)?.get(b"MediaBox")?.as_array()?;
    assert_eq!(new_box[2].as_i64()?, 300, "the delta document must carry the edit");

    assert!(
        !incremental.new_document.has_object(page2_id),
        "a page the edit never touched must not be copied into the delta"
    );

    Ok(())
}
