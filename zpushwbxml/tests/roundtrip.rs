use zpushwbxml::activesync::{PAGE_AIRSYNC_BASE, PAGE_RESOLVE_RECIPIENTS, PAGE_SETTINGS};
use zpushwbxml::tokens::{END, STR_I, SWITCH_PAGE};
use zpushwbxml::{activesync, CodePage, CodeSpace, Element, WbxmlDocument, WbxmlError};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn roundtrip(space: &CodeSpace, root: Element) -> Result<(Vec<u8>, Element), WbxmlError> {
    let bytes = WbxmlDocument::new(space, root).to_bytes(space)?;
    let decoded = WbxmlDocument::from_bytes(space, &bytes)?;
    Ok((bytes, decoded.root))
}

fn sync_request() -> Element {
    Element::new("Sync").child(
        Element::new("Collections").child(
            Element::new("Collection")
                .child(Element::with_text("SyncKey", "0"))
                .child(Element::with_text("CollectionId", "1"))
                .child(
                    Element::new("Options")
                        .child(Element::with_text("FilterType", "3"))
                        .child(
                            Element::new("BodyPreference")
                                .child(Element::with_text("Type", "1"))
                                .child(Element::with_text("TruncationSize", "200")),
                        ),
                ),
        ),
    )
}

#[test]
fn two_pages_need_exactly_one_switch() -> TestResult {
    let (bytes, decoded) = roundtrip(activesync(), sync_request())?;
    assert_eq!(decoded, sync_request());

    let expected: Vec<u8> = [
        &[0x03, 0x01, 0x6A, 0x00][..],
        &[0x45, 0x5C, 0x4F],
        &[0x4B, STR_I, b'0', 0, END],
        &[0x52, STR_I, b'1', 0, END],
        &[0x57, 0x58, STR_I, b'3', 0, END],
        &[SWITCH_PAGE, PAGE_AIRSYNC_BASE],
        &[0x45, 0x46, STR_I, b'1', 0, END],
        &[0x47, STR_I, b'2', b'0', b'0', 0, END],
        &[END, END, END, END, END],
    ]
    .concat();
    assert_eq!(bytes, expected);
    assert_eq!(
        bytes.windows(2).filter(|w| w == &[SWITCH_PAGE, PAGE_AIRSYNC_BASE]).count(),
        1
    );
    Ok(())
}

#[test]
fn request_vocabulary_roundtrips() -> TestResult {
    let trees = vec![
        Element::new("ResolveRecipients")
            .child(Element::with_text("To", "john@example.com"))
            .child(
                Element::new("Options")
                    .child(Element::with_text("MaxAmbiguousRecipients", "1"))
                    .child(
                        Element::new("Availability")
                            .child(Element::with_text("StartTime", "2024-01-01T00:00:00.000Z"))
                            .child(Element::with_text("EndTime", "2024-01-02T00:00:00.000Z")),
                    ),
            ),
        Element::new("Settings").child(
            Element::new("Oof").child(
                Element::new("Set")
                    .child(Element::with_text("OofState", "2"))
                    .child(Element::with_text("StartTime", "20240101T080000Z"))
                    .child(Element::with_text("EndTime", "20240108T080000Z"))
                    .child(
                        Element::new("OofMessage")
                            .child(Element::new("AppliesToInternal"))
                            .child(Element::with_text("Enabled", "1"))
                            .child(Element::with_text("BodyType", "Text"))
                            .child(Element::with_text("ReplyMessage", "Away until Monday – ünïcødé")),
                    ),
            ),
        ),
        Element::new("Ping")
            .child(Element::with_text("HeartbeatInterval", "480"))
            .child(Element::new("Folders").child(
                Element::new("Folder")
                    .child(Element::with_text("Id", "5"))
                    .child(Element::with_text("Class", "Email")),
            )),
        Element::with_text("Status", ""),
    ];
    for tree in trees {
        let (_, decoded) = roundtrip(activesync(), tree.clone())?;
        assert_eq!(decoded, tree);
    }
    Ok(())
}

#[test]
fn shared_names_decode_on_their_own_page() -> TestResult {
    let tree = Element::new("ResolveRecipients").child(
        Element::new("Options").child(
            Element::new("Availability").child(Element::with_text("StartTime", "x")),
        ),
    );
    let (bytes, decoded) = roundtrip(activesync(), tree.clone())?;
    assert_eq!(decoded, tree);
    // ResolveRecipients/StartTime is 0x17, not Calendar's 0x27.
    assert!(bytes.starts_with(&[0x03, 0x01, 0x6A, 0x00, SWITCH_PAGE, PAGE_RESOLVE_RECIPIENTS]));
    assert!(bytes.contains(&(0x17 | 0x40)));
    assert!(!bytes.contains(&(0x27 | 0x40)));
    Ok(())
}

#[test]
fn decodes_oof_response_from_server() -> TestResult {
    let mut data = vec![0x03, 0x01, 0x6A, 0x00, SWITCH_PAGE, PAGE_SETTINGS];
    data.extend([0x45, 0x46, STR_I, b'1', 0, END]); // Settings, Status
    data.extend([0x49, 0x46, STR_I, b'1', 0, END]); // Oof, Status
    data.extend([0x47, 0x4A, STR_I, b'1', 0, END]); // Get, OofState
    data.extend([0x4D, 0x0E, 0x51, STR_I, b'1', 0, END]); // OofMessage, AppliesToInternal, Enabled
    data.extend([0x52, STR_I]);
    data.extend(b"Gone fishing");
    data.extend([0, END, END, END, END, END]);

    let doc = WbxmlDocument::from_bytes(activesync(), &data)?;
    let get = doc.root.find("Settings/Oof/Get").ok_or("no Get")?;
    assert_eq!(get.get_child("OofState").and_then(Element::text), Some("1"));
    let message = get.get_child("OofMessage").ok_or("no message")?;
    assert!(message.get_child("AppliesToInternal").is_some());
    assert_eq!(
        message.get_child("ReplyMessage").and_then(Element::text),
        Some("Gone fishing")
    );
    Ok(())
}

#[test]
fn attributes_use_their_own_page_state() -> TestResult {
    let space = CodeSpace::new(
        "sample",
        0x0B,
        vec![
            CodePage::new(0, "Base", &[(0x05, "doc"), (0x06, "item")], &[(0x05, "id")])?,
            CodePage::new(1, "Extra", &[(0x05, "note")], &[(0x05, "lang"), (0x06, "ref")])?,
        ],
    )?;
    let tree = Element::new("doc")
        .attr("lang", "fr")
        .attr("id", "d1")
        .child(Element::new("item").attr("id", "i1").attr("ref", "r"))
        .child(Element::with_text("note", "n").attr("id", "n1"));

    let (bytes, decoded) = roundtrip(&space, tree.clone())?;
    assert_eq!(decoded, tree);
    assert_eq!(
        &bytes[..14],
        &[
            0x03, 0x0B, 0x6A, 0x00, // header
            0xC5, // doc, attributes + content
            0x05, STR_I, b'd', b'1', 0, // id
            SWITCH_PAGE, 1, 0x05, STR_I, // lang on page 1
        ]
    );
    Ok(())
}

#[test]
fn attribute_order_does_not_change_the_bytes() -> TestResult {
    let space = CodeSpace::new(
        "sample",
        0x0B,
        vec![CodePage::new(0, "Base", &[(0x05, "doc")], &[(0x05, "a"), (0x06, "b")])?],
    )?;
    let one = Element::new("doc").attr("a", "1").attr("b", "2");
    let two = Element::new("doc").attr("b", "2").attr("a", "1");
    assert_eq!(
        WbxmlDocument::new(&space, one).to_bytes(&space)?,
        WbxmlDocument::new(&space, two).to_bytes(&space)?
    );
    Ok(())
}

#[test]
fn unknown_tokens_fail_the_whole_document() {
    // Settings page, Settings, then a token the Settings page leaves unassigned.
    let data = [0x03, 0x01, 0x6A, 0x00, SWITCH_PAGE, PAGE_SETTINGS, 0x45, 0x6A, END, END];
    assert_eq!(
        WbxmlDocument::from_bytes(activesync(), &data),
        Err(WbxmlError::UnknownToken {
            page: PAGE_SETTINGS,
            token: 0x2A,
            offset: 7
        })
    );
}
