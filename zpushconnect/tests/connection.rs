use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{TimeZone, Utc};
use crossbeam_channel::bounded;
use zpushconnect::{
    Account, ActiveSyncRequest, ActiveSyncResponse, CancellationToken, Capabilities,
    CertificateTrust, ClientInfo, ConnectError, Connection, Element, FreeBusyType, HttpRequest,
    HttpResponse, HttpTransport, OofState, OofTarget, SyncType, TransportError, WebService,
};
use zpushwbxml::{WbxmlDocument, activesync};

type Responder = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// Records every request and answers with `respond`.
struct MockServer {
    requests: Mutex<Vec<HttpRequest>>,
    respond: Responder,
}

impl MockServer {
    fn new(respond: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(MockServer {
            requests: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for MockServer {
    fn post(&self, request: &HttpRequest, _verify: bool) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok((self.respond)(request))
    }
}

fn connect(server: &Arc<MockServer>) -> Connection {
    Connection::new(
        Account::new("https://mail.example.com/", "john@example.com", "secret", "ABC123"),
        ClientInfo::new("zpushctl/0.1.0", Capabilities::parse("oof,ooftime")),
        server.clone() as Arc<dyn HttpTransport>,
        Arc::new(CertificateTrust::reject_all()),
    )
}

fn wbxml(xml: &str) -> Vec<u8> {
    let root = Element::from_xml(xml).unwrap();
    WbxmlDocument::new(activesync(), root)
        .to_bytes(activesync())
        .unwrap()
}

fn ok(headers: &[(&str, &str)], body: Vec<u8>) -> HttpResponse {
    HttpResponse {
        status: 200,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body,
    }
}

const OOF_REPLY: &str = "<Settings><Status>1</Status><Oof><Status>1</Status><Get>\
<OofState>2</OofState>\
<StartTime>2026-10-19T08:00:00.000Z</StartTime>\
<EndTime>2026-10-23T17:00:00.000Z</EndTime>\
<OofMessage><AppliesToInternal/><Enabled>1</Enabled><ReplyMessage>Back on Friday</ReplyMessage><BodyType>TEXT</BodyType></OofMessage>\
</Get></Oof></Settings>";

#[test]
fn oof_get_round_trip() {
    let server = MockServer::new(|_| {
        ok(
            &[
                ("X-Push-Capabilities", "oof,ooftime,signatures"),
                ("X-Z-Push-Version", "2.6.4+0"),
            ],
            wbxml(OOF_REPLY),
        )
    });
    let settings = connect(&server).get_oof().unwrap();

    assert_eq!(
        settings.state,
        OofState::TimeBased {
            from: Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap(),
            till: Utc.with_ymd_and_hms(2026, 10, 23, 17, 0, 0).unwrap(),
        }
    );
    assert_eq!(settings.message(OofTarget::Internal), Some("Back on Friday"));
    assert_eq!(settings.message(OofTarget::ExternalKnown), None);
    assert_eq!(settings.supports_times, Some(true));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.url,
        "https://mail.example.com/Microsoft-Server-ActiveSync?DeviceId=ABC123&Cmd=Settings&User=john%40example.com&DeviceType=WindowsOutlook"
    );
    assert_eq!(request.host, "mail.example.com");
    assert_eq!(
        request.header("authorization"),
        Some("Basic am9obkBleGFtcGxlLmNvbTpzZWNyZXQ=")
    );
    assert_eq!(request.header("X-Push-Plugin"), Some("zpushctl/0.1.0"));
    assert_eq!(request.header("X-Push-Plugin-Capabilities"), Some("oof,ooftime"));
    assert_eq!(request.header("MS-ASProtocolVersion"), Some("14.0"));
    assert_eq!(
        request.header("Content-Type"),
        Some("application/vnd.ms-sync.wbxml")
    );

    let sent = WbxmlDocument::from_bytes(activesync(), &request.body).unwrap();
    let body_type = sent.root.find("Settings/Oof/Get/BodyType").unwrap();
    assert_eq!(body_type.text(), Some("TEXT"));
}

#[test]
fn oof_set_sends_messages() {
    let server = MockServer::new(|_| {
        ok(
            &[],
            wbxml("<Settings><Status>1</Status><Oof><Status>1</Status></Oof></Settings>"),
        )
    });
    let settings = zpushconnect::OofSettings::new(OofState::Enabled)
        .with_message(OofTarget::ExternalUnknown, "Away");
    connect(&server).set_oof(settings).unwrap();

    let requests = server.requests();
    let sent = WbxmlDocument::from_bytes(activesync(), &requests[0].body).unwrap();
    let set = sent.root.find("Settings/Oof/Set").unwrap();
    assert_eq!(set.get_child("OofState").and_then(Element::text), Some("1"));
    let message = set.get_child("OofMessage").unwrap();
    assert!(message.get_child("AppliesToExternalUnknown").is_some());
    assert_eq!(message.get_child("ReplyMessage").and_then(Element::text), Some("Away"));
}

#[test]
fn failed_settings_status_is_a_response_error() {
    let server = MockServer::new(|_| ok(&[], wbxml("<Settings><Status>2</Status></Settings>")));
    let err = connect(&server).get_oof().unwrap_err();
    assert!(matches!(err, ConnectError::Response(_)), "{err:?}");
}

#[test]
fn http_error_status_is_a_fault() {
    let server = MockServer::new(|_| HttpResponse {
        status: 500,
        ..Default::default()
    });
    match connect(&server).get_oof() {
        Err(ConnectError::Fault { status, message }) => {
            assert_eq!(status, Some(500));
            assert_eq!(message, None);
        }
        other => panic!("expected a fault, got {other:?}"),
    }
}

#[test]
fn corrupt_wbxml_is_a_wire_error() {
    let server = MockServer::new(|_| ok(&[], vec![0x03, 0x01, 0x6A, 0x00, 0x45, 0x7F]));
    let err = connect(&server).get_oof().unwrap_err();
    assert!(matches!(err, ConnectError::Wire(_)), "{err:?}");
}

#[test]
fn free_busy_from_resolve_recipients() {
    let reply = "<ResolveRecipients><Status>1</Status><Response><To>jane@example.com</To>\
<Status>1</Status><RecipientCount>1</RecipientCount><Recipient><Type>1</Type>\
<DisplayName>Jane</DisplayName><EmailAddress>jane@example.com</EmailAddress>\
<Availability><Status>1</Status><MergedFreeBusy>0022</MergedFreeBusy></Availability>\
</Recipient></Response></ResolveRecipients>";
    let server = MockServer::new(move |_| ok(&[], wbxml(reply)));
    let start = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
    let free_busy = connect(&server)
        .free_busy("jane@example.com", start, None)
        .unwrap()
        .unwrap();

    assert_eq!(free_busy.as_str(), "0022");
    assert_eq!(
        free_busy.at(Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap()),
        Some(FreeBusyType::Busy)
    );
    let sent = WbxmlDocument::from_bytes(activesync(), &server.requests()[0].body).unwrap();
    assert_eq!(
        sent.root.get_child("To").and_then(Element::text),
        Some("jane@example.com")
    );
}

const FAULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"><SOAP-ENV:Body><SOAP-ENV:Fault><faultcode>ERROR</faultcode><faultstring>Invalid session</faultstring></SOAP-ENV:Fault></SOAP-ENV:Body></SOAP-ENV:Envelope>"#;

#[test]
fn soap_fault_keeps_fault_string() {
    let server = MockServer::new(|_| ok(&[], FAULT.as_bytes().to_vec()));
    let err = connect(&server).signatures().unwrap_err();
    assert!(err.is_fault());
    match err {
        ConnectError::Fault { status, message } => {
            assert_eq!(status, None);
            assert_eq!(message.as_deref(), Some("Invalid session"));
        }
        other => panic!("expected a fault, got {other:?}"),
    }
}

#[test]
fn soap_fault_with_error_status() {
    let server = MockServer::new(|_| HttpResponse {
        status: 500,
        headers: Vec::new(),
        body: FAULT.as_bytes().to_vec(),
    });
    match connect(&server).signatures() {
        Err(ConnectError::Fault { status, message }) => {
            assert_eq!(status, Some(500));
            assert_eq!(message.as_deref(), Some("Invalid session"));
        }
        other => panic!("expected a fault, got {other:?}"),
    }
}

const FOLDERS: &str = r#"<Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"><Body><ListUserFoldersResponse><return xsi:type="SOAP-ENC:Array">
<item xsi:type="SOAP-ENC:Struct"><ServerId xsi:type="xsd:string">1</ServerId><ParentId xsi:type="xsd:string">0</ParentId><DisplayName xsi:type="xsd:string">Top</DisplayName><Type xsi:type="xsd:int">1</Type><BackendId xsi:type="xsd:string">{top}</BackendId><Flags xsi:type="xsd:int">0</Flags></item>
<item xsi:type="SOAP-ENC:Struct"><ServerId xsi:type="xsd:string">2</ServerId><ParentId xsi:type="xsd:string">1</ParentId><DisplayName xsi:type="xsd:string">Inbox</DisplayName><Type xsi:type="xsd:int">2</Type><BackendId xsi:type="xsd:string">{inbox}1</BackendId><Flags xsi:type="xsd:int">0</Flags></item>
</return></ListUserFoldersResponse></Body></Envelope>"#;

#[test]
fn user_folders_use_the_info_service_for_that_user() {
    let server = MockServer::new(|_| ok(&[], FOLDERS.as_bytes().to_vec()));
    let tree = connect(&server).user_folders("jane").unwrap();

    assert_eq!(tree.len(), 2);
    let top = tree.roots().next().unwrap();
    let inbox = top.children().next().unwrap();
    assert_eq!(inbox.folder().display_name, "Inbox");
    let share = inbox.share("Jane - Inbox");
    assert_eq!(share.store, "jane");
    assert_eq!(share.folder_id.as_str(), "{inbox}");
    assert_eq!(share.sync_type, SyncType::UserMail);

    let request = &server.requests()[0];
    assert_eq!(
        request.url,
        "https://mail.example.com/Microsoft-Server-ActiveSync?DeviceId=webservice&Cmd=WebserviceInfo&User=jane&DeviceType=webservice"
    );
    assert_eq!(request.header("Content-Type"), Some("text/xml; charset=utf-8"));
    let body = String::from_utf8(request.body.clone()).unwrap();
    assert!(body.contains("<ListUserFolders"));
    assert!(body.contains(r#"xmlns="mail.example.com""#));
    assert!(!body.contains("devid"));
}

#[test]
fn device_service_sends_device_id() {
    let reply = r#"<Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema"><Body><AdditionalFolderSetListResponse><return xsi:type="xsd:boolean">true</return></AdditionalFolderSetListResponse></Body></Envelope>"#;
    let server = MockServer::new(move |_| ok(&[], reply.as_bytes().to_vec()));
    assert!(connect(&server).set_current_shares("jane", Vec::new()).unwrap());

    let request = &server.requests()[0];
    assert!(request.url.contains("Cmd=WebserviceDevice&User=john%40example.com"));
    let body = String::from_utf8(request.body.clone()).unwrap();
    assert!(body.contains(r#"<devid xsi:type="xsd:string">abc123</devid>"#));
    assert!(body.find("<devid").unwrap() < body.find("<store").unwrap());
    assert_eq!(
        connect(&server).webservice_url(WebService::Device, Some("a b")),
        "https://mail.example.com/Microsoft-Server-ActiveSync?DeviceId=webservice&Cmd=WebserviceDevice&User=a%20b&DeviceType=webservice"
    );
}

/// Settings request that counts how often its parser runs.
struct CountingRequest {
    parsed: Arc<AtomicUsize>,
}

impl ActiveSyncRequest for CountingRequest {
    type Response = ();

    fn command(&self) -> &'static str {
        "Settings"
    }

    fn body(&self) -> Element {
        Element::new("Settings")
    }

    fn parse_response(&self, _response: &ActiveSyncResponse) -> zpushconnect::Result<()> {
        self.parsed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn cancellation_while_in_flight_skips_the_parser() {
    let (entered_tx, entered_rx) = bounded::<()>(1);
    let (release_tx, release_rx) = bounded::<()>(1);
    let server = MockServer::new(move |_| {
        entered_tx.send(()).unwrap();
        release_rx.recv().unwrap();
        ok(&[], wbxml("<Settings><Status>1</Status></Settings>"))
    });

    let token = CancellationToken::new();
    let connection = connect(&server).with_cancellation(token.clone());
    let canceller = thread::spawn(move || {
        entered_rx.recv().unwrap();
        token.cancel();
    });

    let parsed = Arc::new(AtomicUsize::new(0));
    let result = connection.execute(&CountingRequest {
        parsed: parsed.clone(),
    });
    canceller.join().unwrap();
    release_tx.send(()).unwrap();

    assert!(matches!(result, Err(ref e) if e.is_cancelled()), "{result:?}");
    assert_eq!(parsed.load(Ordering::SeqCst), 0);
}

#[test]
fn cancelled_token_sends_nothing() {
    let server = MockServer::new(|_| ok(&[], Vec::new()));
    let token = CancellationToken::new();
    token.cancel();
    let parsed = Arc::new(AtomicUsize::new(0));
    let result = connect(&server).with_cancellation(token).execute(&CountingRequest {
        parsed: parsed.clone(),
    });

    assert!(matches!(result, Err(ConnectError::Cancelled)));
    assert!(server.requests().is_empty());
    assert_eq!(parsed.load(Ordering::SeqCst), 0);
}

#[test]
fn uncancelled_call_runs_the_parser_once() {
    let server = MockServer::new(|_| ok(&[], wbxml("<Settings><Status>1</Status></Settings>")));
    let parsed = Arc::new(AtomicUsize::new(0));
    connect(&server)
        .with_cancellation(CancellationToken::new())
        .execute(&CountingRequest {
            parsed: parsed.clone(),
        })
        .unwrap();
    assert_eq!(parsed.load(Ordering::SeqCst), 1);
}

#[test]
fn cancelled_before_decoding_wins_over_a_corrupt_body() {
    let token = CancellationToken::new();
    let cancel = token.clone();
    let server = MockServer::new(move |_| {
        cancel.cancel();
        ok(&[], vec![0x03, 0x01, 0x6A, 0x00, 0x3F])
    });
    let parsed = Arc::new(AtomicUsize::new(0));
    let result = connect(&server).with_cancellation(token).execute(&CountingRequest {
        parsed: parsed.clone(),
    });

    assert!(matches!(result, Err(ConnectError::Cancelled)), "{result:?}");
    assert_eq!(parsed.load(Ordering::SeqCst), 0);
}
