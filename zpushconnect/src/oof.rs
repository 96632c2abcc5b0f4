//! Out-of-office settings through the `Settings` command.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{trace, warn};
use zpushwbxml::Element;

use crate::activesync::{ActiveSyncRequest, ActiveSyncResponse, check_status, required_text};
use crate::capabilities::{CAPABILITY_OOF, CAPABILITY_OOF_TIMES};
use crate::error::{ConnectError, Result};

const COMMAND: &str = "Settings";

/// Compact UTC timestamp used on the wire and in iCalendar output.
pub const DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Accepts RFC 3339 (`2016-10-10T08:00:00.000Z`) and the compact form.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| ConnectError::response(format!("invalid date {value:?}")))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OofState {
    #[default]
    Disabled,
    Enabled,
    TimeBased {
        from: DateTime<Utc>,
        till: DateTime<Utc>,
    },
}

impl OofState {
    /// Value of the `OofState` element.
    pub fn code(&self) -> u8 {
        match self {
            OofState::Disabled => 0,
            OofState::Enabled => 1,
            OofState::TimeBased { .. } => 2,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, OofState::Disabled)
    }
}

/// Audience of an out-of-office reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OofTarget {
    Internal = 0,
    ExternalKnown = 1,
    ExternalUnknown = 2,
}

impl OofTarget {
    pub const ALL: [OofTarget; 3] = [
        OofTarget::Internal,
        OofTarget::ExternalKnown,
        OofTarget::ExternalUnknown,
    ];

    /// Marker element naming the target inside `OofMessage`.
    pub fn element_name(self) -> &'static str {
        match self {
            OofTarget::Internal => "AppliesToInternal",
            OofTarget::ExternalKnown => "AppliesToExternalKnown",
            OofTarget::ExternalUnknown => "AppliesToExternalUnknown",
        }
    }

    fn of_message(message: &Element) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|target| message.get_child(target.element_name()).is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OofSettings {
    pub state: OofState,
    messages: [Option<String>; 3],
    /// Whether the server honours start and end times; `None` when it does
    /// not say.
    pub supports_times: Option<bool>,
}

impl OofSettings {
    pub fn new(state: OofState) -> Self {
        OofSettings {
            state,
            ..Default::default()
        }
    }

    pub fn message(&self, target: OofTarget) -> Option<&str> {
        self.messages[target as usize].as_deref()
    }

    pub fn set_message(&mut self, target: OofTarget, message: Option<String>) {
        self.messages[target as usize] = message;
    }

    pub fn with_message(mut self, target: OofTarget, message: impl Into<String>) -> Self {
        self.set_message(target, Some(message.into()));
        self
    }

    /// Compares what the server acts on: the state (times included) and,
    /// unless disabled, the internal reply.
    pub fn is_equivalent(&self, other: &OofSettings) -> bool {
        self.state == other.state
            && (!self.state.is_enabled()
                || self.message(OofTarget::Internal) == other.message(OofTarget::Internal))
    }
}

/// Reads the out-of-office settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOofRequest;

impl ActiveSyncRequest for GetOofRequest {
    type Response = OofSettings;

    fn command(&self) -> &'static str {
        COMMAND
    }

    fn body(&self) -> Element {
        Element::new("Settings").child(
            Element::new("Oof")
                .child(Element::new("Get").child(Element::with_text("BodyType", "TEXT"))),
        )
    }

    fn parse_response(&self, response: &ActiveSyncResponse) -> Result<OofSettings> {
        let supports_times = response.headers.capabilities.as_ref().and_then(|caps| {
            if caps.has(CAPABILITY_OOF_TIMES) {
                Some(true)
            } else if caps.has(CAPABILITY_OOF) {
                Some(false)
            } else {
                None
            }
        });

        let root = response.body(COMMAND)?;
        check_status(root)?;
        let oof = root
            .find("Settings/Oof")
            .ok_or_else(|| ConnectError::response("Settings response has no Oof"))?;
        check_status(oof)?;
        let get = oof
            .get_child("Get")
            .ok_or_else(|| ConnectError::response("Oof response has no Get"))?;

        let time = |name: &str| get.get_child(name).and_then(Element::text).map(parse_date);
        let state = match required_text(get, "OofState")?.trim() {
            "0" => OofState::Disabled,
            "1" => OofState::Enabled,
            "2" => match (time("StartTime").transpose()?, time("EndTime").transpose()?) {
                (Some(from), Some(till)) => OofState::TimeBased { from, till },
                _ => return Err(ConnectError::response("time based Oof without times")),
            },
            other => return Err(ConnectError::response(format!("unknown OofState {other}"))),
        };

        let mut settings = OofSettings {
            state,
            supports_times,
            ..Default::default()
        };
        for message in get.children_named("OofMessage") {
            let Some(target) = OofTarget::of_message(message) else {
                warn!(element = %message.to_xml_string(), "Unknown OOF message");
                continue;
            };
            let reply = message
                .get_child("ReplyMessage")
                .and_then(Element::text)
                .unwrap_or_default();
            settings.set_message(target, Some(reply.to_string()));
        }
        trace!(settings = ?settings, "OOF settings");
        Ok(settings)
    }
}

/// Replaces the out-of-office settings.
#[derive(Debug, Clone)]
pub struct SetOofRequest {
    settings: OofSettings,
}

impl SetOofRequest {
    pub fn new(settings: OofSettings) -> Self {
        SetOofRequest { settings }
    }
}

impl ActiveSyncRequest for SetOofRequest {
    type Response = ();

    fn command(&self) -> &'static str {
        COMMAND
    }

    fn body(&self) -> Element {
        let state = &self.settings.state;
        let mut set = Element::new("Set").child(Element::with_text("OofState", state.code().to_string()));
        if let OofState::TimeBased { from, till } = state {
            set.push(Element::with_text("StartTime", format_date(from)));
            set.push(Element::with_text("EndTime", format_date(till)));
        }

        let mut message = Element::new("OofMessage");
        for target in OofTarget::ALL {
            if let Some(reply) = self.settings.message(target) {
                message.push(Element::new(target.element_name()));
                message.push(Element::with_text("Enabled", "1"));
                message.push(Element::with_text("BodyType", "Text"));
                message.push(Element::with_text("ReplyMessage", reply));
            }
        }
        if !message.children.is_empty() {
            set.push(message);
        }

        Element::new("Settings").child(Element::new("Oof").child(set))
    }

    fn parse_response(&self, response: &ActiveSyncResponse) -> Result<()> {
        if let Some(root) = &response.body {
            check_status(root)?;
            if let Some(oof) = root.get_child("Oof") {
                check_status(oof)?;
            }
        }
        Ok(())
    }
}
