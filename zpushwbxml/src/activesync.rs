//! ActiveSync code space (MS-ASWBXML), restricted to the pages this client
//! sends or receives.

use once_cell::sync::Lazy;

use crate::codepage::{CodePage, CodeSpace};
use crate::error::Result;

/// Public identifier used by ActiveSync documents ("unknown or missing").
pub const ACTIVESYNC_PUBLIC_ID: u32 = 0x01;

pub const PAGE_AIRSYNC: u8 = 0;
pub const PAGE_CALENDAR: u8 = 4;
pub const PAGE_FOLDER_HIERARCHY: u8 = 7;
pub const PAGE_RESOLVE_RECIPIENTS: u8 = 10;
pub const PAGE_PING: u8 = 13;
pub const PAGE_AIRSYNC_BASE: u8 = 17;
pub const PAGE_SETTINGS: u8 = 18;

static ACTIVESYNC: Lazy<CodeSpace> =
    Lazy::new(|| build().expect("ActiveSync code page tables are consistent"));

/// Shared ActiveSync code space, built on first use.
pub fn activesync() -> &'static CodeSpace {
    &ACTIVESYNC
}

const AIRSYNC: &[(u8, &str)] = &[
    (0x05, "Sync"),
    (0x06, "Responses"),
    (0x07, "Add"),
    (0x08, "Change"),
    (0x09, "Delete"),
    (0x0A, "Fetch"),
    (0x0B, "SyncKey"),
    (0x0C, "ClientId"),
    (0x0D, "ServerId"),
    (0x0E, "Status"),
    (0x0F, "Collection"),
    (0x10, "Class"),
    (0x12, "CollectionId"),
    (0x13, "GetChanges"),
    (0x14, "MoreAvailable"),
    (0x15, "WindowSize"),
    (0x16, "Commands"),
    (0x17, "Options"),
    (0x18, "FilterType"),
    (0x1B, "Conflict"),
    (0x1C, "Collections"),
    (0x1D, "ApplicationData"),
    (0x1E, "DeletesAsMoves"),
    (0x20, "Supported"),
    (0x21, "SoftDelete"),
    (0x22, "MIMESupport"),
    (0x23, "MIMETruncation"),
    (0x24, "Wait"),
    (0x25, "Limit"),
    (0x26, "Partial"),
    (0x27, "ConversationMode"),
    (0x28, "MaxItems"),
    (0x29, "HeartbeatInterval"),
];

const CALENDAR: &[(u8, &str)] = &[
    (0x05, "TimeZone"),
    (0x06, "AllDayEvent"),
    (0x07, "Attendees"),
    (0x08, "Attendee"),
    (0x09, "Attendee_Email"),
    (0x0A, "Attendee_Name"),
    (0x0B, "Body"),
    (0x0C, "BodyTruncated"),
    (0x0D, "BusyStatus"),
    (0x0E, "Categories"),
    (0x0F, "Category"),
    (0x10, "Compressed_RTF"),
    (0x11, "DTStamp"),
    (0x12, "EndTime"),
    (0x13, "Exception"),
    (0x14, "Exceptions"),
    (0x15, "Exception_IsDeleted"),
    (0x16, "Exception_StartTime"),
    (0x17, "Location"),
    (0x18, "MeetingStatus"),
    (0x19, "Organizer_Email"),
    (0x1A, "Organizer_Name"),
    (0x1B, "Recurrence"),
    (0x1C, "Recurrence_Type"),
    (0x1D, "Recurrence_Until"),
    (0x1E, "Recurrence_Occurrences"),
    (0x1F, "Recurrence_Interval"),
    (0x20, "Recurrence_DayOfWeek"),
    (0x21, "Recurrence_DayOfMonth"),
    (0x22, "Recurrence_WeekOfMonth"),
    (0x23, "Recurrence_MonthOfYear"),
    (0x24, "Reminder_MinsBefore"),
    (0x25, "Sensitivity"),
    (0x26, "Subject"),
    (0x27, "StartTime"),
    (0x28, "UID"),
    (0x29, "Attendee_Status"),
    (0x2A, "Attendee_Type"),
    (0x2B, "Attachment"),
    (0x2C, "Attachments"),
    (0x2D, "AttName"),
    (0x2E, "AttSize"),
    (0x2F, "AttOid"),
    (0x30, "AttMethod"),
    (0x31, "AttRemoved"),
    (0x32, "DisplayName"),
    (0x33, "DisallowNewTimeProposal"),
    (0x34, "ResponseRequested"),
    (0x35, "AppointmentReplyTime"),
    (0x36, "ResponseType"),
];

const FOLDER_HIERARCHY: &[(u8, &str)] = &[
    (0x05, "Folders"),
    (0x06, "Folder"),
    (0x07, "DisplayName"),
    (0x08, "ServerId"),
    (0x09, "ParentId"),
    (0x0A, "Type"),
    (0x0C, "Status"),
    (0x0E, "Changes"),
    (0x0F, "Add"),
    (0x10, "Delete"),
    (0x11, "Update"),
    (0x12, "SyncKey"),
    (0x13, "FolderCreate"),
    (0x14, "FolderDelete"),
    (0x15, "FolderUpdate"),
    (0x16, "FolderSync"),
    (0x17, "Count"),
];

const RESOLVE_RECIPIENTS: &[(u8, &str)] = &[
    (0x05, "ResolveRecipients"),
    (0x06, "Response"),
    (0x07, "Status"),
    (0x08, "Type"),
    (0x09, "Recipient"),
    (0x0A, "DisplayName"),
    (0x0B, "EmailAddress"),
    (0x0C, "Certificates"),
    (0x0D, "Certificate"),
    (0x0E, "MiniCertificate"),
    (0x0F, "Options"),
    (0x10, "To"),
    (0x11, "CertificateRetrieval"),
    (0x12, "RecipientCount"),
    (0x13, "MaxCertificates"),
    (0x14, "MaxAmbiguousRecipients"),
    (0x15, "CertificateCount"),
    (0x16, "Availability"),
    (0x17, "StartTime"),
    (0x18, "EndTime"),
    (0x19, "MergedFreeBusy"),
    (0x1A, "Picture"),
    (0x1B, "MaxSize"),
    (0x1C, "Data"),
    (0x1D, "MaxPictures"),
];

const PING: &[(u8, &str)] = &[
    (0x05, "Ping"),
    (0x06, "AutdState"),
    (0x07, "Status"),
    (0x08, "HeartbeatInterval"),
    (0x09, "Folders"),
    (0x0A, "Folder"),
    (0x0B, "Id"),
    (0x0C, "Class"),
    (0x0D, "MaxFolders"),
];

const AIRSYNC_BASE: &[(u8, &str)] = &[
    (0x05, "BodyPreference"),
    (0x06, "Type"),
    (0x07, "TruncationSize"),
    (0x08, "AllOrNone"),
    (0x0A, "Body"),
    (0x0B, "Data"),
    (0x0C, "EstimatedDataSize"),
    (0x0D, "Truncated"),
    (0x0E, "Attachments"),
    (0x0F, "Attachment"),
    (0x10, "DisplayName"),
    (0x11, "FileReference"),
    (0x12, "Method"),
    (0x13, "ContentId"),
    (0x14, "ContentLocation"),
    (0x15, "IsInline"),
    (0x16, "NativeBodyType"),
    (0x17, "ContentType"),
    (0x18, "Preview"),
    (0x19, "BodyPartPreference"),
    (0x1A, "BodyPart"),
    (0x1B, "Status"),
];

const SETTINGS: &[(u8, &str)] = &[
    (0x05, "Settings"),
    (0x06, "Status"),
    (0x07, "Get"),
    (0x08, "Set"),
    (0x09, "Oof"),
    (0x0A, "OofState"),
    (0x0B, "StartTime"),
    (0x0C, "EndTime"),
    (0x0D, "OofMessage"),
    (0x0E, "AppliesToInternal"),
    (0x0F, "AppliesToExternalKnown"),
    (0x10, "AppliesToExternalUnknown"),
    (0x11, "Enabled"),
    (0x12, "ReplyMessage"),
    (0x13, "BodyType"),
    (0x14, "DevicePassword"),
    (0x15, "Password"),
    (0x16, "DeviceInformation"),
    (0x17, "Model"),
    (0x18, "IMEI"),
    (0x19, "FriendlyName"),
    (0x1A, "OS"),
    (0x1B, "OSLanguage"),
    (0x1C, "PhoneNumber"),
    (0x1D, "UserInformation"),
    (0x1E, "EmailAddresses"),
    (0x1F, "SMTPAddress"),
    (0x20, "UserAgent"),
    (0x21, "EnableOutboundSMS"),
    (0x22, "MobileOperator"),
    (0x23, "PrimarySmtpAddress"),
    (0x24, "Accounts"),
    (0x25, "Account"),
    (0x26, "AccountId"),
    (0x27, "AccountName"),
    (0x28, "UserDisplayName"),
    (0x29, "SendDisabled"),
    (0x2B, "RightsManagementInformation"),
];

fn build() -> Result<CodeSpace> {
    CodeSpace::new(
        "ActiveSync",
        ACTIVESYNC_PUBLIC_ID,
        vec![
            CodePage::new(PAGE_AIRSYNC, "AirSync", AIRSYNC, &[])?,
            CodePage::new(PAGE_CALENDAR, "Calendar", CALENDAR, &[])?,
            CodePage::new(PAGE_FOLDER_HIERARCHY, "FolderHierarchy", FOLDER_HIERARCHY, &[])?,
            CodePage::new(
                PAGE_RESOLVE_RECIPIENTS,
                "ResolveRecipients",
                RESOLVE_RECIPIENTS,
                &[],
            )?,
            CodePage::new(PAGE_PING, "Ping", PING, &[])?,
            CodePage::new(PAGE_AIRSYNC_BASE, "AirSyncBase", AIRSYNC_BASE, &[])?,
            CodePage::new(PAGE_SETTINGS, "Settings", SETTINGS, &[])?,
        ],
    )
}
